//! Sequential walk over the catalog's pages.
//!
//! One page at a time: navigate (bounded timeout, optional retries), wait
//! for client-side rendering to settle, snapshot the DOM, extract. Pages are
//! paced with a fixed delay, never after the last one.

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use super::crawl_types::{CrawlAbort, CrawlOutcome, CrawlPhase, IngestError};
use super::page_timeout::{retry_with_backoff, with_page_timeout};
use super::pagination::{discover_max_page, page_url};
use super::progress::ProgressReporter;
use crate::config::IngestConfig;
use crate::listing_extractor::extract_listings;
use crate::session::CatalogPage;

pub struct PageCrawler<'a, P: ProgressReporter> {
    config: &'a IngestConfig,
    progress: &'a P,
    cancel: CancellationToken,
}

impl<'a, P: ProgressReporter> PageCrawler<'a, P> {
    #[must_use]
    pub fn new(config: &'a IngestConfig, progress: &'a P, cancel: CancellationToken) -> Self {
        Self {
            config,
            progress,
            cancel,
        }
    }

    /// Crawl every catalog page on `page`.
    ///
    /// # Errors
    ///
    /// Navigation and content failures abort the walk. The returned
    /// [`CrawlAbort`] carries whatever completed pages produced; the caller
    /// decides whether to keep it.
    pub async fn run<Pg: CatalogPage>(&self, page: &Pg) -> Result<CrawlOutcome, CrawlAbort> {
        let mut outcome = CrawlOutcome::default();
        let mut phase = CrawlPhase::DiscoveringPageCount;

        let max_page = match self.discover_page_count(page).await {
            Ok(max_page) => max_page,
            Err(error) => return Err(abort(error, phase, outcome)),
        };
        outcome.max_page = max_page;
        self.progress.report_page_count(max_page);
        info!(target: "realty_ingest::crawl", "Crawling {max_page} catalog pages");

        for number in 1..=max_page {
            if self.cancel.is_cancelled() {
                let error = IngestError::Cancelled {
                    pages_completed: outcome.pages_crawled,
                };
                return Err(abort(error, phase, outcome));
            }

            phase = CrawlPhase::FetchingPage(number);
            let url = page_url(self.config.base_url(), self.config.page_param(), number);
            self.progress.report_page_started(number, &url);

            if let Err(error) = self.navigate(page, &url, number).await {
                return Err(abort(error, phase, outcome));
            }

            tokio::time::sleep(self.config.settle_delay()).await;

            let html = match page.content().await {
                Ok(html) => html,
                Err(e) => {
                    let error = IngestError::PageContent {
                        page: number,
                        message: format!("{e:#}"),
                    };
                    return Err(abort(error, phase, outcome));
                }
            };

            phase = CrawlPhase::ExtractingPage(number);
            let extraction = extract_listings(&html, number);
            if extraction.is_empty() {
                warn!(target: "realty_ingest::crawl", "Page {number} has no listing cards");
            } else if extraction.all_failed() {
                warn!(
                    target: "realty_ingest::crawl",
                    "All {} cards on page {number} failed to parse",
                    extraction.card_count
                );
            }
            self.progress.report_page_extracted(
                number,
                extraction.records.len(),
                extraction.failures.len(),
            );

            outcome.records.extend(extraction.records);
            outcome.card_failures.extend(extraction.failures);
            outcome.pages_crawled = number;

            if number < max_page {
                debug!(
                    target: "realty_ingest::crawl",
                    "Pacing {:?} before page {}",
                    self.config.page_delay(),
                    number + 1
                );
                tokio::select! {
                    () = self.cancel.cancelled() => {
                        let error = IngestError::Cancelled { pages_completed: number };
                        return Err(abort(error, phase, outcome));
                    }
                    () = tokio::time::sleep(self.config.page_delay()) => {}
                }
            }
        }

        outcome.phase = CrawlPhase::Done;
        info!(
            target: "realty_ingest::crawl",
            "Crawl finished: {} pages, {} listings, {} cards skipped",
            outcome.pages_crawled,
            outcome.records.len(),
            outcome.card_failures.len()
        );
        Ok(outcome)
    }

    /// Load the base catalog URL and read the page count from its paginator.
    async fn discover_page_count<Pg: CatalogPage>(&self, page: &Pg) -> Result<u32, IngestError> {
        let base = self.config.base_url();
        let first = page_url(base, self.config.page_param(), 1);
        // A templated base has no page-less form
        let discovery_url = if base.contains(crate::utils::PAGE_PLACEHOLDER) {
            first.as_str()
        } else {
            base
        };

        self.navigate(page, discovery_url, 1).await?;

        let html = page
            .content()
            .await
            .map_err(|e| IngestError::PageContent {
                page: 1,
                message: format!("{e:#}"),
            })?;

        let discovered = discover_max_page(&html);
        Ok(match self.config.max_pages() {
            Some(cap) if cap < discovered => {
                info!(
                    target: "realty_ingest::crawl",
                    "Pagination reports {discovered} pages, capped at {cap}"
                );
                cap
            }
            _ => discovered,
        })
    }

    async fn navigate<Pg: CatalogPage>(
        &self,
        page: &Pg,
        url: &str,
        number: u32,
    ) -> Result<(), IngestError> {
        let timeout = self.config.navigation_timeout();
        debug!(target: "realty_ingest::crawl", "Navigating to page {number}: {url}");

        retry_with_backoff(
            move || with_page_timeout(page.goto(url), timeout, "Page navigation"),
            u32::from(self.config.max_navigation_retries()),
        )
        .await
        .map_err(|e| {
            warn!(target: "realty_ingest::crawl", "Navigation to page {number} failed: {e:#}");
            IngestError::Navigation {
                page: number,
                url: url.to_string(),
                message: format!("{e:#}"),
            }
        })
    }
}

fn abort(error: IngestError, phase: CrawlPhase, mut partial: CrawlOutcome) -> CrawlAbort {
    warn!(target: "realty_ingest::crawl", "Crawl aborted while {phase}: {error}");
    partial.phase = CrawlPhase::Failed;
    CrawlAbort {
        error,
        phase,
        partial,
    }
}
