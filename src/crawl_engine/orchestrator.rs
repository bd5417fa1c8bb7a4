//! Run coordination
//!
//! One run: lease a browsing context, crawl every page, release the context
//! on every path, then hand the records to the sink.

use chrono::Utc;
use log::{error, info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::crawl_types::{CrawlAbort, CrawlPhase, IngestError, IngestReport, RunStatus};
use super::page_crawler::PageCrawler;
use super::progress::{LogProgress, ProgressReporter};
use crate::config::{IngestConfig, PartialResultPolicy};
use crate::session::{BrowserSessionManager, RendererLauncher};
use crate::storage::ListingSink;

pub struct IngestOrchestrator<L: RendererLauncher, S: ListingSink> {
    config: IngestConfig,
    sessions: Arc<BrowserSessionManager<L>>,
    sink: Arc<S>,
}

impl<L: RendererLauncher, S: ListingSink> IngestOrchestrator<L, S> {
    #[must_use]
    pub fn new(config: IngestConfig, sessions: Arc<BrowserSessionManager<L>>, sink: Arc<S>) -> Self {
        Self {
            config,
            sessions,
            sink,
        }
    }

    #[must_use]
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<BrowserSessionManager<L>> {
        &self.sessions
    }

    /// Run one full crawl-and-ingest cycle with log-based progress.
    ///
    /// # Errors
    ///
    /// See [`IngestOrchestrator::run_once_with`].
    pub async fn run_once(&self) -> Result<IngestReport, IngestError> {
        self.run_once_with(&LogProgress, CancellationToken::new())
            .await
    }

    /// Run one cycle, reporting progress and honoring `cancel`.
    ///
    /// The browsing context is released before this returns, whatever the
    /// outcome. The renderer process itself stays up for the next run.
    ///
    /// # Errors
    ///
    /// Launch and context errors, and any crawl failure under
    /// [`PartialResultPolicy::Discard`]. Under [`PartialResultPolicy::Keep`]
    /// a crawl failure yields a partial report instead.
    pub async fn run_once_with<P: ProgressReporter>(
        &self,
        progress: &P,
        cancel: CancellationToken,
    ) -> Result<IngestReport, IngestError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(target: "realty_ingest::run", "Starting ingest run {run_id}");

        let mut context = match self.sessions.create_context().await {
            Ok(context) => context,
            Err(e) => {
                progress.report_error(&e.to_string());
                return Err(e);
            }
        };
        progress.report_session_acquired();

        let crawl = match context.page() {
            Some(page) => {
                PageCrawler::new(&self.config, progress, cancel)
                    .run(page)
                    .await
            }
            None => Err(CrawlAbort {
                error: IngestError::Context("browsing context has no page".to_string()),
                phase: CrawlPhase::Idle,
                partial: Default::default(),
            }),
        };

        progress.report_cleanup_started();
        self.sessions.close_context(&mut context).await;

        let (outcome, status) = match crawl {
            Ok(outcome) => (outcome, RunStatus::Complete),
            Err(abort) => {
                if abort.error.is_retryable() {
                    info!(
                        target: "realty_ingest::run",
                        "Failure while {} looks transient; the next run may succeed",
                        abort.phase
                    );
                }
                match self.config.partial_results() {
                    PartialResultPolicy::Discard => {
                        if !abort.partial.records.is_empty() {
                            warn!(
                                target: "realty_ingest::run",
                                "Discarding {} listings from {} completed pages",
                                abort.partial.records.len(),
                                abort.partial.pages_crawled
                            );
                        }
                        progress.report_error(&abort.error.to_string());
                        return Err(abort.error);
                    }
                    PartialResultPolicy::Keep => {
                        warn!(
                            target: "realty_ingest::run",
                            "Keeping {} listings from {} completed pages after failure: {}",
                            abort.partial.records.len(),
                            abort.partial.pages_crawled,
                            abort.error
                        );
                        let reason = abort.error.to_string();
                        (abort.partial, RunStatus::Partial { reason })
                    }
                }
            }
        };

        let sink_report = self.sink.upsert_many(&outcome.records).await;
        if !sink_report.failures.is_empty() {
            error!(
                target: "realty_ingest::run",
                "{} of {} listings could not be stored",
                sink_report.failures.len(),
                outcome.records.len()
            );
        }
        progress.report_completed(sink_report.stored());

        info!(
            target: "realty_ingest::run",
            "Run {run_id} finished: {} inserted, {} updated, {} store failures",
            sink_report.inserted,
            sink_report.updated,
            sink_report.failures.len()
        );

        Ok(IngestReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            status,
            max_page: outcome.max_page,
            pages_crawled: outcome.pages_crawled,
            records: outcome.records,
            card_failures: outcome.card_failures,
            inserted: sink_report.inserted,
            updated: sink_report.updated,
            store_failures: sink_report.failures,
        })
    }
}
