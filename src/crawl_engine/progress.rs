//! Progress reporting abstraction for crawl runs
//!
//! Defines the `ProgressReporter` trait for lifecycle event reporting and
//! provides no-op and logging implementations.

use log::{error, info};

/// Trait for reporting run progress at key lifecycle events
///
/// Implementations can send updates to channels, log, update UI, etc.
pub trait ProgressReporter: Send + Sync {
    /// A browsing context has been leased for the run
    fn report_session_acquired(&self);

    /// Pagination discovery finished
    fn report_page_count(&self, max_page: u32);

    /// Navigation to a catalog page has started
    fn report_page_started(&self, page: u32, url: &str);

    /// A page has been extracted
    fn report_page_extracted(&self, page: u32, records: usize, failures: usize);

    /// The browsing context is being released
    fn report_cleanup_started(&self);

    /// The run finished and `stored` records reached the sink
    fn report_completed(&self, stored: usize);

    fn report_error(&self, error: &str);
}

/// Progress reporter that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn report_session_acquired(&self) {}

    #[inline(always)]
    fn report_page_count(&self, _max_page: u32) {}

    #[inline(always)]
    fn report_page_started(&self, _page: u32, _url: &str) {}

    #[inline(always)]
    fn report_page_extracted(&self, _page: u32, _records: usize, _failures: usize) {}

    #[inline(always)]
    fn report_cleanup_started(&self) {}

    #[inline(always)]
    fn report_completed(&self, _stored: usize) {}

    #[inline(always)]
    fn report_error(&self, _error: &str) {}
}

/// Progress reporter that writes one log line per event
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report_session_acquired(&self) {
        info!(target: "realty_ingest::run", "Browsing context acquired");
    }

    fn report_page_count(&self, max_page: u32) {
        info!(target: "realty_ingest::run", "Catalog has {max_page} pages");
    }

    fn report_page_started(&self, page: u32, url: &str) {
        info!(target: "realty_ingest::run", "Fetching page {page}: {url}");
    }

    fn report_page_extracted(&self, page: u32, records: usize, failures: usize) {
        info!(
            target: "realty_ingest::run",
            "Page {page}: {records} listings, {failures} cards skipped"
        );
    }

    fn report_cleanup_started(&self) {
        info!(target: "realty_ingest::run", "Releasing browsing context");
    }

    fn report_completed(&self, stored: usize) {
        info!(target: "realty_ingest::run", "Run completed, {stored} listings stored");
    }

    fn report_error(&self, message: &str) {
        error!(target: "realty_ingest::run", "Run failed: {message}");
    }
}
