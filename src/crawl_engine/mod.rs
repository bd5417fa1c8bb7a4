//! Crawl engine
//!
//! Pagination discovery, the sequential page walk and the run orchestrator
//! that ties session, crawler and sink together.

pub mod crawl_types;
pub mod orchestrator;
pub mod page_crawler;
pub mod page_timeout;
pub mod pagination;
pub mod progress;

pub use crawl_types::{
    CrawlAbort, CrawlOutcome, CrawlPhase, IngestError, IngestReport, IngestResult, RunStatus,
};
pub use orchestrator::IngestOrchestrator;
pub use page_crawler::PageCrawler;
pub use page_timeout::{retry_with_backoff, with_page_timeout};
pub use pagination::{discover_max_page, page_url};
pub use progress::{LogProgress, NoOpProgress, ProgressReporter};
