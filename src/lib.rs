pub mod browser_profile;
pub mod browser_setup;
pub mod config;
pub mod crawl_engine;
pub mod listing_extractor;
pub mod session;
pub mod storage;
pub mod utils;

pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use config::{IngestConfig, PartialResultPolicy};
pub use crawl_engine::{
    CrawlPhase, IngestError, IngestOrchestrator, IngestReport, IngestResult, LogProgress,
    NoOpProgress, PageCrawler, ProgressReporter, RunStatus,
};
pub use listing_extractor::{ListingRecord, NaturalKey, PageExtraction, extract_listings};
pub use session::{
    BrowserSessionManager, CatalogPage, ChromiumLauncher, CrawlContext, RendererLauncher,
    RendererProcess,
};
pub use storage::{ListingSink, MemoryListingSink, SinkReport, SqliteListingStore, UpsertOutcome};
