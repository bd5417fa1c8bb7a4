//! Browser session management
//!
//! A worker owns one renderer process for its whole lifetime and hands out
//! short-lived, isolated browsing contexts, one per crawl run.

pub mod chromium;
pub mod context;
pub mod manager;
pub mod sweep;
pub mod traits;

pub use chromium::{ChromiumLauncher, ChromiumPage, ChromiumRenderer};
pub use context::CrawlContext;
pub use manager::BrowserSessionManager;
pub use sweep::sweep_by_signature;
pub use traits::{CatalogPage, RendererLauncher, RendererProcess};
