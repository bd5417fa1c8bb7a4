//! Core configuration types for catalog ingestion
//!
//! This module contains the main `IngestConfig` struct and the small enums
//! that select run-level policies.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::{
    DEFAULT_BASE_URL, DEFAULT_DATABASE_PATH, DEFAULT_NAVIGATION_RETRIES,
    DEFAULT_NAVIGATION_TIMEOUT_SECS, DEFAULT_PAGE_DELAY_SECS, DEFAULT_PAGE_PARAM,
    DEFAULT_SETTLE_DELAY_MS,
};

/// What happens to records gathered before a run-fatal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialResultPolicy {
    /// The run fails and nothing reaches the sink.
    #[default]
    Discard,
    /// Records from pages completed before the failure are stored and the
    /// run is reported as partial.
    Keep,
}

/// Subresource categories the request filter aborts before they hit the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockedResource {
    Image,
    Media,
    Font,
    Stylesheet,
}

/// Main configuration struct for an ingestion worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Catalog base URL. May contain `{n}` as a page-number placeholder.
    pub(crate) base_url: String,
    /// Query parameter appended when the base URL has no placeholder.
    pub(crate) page_param: String,
    pub(crate) database_path: PathBuf,
    pub(crate) headless: bool,
    /// Explicit renderer binary; otherwise `CHROMIUM_PATH`, system paths, then a managed download.
    pub(crate) chrome_executable: Option<PathBuf>,
    pub(crate) navigation_timeout: Duration,
    /// Post-navigation wait for client-side rendering.
    pub(crate) settle_delay: Duration,
    /// Pacing delay between consecutive pages.
    pub(crate) page_delay: Duration,
    /// Optional cap applied to the discovered page count.
    pub(crate) max_pages: Option<u32>,
    pub(crate) max_navigation_retries: u8,
    pub(crate) partial_results: PartialResultPolicy,
    pub(crate) blocked_resources: Vec<BlockedResource>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_param: DEFAULT_PAGE_PARAM.to_string(),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            headless: true,
            chrome_executable: None,
            navigation_timeout: Duration::from_secs(DEFAULT_NAVIGATION_TIMEOUT_SECS),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            page_delay: Duration::from_secs(DEFAULT_PAGE_DELAY_SECS),
            max_pages: None,
            max_navigation_retries: DEFAULT_NAVIGATION_RETRIES,
            partial_results: PartialResultPolicy::Discard,
            blocked_resources: vec![
                BlockedResource::Image,
                BlockedResource::Media,
                BlockedResource::Font,
            ],
        }
    }
}
