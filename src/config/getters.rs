//! Getter methods for `IngestConfig`

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::{BlockedResource, IngestConfig, PartialResultPolicy};

impl IngestConfig {
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn page_param(&self) -> &str {
        &self.page_param
    }

    #[must_use]
    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn chrome_executable(&self) -> Option<&PathBuf> {
        self.chrome_executable.as_ref()
    }

    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        self.navigation_timeout
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    #[must_use]
    pub fn page_delay(&self) -> Duration {
        self.page_delay
    }

    #[must_use]
    pub fn max_pages(&self) -> Option<u32> {
        self.max_pages
    }

    #[must_use]
    pub fn max_navigation_retries(&self) -> u8 {
        self.max_navigation_retries
    }

    #[must_use]
    pub fn partial_results(&self) -> PartialResultPolicy {
        self.partial_results
    }

    #[must_use]
    pub fn blocked_resources(&self) -> &[BlockedResource] {
        &self.blocked_resources
    }
}
