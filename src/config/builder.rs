//! Type-safe builder for `IngestConfig` using the typestate pattern
//!
//! The database path and the catalog base URL must be supplied, in that
//! order, before `build()` becomes available. Optional settings can be
//! applied in any state.

use anyhow::{Result, anyhow, bail};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::Duration;

use super::types::{BlockedResource, IngestConfig, PartialResultPolicy};
use crate::utils::{MAX_NAVIGATION_RETRIES, PAGE_PLACEHOLDER};

// Type states for the builder
pub struct WithDatabase;
pub struct WithBaseUrl;

pub struct IngestConfigBuilder<State = ()> {
    pub(crate) draft: IngestConfig,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for IngestConfigBuilder<()> {
    fn default() -> Self {
        Self {
            draft: IngestConfig::default(),
            _phantom: PhantomData,
        }
    }
}

impl IngestConfig {
    /// Create a builder for configuring an `IngestConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> IngestConfigBuilder<()> {
        IngestConfigBuilder::default()
    }
}

impl<S> IngestConfigBuilder<S> {
    fn transition<T>(self) -> IngestConfigBuilder<T> {
        IngestConfigBuilder {
            draft: self.draft,
            _phantom: PhantomData,
        }
    }

    #[must_use]
    pub fn page_param(mut self, param: impl Into<String>) -> Self {
        self.draft.page_param = param.into();
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.draft.headless = headless;
        self
    }

    #[must_use]
    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.draft.chrome_executable = Some(path.into());
        self
    }

    #[must_use]
    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.draft.navigation_timeout = timeout;
        self
    }

    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.draft.settle_delay = delay;
        self
    }

    #[must_use]
    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.draft.page_delay = delay;
        self
    }

    /// Cap the number of pages walked regardless of what pagination reports.
    #[must_use]
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.draft.max_pages = Some(max_pages);
        self
    }

    #[must_use]
    pub fn max_navigation_retries(mut self, retries: u8) -> Self {
        self.draft.max_navigation_retries = retries;
        self
    }

    #[must_use]
    pub fn partial_results(mut self, policy: PartialResultPolicy) -> Self {
        self.draft.partial_results = policy;
        self
    }

    #[must_use]
    pub fn blocked_resources(mut self, resources: Vec<BlockedResource>) -> Self {
        self.draft.blocked_resources = resources;
        self
    }
}

impl IngestConfigBuilder<()> {
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> IngestConfigBuilder<WithDatabase> {
        self.draft.database_path = path.into();
        self.transition()
    }
}

impl IngestConfigBuilder<WithDatabase> {
    pub fn base_url(mut self, url: impl Into<String>) -> IngestConfigBuilder<WithBaseUrl> {
        self.draft.base_url = url.into().trim().to_string();
        self.transition()
    }
}

impl IngestConfigBuilder<WithBaseUrl> {
    /// Validate and produce the final configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute http(s) URL, the
    /// page parameter is empty, the navigation timeout is zero, or the retry
    /// count exceeds [`MAX_NAVIGATION_RETRIES`].
    pub fn build(self) -> Result<IngestConfig> {
        let config = self.draft;

        // The placeholder is not valid URL syntax everywhere, so validate a sample page.
        let first_page = config.base_url.replace(PAGE_PLACEHOLDER, "1");
        let parsed = url::Url::parse(&first_page)
            .map_err(|e| anyhow!("Invalid base URL '{}': {e}", config.base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "Base URL must use http or https, got '{}'",
                parsed.scheme()
            );
        }

        if config.page_param.is_empty() && !config.base_url.contains(PAGE_PLACEHOLDER) {
            bail!("Page parameter must not be empty");
        }

        if config.navigation_timeout.is_zero() {
            bail!("Navigation timeout must be greater than zero");
        }

        if config.max_pages == Some(0) {
            bail!("max_pages must be at least 1 when set");
        }

        if config.max_navigation_retries > MAX_NAVIGATION_RETRIES {
            bail!(
                "max_navigation_retries must be at most {MAX_NAVIGATION_RETRIES}, got {}",
                config.max_navigation_retries
            );
        }

        Ok(config)
    }
}
