//! Environment-driven configuration
//!
//! Workers are configured through `REALTY_*` variables, optionally loaded
//! from a `.env` file in the working directory.

use anyhow::{Context, Result, bail};
use std::str::FromStr;
use std::time::Duration;

use super::types::{IngestConfig, PartialResultPolicy};
use crate::utils::{DEFAULT_BASE_URL, DEFAULT_DATABASE_PATH};

pub const ENV_BASE_URL: &str = "REALTY_BASE_URL";
pub const ENV_PAGE_PARAM: &str = "REALTY_PAGE_PARAM";
pub const ENV_DATABASE_PATH: &str = "REALTY_DATABASE_PATH";
pub const ENV_HEADLESS: &str = "REALTY_HEADLESS";
pub const ENV_NAVIGATION_TIMEOUT_SECS: &str = "REALTY_NAVIGATION_TIMEOUT_SECS";
pub const ENV_SETTLE_DELAY_MS: &str = "REALTY_SETTLE_DELAY_MS";
pub const ENV_PAGE_DELAY_SECS: &str = "REALTY_PAGE_DELAY_SECS";
pub const ENV_MAX_PAGES: &str = "REALTY_MAX_PAGES";
pub const ENV_NAVIGATION_RETRIES: &str = "REALTY_NAVIGATION_RETRIES";
pub const ENV_KEEP_PARTIAL: &str = "REALTY_KEEP_PARTIAL";
pub const ENV_CHROMIUM_PATH: &str = "CHROMIUM_PATH";

impl IngestConfig {
    /// Load configuration from the process environment (and `.env` if present).
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is set but cannot be parsed, or when
    /// the resulting configuration fails validation.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => log::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => log::warn!("Ignoring unreadable .env file: {e}"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`IngestConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = IngestConfig::builder()
            .database_path(get(ENV_DATABASE_PATH).unwrap_or_else(|| DEFAULT_DATABASE_PATH.into()))
            .base_url(get(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.into()));

        if let Some(param) = get(ENV_PAGE_PARAM) {
            builder = builder.page_param(param);
        }
        if let Some(value) = get(ENV_HEADLESS) {
            builder = builder.headless(parse_bool(ENV_HEADLESS, &value)?);
        }
        if let Some(value) = get(ENV_NAVIGATION_TIMEOUT_SECS) {
            builder = builder
                .navigation_timeout(Duration::from_secs(parse_num(ENV_NAVIGATION_TIMEOUT_SECS, &value)?));
        }
        if let Some(value) = get(ENV_SETTLE_DELAY_MS) {
            builder = builder.settle_delay(Duration::from_millis(parse_num(ENV_SETTLE_DELAY_MS, &value)?));
        }
        if let Some(value) = get(ENV_PAGE_DELAY_SECS) {
            builder = builder.page_delay(Duration::from_secs(parse_num(ENV_PAGE_DELAY_SECS, &value)?));
        }
        if let Some(value) = get(ENV_MAX_PAGES) {
            builder = builder.max_pages(parse_num(ENV_MAX_PAGES, &value)?);
        }
        if let Some(value) = get(ENV_NAVIGATION_RETRIES) {
            builder = builder.max_navigation_retries(parse_num(ENV_NAVIGATION_RETRIES, &value)?);
        }
        if let Some(value) = get(ENV_KEEP_PARTIAL)
            && parse_bool(ENV_KEEP_PARTIAL, &value)?
        {
            builder = builder.partial_results(PartialResultPolicy::Keep);
        }
        if let Some(path) = get(ENV_CHROMIUM_PATH) {
            builder = builder.chrome_executable(path);
        }

        builder.build()
    }
}

fn parse_num<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .with_context(|| format!("{key} must be a non-negative integer, got '{value}'"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{key} must be a boolean, got '{other}'"),
    }
}
