//! Core types for crawl runs.
//!
//! This module contains the run-level error type, the crawl state machine
//! phases and the report returned to the trigger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::listing_extractor::{CardFailure, ListingRecord};
use crate::storage::StoreFailure;

/// Run-fatal failures.
///
/// Per-card and per-record problems are not errors; they are collected in
/// the [`IngestReport`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("Renderer launch failed: {0}")]
    Launch(String),

    #[error("Browsing context error: {0}")]
    Context(String),

    #[error("Navigation to page {page} ({url}) failed: {message}")]
    Navigation {
        page: u32,
        url: String,
        message: String,
    },

    #[error("Failed to read content of page {page}: {message}")]
    PageContent { page: u32, message: String },

    #[error("Crawl cancelled after {pages_completed} completed pages")]
    Cancelled { pages_completed: u32 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IngestError {
    /// Whether the failure is plausibly transient and a later run may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IngestError::Navigation { .. } | IngestError::PageContent { .. } | IngestError::Launch(_)
        )
    }
}

/// Convenience alias for Result with `IngestError`
pub type IngestResult<T> = Result<T, IngestError>;

/// States of a single crawl run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "page", rename_all = "snake_case")]
pub enum CrawlPhase {
    #[default]
    Idle,
    DiscoveringPageCount,
    FetchingPage(u32),
    ExtractingPage(u32),
    Done,
    Failed,
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::DiscoveringPageCount => write!(f, "discovering page count"),
            Self::FetchingPage(n) => write!(f, "fetching page {n}"),
            Self::ExtractingPage(n) => write!(f, "extracting page {n}"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Records and card failures accumulated by a crawl, complete or not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlOutcome {
    /// `Done` after the last page, `Failed` on partial results of an aborted crawl.
    pub phase: CrawlPhase,
    /// Page count reported by pagination (after any configured cap).
    pub max_page: u32,
    pub pages_crawled: u32,
    pub records: Vec<ListingRecord>,
    pub card_failures: Vec<CardFailure>,
}

/// A crawl that stopped before its last page.
#[derive(Debug, Clone)]
pub struct CrawlAbort {
    pub error: IngestError,
    /// Phase the crawl was in when it failed.
    pub phase: CrawlPhase,
    /// Whatever completed pages produced before the failure.
    pub partial: CrawlOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Complete,
    /// Stopped early; records from completed pages were kept.
    Partial { reason: String },
}

/// Result of one ingestion run, returned to the trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(flatten)]
    pub status: RunStatus,
    pub max_page: u32,
    pub pages_crawled: u32,
    pub records: Vec<ListingRecord>,
    pub card_failures: Vec<CardFailure>,
    pub inserted: usize,
    pub updated: usize,
    pub store_failures: Vec<StoreFailure>,
}

impl IngestReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Complete
    }

    /// Records handed to the sink that were persisted.
    #[must_use]
    pub fn stored(&self) -> usize {
        self.inserted + self.updated
    }
}
