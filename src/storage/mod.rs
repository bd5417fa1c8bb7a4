//! Listing storage
//!
//! The [`ListingSink`] contract: idempotent upsert keyed on the listing's
//! natural key. Storing the same key twice leaves one row holding the second
//! write's values.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::listing_extractor::ListingRecord;

pub use memory::MemoryListingSink;
pub use sqlite::{SqliteListingStore, StoredListing};

/// Whether an upsert created a row or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// A record the sink could not persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreFailure {
    pub natural_key: String,
    pub message: String,
}

/// Totals for a batch upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkReport {
    pub inserted: usize,
    pub updated: usize,
    pub failures: Vec<StoreFailure>,
}

impl SinkReport {
    #[must_use]
    pub fn stored(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Destination for extracted listings.
pub trait ListingSink: Send + Sync + 'static {
    /// Insert the record, or overwrite the row with the same natural key.
    fn upsert(&self, record: &ListingRecord) -> impl Future<Output = Result<UpsertOutcome>> + Send;

    /// Upsert every record, isolating failures per record.
    ///
    /// A failing record is logged and reported; the rest of the batch is
    /// still written.
    fn upsert_many(&self, records: &[ListingRecord]) -> impl Future<Output = SinkReport> + Send {
        async move {
            let mut report = SinkReport::default();
            for record in records {
                match self.upsert(record).await {
                    Ok(UpsertOutcome::Inserted) => report.inserted += 1,
                    Ok(UpsertOutcome::Updated) => report.updated += 1,
                    Err(e) => {
                        let natural_key = record.natural_key().fingerprint();
                        warn!(
                            target: "realty_ingest::storage",
                            "Failed to store listing {natural_key}: {e:#}"
                        );
                        report.failures.push(StoreFailure {
                            natural_key,
                            message: format!("{e:#}"),
                        });
                    }
                }
            }
            report
        }
    }
}
