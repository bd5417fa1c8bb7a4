//! In-process listing sink.

use anyhow::Result;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::{ListingSink, UpsertOutcome};
use crate::listing_extractor::ListingRecord;

/// Keeps the latest record per natural key, in first-insertion order.
#[derive(Debug, Default)]
pub struct MemoryListingSink {
    inner: Mutex<Rows>,
}

#[derive(Debug, Default)]
struct Rows {
    order: Vec<String>,
    by_key: HashMap<String, ListingRecord>,
}

impl MemoryListingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of stored records.
    #[must_use]
    pub fn records(&self) -> Vec<ListingRecord> {
        let rows = self.inner.lock();
        rows.order
            .iter()
            .filter_map(|key| rows.by_key.get(key).cloned())
            .collect()
    }
}

impl ListingSink for MemoryListingSink {
    async fn upsert(&self, record: &ListingRecord) -> Result<UpsertOutcome> {
        let key = record.natural_key().fingerprint();
        let mut rows = self.inner.lock();
        let outcome = if rows.by_key.contains_key(&key) {
            UpsertOutcome::Updated
        } else {
            rows.order.push(key.clone());
            UpsertOutcome::Inserted
        };
        rows.by_key.insert(key, record.clone());
        Ok(outcome)
    }
}
