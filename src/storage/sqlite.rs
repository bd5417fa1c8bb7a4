//! SQLite-backed listing store.
//!
//! The natural key is materialized as a single `UNIQUE` text column so the
//! upsert is one `INSERT ... ON CONFLICT DO UPDATE` statement. Concurrent
//! writers of the same key therefore cannot create duplicates.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

use super::{ListingSink, UpsertOutcome};
use crate::listing_extractor::{ListingRecord, NaturalKey};

/// SQL schema for the listing store
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS listings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    -- rooms|area|price|region, missing parts rendered as '-'
    natural_key TEXT NOT NULL UNIQUE,
    rooms INTEGER,
    area REAL,
    price REAL,
    price_per_area REAL,
    region TEXT NOT NULL,
    views TEXT,
    listing_source TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    revision INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_listings_region ON listings(region);
"#;

const UPSERT_SQL: &str = r#"
INSERT INTO listings (
    natural_key, rooms, area, price, price_per_area,
    region, views, listing_source, created_at, updated_at
)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(natural_key) DO UPDATE SET
    price_per_area = excluded.price_per_area,
    views = excluded.views,
    listing_source = excluded.listing_source,
    updated_at = excluded.updated_at,
    revision = listings.revision + 1
RETURNING id, revision
"#;

const SELECT_COLUMNS: &str = "id, natural_key, rooms, area, price, price_per_area, region, \
     views, listing_source, created_at, updated_at, revision";

/// A persisted listing row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredListing {
    pub id: i64,
    pub natural_key: String,
    pub rooms: Option<i64>,
    pub area: Option<f64>,
    pub price: Option<f64>,
    pub price_per_area: Option<f64>,
    pub region: String,
    pub views: Option<String>,
    pub listing_source: String,
    pub created_at: i64,
    pub updated_at: i64,
    /// 1 after the insert, incremented by every overwrite.
    pub revision: i64,
}

/// Listing store on a local SQLite database.
///
/// Uses WAL mode so the downstream analysis stage can read while a run writes.
#[derive(Clone)]
pub struct SqliteListingStore {
    pool: SqlitePool,
}

impl SqliteListingStore {
    /// Open the database at `path`, creating it and its schema if needed.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open SQLite database {}", path.display()))?;

        Self::with_pool(pool).await
    }

    /// Private in-memory database, for dry runs and tests.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("Failed to parse in-memory SQLite URL")?;

        // Every connection to :memory: is its own database, so keep exactly one alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory SQLite database")?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        // Idempotent: CREATE ... IF NOT EXISTS
        sqlx::query(SCHEMA_SQL)
            .execute(&pool)
            .await
            .context("Failed to initialize database schema")?;
        Ok(Self { pool })
    }

    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM listings")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count listings")?;
        Ok(count)
    }

    /// All rows, oldest first.
    pub async fn fetch_all(&self) -> Result<Vec<StoredListing>> {
        sqlx::query_as::<_, StoredListing>(&format!(
            "SELECT {SELECT_COLUMNS} FROM listings ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to load listings")
    }

    pub async fn find_by_key(&self, key: &NaturalKey) -> Result<Option<StoredListing>> {
        sqlx::query_as::<_, StoredListing>(&format!(
            "SELECT {SELECT_COLUMNS} FROM listings WHERE natural_key = ?"
        ))
        .bind(key.fingerprint())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to look up listing")
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl ListingSink for SqliteListingStore {
    async fn upsert(&self, record: &ListingRecord) -> Result<UpsertOutcome> {
        let key = record.natural_key().fingerprint();
        let now = Utc::now().timestamp();

        let (_id, revision): (i64, i64) = sqlx::query_as(UPSERT_SQL)
            .bind(&key)
            .bind(record.rooms.map(i64::from))
            .bind(record.area)
            .bind(record.price)
            .bind(record.price_per_area)
            .bind(&record.region)
            .bind(record.views.as_deref())
            .bind(&record.listing_source)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to upsert listing {key}"))?;

        Ok(if revision == 1 {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        })
    }
}
