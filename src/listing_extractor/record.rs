//! Listing records and the natural key that identifies them across runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One normalized listing card.
///
/// Numeric fields are `None` when the card text could not be interpreted;
/// that is a degraded record, not a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub rooms: Option<u32>,
    pub area: Option<f64>,
    pub price: Option<f64>,
    /// Rounded to two decimals; present only when price and a non-zero area are.
    pub price_per_area: Option<f64>,
    pub region: String,
    pub views: Option<String>,
    pub listing_source: String,
}

impl ListingRecord {
    #[must_use]
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            rooms: self.rooms,
            area: self.area,
            price: self.price,
            region: self.region.clone(),
        }
    }
}

/// Identity of a listing for upsert purposes: (rooms, area, price, region).
///
/// Two cards with equal keys are the same listing even if their views or
/// source label differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaturalKey {
    pub rooms: Option<u32>,
    pub area: Option<f64>,
    pub price: Option<f64>,
    pub region: String,
}

impl NaturalKey {
    /// Canonical single-string form used as the unique column in storage.
    ///
    /// Missing components render as `-` so they compare equal to each other,
    /// which a nullable composite UNIQUE constraint would not do.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fn part<T: fmt::Display>(value: Option<T>) -> String {
            value.map_or_else(|| "-".to_string(), |v| v.to_string())
        }

        format!(
            "{}|{}|{}|{}",
            part(self.rooms),
            part(self.area),
            part(self.price),
            self.region.trim()
        )
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fingerprint())
    }
}
