//! Listing extraction from rendered catalog pages
//!
//! Turns page HTML into normalized [`ListingRecord`]s. Extraction is
//! per-card: one malformed card is reported and skipped without affecting
//! its siblings.

pub mod card;
pub mod normalize;
pub mod record;
pub mod selectors;

pub use card::{CardFailure, CardFailureReason, PageExtraction, extract_card, extract_listings};
pub use normalize::{normalize_price, parse_region, parse_title, price_per_area, TitleParts};
pub use record::{ListingRecord, NaturalKey};
