//! Per-card extraction and the page-level report built from it.

use log::{debug, warn};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use super::normalize::{
    collapse_whitespace, non_empty, normalize_price, parse_region, parse_title, price_per_area,
};
use super::record::ListingRecord;
use super::selectors::{
    CARD, CARD_OWNER_LABEL, CARD_PRICE, CARD_SUBTITLE, CARD_TITLE, CARD_VIEWS, RESULTS_CONTAINER,
};
use crate::utils::UNSPECIFIED_SOURCE;

/// Why a single card produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum CardFailureReason {
    #[error("card has no title element")]
    MissingTitle,
    #[error("card has no price element")]
    MissingPrice,
    #[error("card has no subtitle element")]
    MissingSubtitle,
}

/// A skipped card, identified by page number and 0-based position on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFailure {
    pub page: u32,
    pub index: usize,
    pub reason: CardFailureReason,
}

/// Outcome of extracting one catalog page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageExtraction {
    pub page: u32,
    /// Number of card elements found, parsed or not.
    pub card_count: usize,
    pub records: Vec<ListingRecord>,
    pub failures: Vec<CardFailure>,
}

impl PageExtraction {
    /// No cards were found at all (missing container or an empty result list).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.card_count == 0
    }

    /// Cards were found but none could be parsed.
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.card_count > 0 && self.records.is_empty()
    }
}

fn first_text(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
}

/// Extract a record from one card element.
///
/// # Errors
///
/// Fails only when a required element (title, price, subtitle) is missing.
/// Unparseable text degrades to `None` fields instead.
pub fn extract_card(card: ElementRef<'_>) -> Result<ListingRecord, CardFailureReason> {
    let title = first_text(card, &CARD_TITLE).ok_or(CardFailureReason::MissingTitle)?;
    let price_text = first_text(card, &CARD_PRICE).ok_or(CardFailureReason::MissingPrice)?;
    let subtitle = first_text(card, &CARD_SUBTITLE).ok_or(CardFailureReason::MissingSubtitle)?;

    let parts = parse_title(&title);
    let price = normalize_price(&price_text);

    let views = card
        .select(&CARD_VIEWS)
        .next()
        .and_then(|el| non_empty(&el.text().collect::<String>()));

    let listing_source = card
        .select(&CARD_OWNER_LABEL)
        .next()
        .and_then(|el| non_empty(&el.text().collect::<String>()))
        .unwrap_or_else(|| UNSPECIFIED_SOURCE.to_string());

    Ok(ListingRecord {
        rooms: parts.rooms,
        area: parts.area,
        price,
        price_per_area: price_per_area(price, parts.area),
        region: parse_region(&subtitle),
        views,
        listing_source,
    })
}

/// Extract every card from a rendered catalog page.
///
/// A failing card is logged with its ordinal and skipped; it never aborts
/// the page.
#[must_use]
pub fn extract_listings(html: &str, page: u32) -> PageExtraction {
    let document = Html::parse_document(html);
    let mut extraction = PageExtraction {
        page,
        ..PageExtraction::default()
    };

    let Some(container) = document.select(&RESULTS_CONTAINER).next() else {
        debug!(target: "realty_ingest::extract", "Page {page}: results container not found");
        return extraction;
    };

    for (index, card) in container.select(&CARD).enumerate() {
        extraction.card_count += 1;
        match extract_card(card) {
            Ok(record) => extraction.records.push(record),
            Err(reason) => {
                warn!(
                    target: "realty_ingest::extract",
                    "Skipping card {index} on page {page}: {reason}"
                );
                extraction.failures.push(CardFailure {
                    page,
                    index,
                    reason,
                });
            }
        }
    }

    debug!(
        target: "realty_ingest::extract",
        "Page {page}: {} cards, {} records, {} skipped",
        extraction.card_count,
        extraction.records.len(),
        extraction.failures.len()
    );

    extraction
}
