//! CSS selectors for the catalog's card layout.
//!
//! The layout is fixed; a renamed container simply yields no cards.

use scraper::Selector;
use std::sync::LazyLock;

/// Results list holding the listing cards.
pub static RESULTS_CONTAINER: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("section.a-list.a-search-list")
        .expect("BUG: hardcoded CSS selector 'section.a-list.a-search-list' is invalid")
});

pub static CARD: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.a-card").expect("BUG: hardcoded CSS selector 'div.a-card' is invalid")
});

pub static CARD_TITLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".a-card__title")
        .expect("BUG: hardcoded CSS selector '.a-card__title' is invalid")
});

pub static CARD_PRICE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".a-card__price")
        .expect("BUG: hardcoded CSS selector '.a-card__price' is invalid")
});

pub static CARD_SUBTITLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".a-card__subtitle")
        .expect("BUG: hardcoded CSS selector '.a-card__subtitle' is invalid")
});

pub static CARD_VIEWS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".a-view-count")
        .expect("BUG: hardcoded CSS selector '.a-view-count' is invalid")
});

pub static CARD_OWNER_LABEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".a-card__owner-label")
        .expect("BUG: hardcoded CSS selector '.a-card__owner-label' is invalid")
});

/// Pagination buttons; each carries its page number in `data-page`.
pub static PAGINATOR_BUTTON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("nav.paginator a.paginator__btn")
        .expect("BUG: hardcoded CSS selector 'nav.paginator a.paginator__btn' is invalid")
});
