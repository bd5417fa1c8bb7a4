//! Pagination discovery and page URL construction.

use scraper::Html;

use crate::listing_extractor::selectors::PAGINATOR_BUTTON;
use crate::utils::PAGE_PLACEHOLDER;

/// Highest page number advertised by the pagination control.
///
/// Only `data-page` values made entirely of ASCII digits count. No markers
/// at all means a single page.
#[must_use]
pub fn discover_max_page(html: &str) -> u32 {
    let document = Html::parse_document(html);
    document
        .select(&PAGINATOR_BUTTON)
        .filter_map(|button| button.value().attr("data-page"))
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|value| value.parse::<u32>().ok())
        .max()
        .unwrap_or(1)
        .max(1)
}

/// URL of page `n` (1-based).
///
/// A `{n}` placeholder in the base is substituted; otherwise `param=n` is
/// appended as a query parameter, leaving the rest of the base untouched.
#[must_use]
pub fn page_url(base: &str, param: &str, page: u32) -> String {
    if base.contains(PAGE_PLACEHOLDER) {
        return base.replace(PAGE_PLACEHOLDER, &page.to_string());
    }

    let (without_fragment, fragment) = match base.split_once('#') {
        Some((head, tail)) => (head, Some(tail)),
        None => (base, None),
    };

    let separator = if !without_fragment.contains('?') {
        "?"
    } else if without_fragment.ends_with('?') || without_fragment.ends_with('&') {
        ""
    } else {
        "&"
    };

    let mut url = format!("{without_fragment}{separator}{param}={page}");
    if let Some(fragment) = fragment {
        url.push('#');
        url.push_str(fragment);
    }
    url
}
