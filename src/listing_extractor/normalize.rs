//! Text normalization for listing card fields.
//!
//! All functions here are pure and never fail: text that cannot be
//! interpreted yields `None` rather than an error.

use regex::Regex;
use std::sync::LazyLock;

/// Separator between the rooms segment and the area segment of a card title.
const TITLE_SEPARATOR: char = '·';

/// Suffix word following the room count ("2-комнатная").
const ROOMS_SUFFIX: &str = "комнатная";

/// Label used for studio apartments, which have zero separate rooms.
const STUDIO_LABEL: &str = "студия";

const AREA_UNIT: &str = "м²";

/// Prefix marking a "from" price on new-build listings.
const PRICE_FROM_PREFIX: &str = "от ";

/// Currency marks stripped from price text (tenge sign and its legacy glyph).
const CURRENCY_MARKS: [char; 2] = ['₸', '〒'];

/// Non-breaking and thin spaces used as thousands separators.
const NARROW_SPACES: [char; 3] = ['\u{a0}', '\u{202f}', '\u{2009}'];

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)").expect("BUG: hardcoded leading-number regex is invalid")
});

/// Collapse runs of whitespace the way rendered inner text does.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rooms and area parsed from a card title.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TitleParts {
    pub rooms: Option<u32>,
    pub area: Option<f64>,
}

/// Parse a title of the form `"<N>-комнатная · <area> м²"`.
///
/// Titles without the separator yield no rooms and no area. The studio
/// label counts as zero rooms.
#[must_use]
pub fn parse_title(title: &str) -> TitleParts {
    let mut segments = title.split(TITLE_SEPARATOR);
    let (Some(rooms_segment), Some(area_segment)) = (segments.next(), segments.next()) else {
        return TitleParts::default();
    };

    TitleParts {
        rooms: parse_rooms(rooms_segment),
        area: parse_area(area_segment),
    }
}

fn parse_rooms(segment: &str) -> Option<u32> {
    let segment = segment.trim().to_lowercase();
    if segment.starts_with(STUDIO_LABEL) {
        return Some(0);
    }

    let head = segment.split('-').next().unwrap_or_default();
    let head = head.replace(ROOMS_SUFFIX, "");
    LEADING_NUMBER
        .captures(&head)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn parse_area(segment: &str) -> Option<f64> {
    let cleaned = segment.replace(AREA_UNIT, "");
    let cleaned = cleaned.trim().replace(',', ".");
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|area| area.is_finite() && *area >= 0.0)
}

/// Normalize a price string into a number.
///
/// Lower-cases, strips currency marks, collapses narrow and regular spaces,
/// removes a leading "от " and drops the remaining spaces. The result must then be all ASCII
/// digits, otherwise the price is unknown.
#[must_use]
pub fn normalize_price(raw: &str) -> Option<f64> {
    let lowered = raw.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| !CURRENCY_MARKS.contains(c))
        .map(|c| if NARROW_SPACES.contains(&c) { ' ' } else { c })
        .collect();
    let stripped = collapse_whitespace(&stripped);
    let stripped = stripped
        .strip_prefix(PRICE_FROM_PREFIX)
        .unwrap_or(stripped.as_str());

    let digits: String = stripped.chars().filter(|c| *c != ' ').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<f64>().ok()
}

/// Price per unit area, rounded to two decimals.
///
/// `None` unless both inputs are present and the area is non-zero.
#[must_use]
pub fn price_per_area(price: Option<f64>, area: Option<f64>) -> Option<f64> {
    match (price, area) {
        (Some(price), Some(area)) if area != 0.0 => Some(round2(price / area)),
        _ => None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Region is the first comma-separated segment of the card subtitle.
#[must_use]
pub fn parse_region(subtitle: &str) -> String {
    subtitle
        .trim()
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Optional text fields: empty after trimming means absent.
#[must_use]
pub fn non_empty(text: &str) -> Option<String> {
    let text = collapse_whitespace(text);
    (!text.is_empty()).then_some(text)
}
