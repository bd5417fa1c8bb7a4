//! Shared configuration constants for realty_ingest
//!
//! Default values used by the config builder, the browser launcher and the
//! listing extractor, kept in one place to avoid magic numbers.

/// Catalog crawled when no base URL is configured.
///
/// Apartments for sale in Almaty, listings with photos only, cheapest first.
pub const DEFAULT_BASE_URL: &str =
    "https://krisha.kz/prodazha/kvartiry/almaty/?das[_sys.hasphoto]=1&sort_by=price-asc";

/// Query parameter carrying the 1-based page number.
pub const DEFAULT_PAGE_PARAM: &str = "page";

/// Placeholder substituted with the page number when present in the base URL.
pub const PAGE_PLACEHOLDER: &str = "{n}";

/// Default SQLite database file for the listing store.
pub const DEFAULT_DATABASE_PATH: &str = "listings.sqlite";

/// Navigation timeout per catalog page: 60 seconds
///
/// Catalog pages are heavy and the site is slow under load; anything beyond
/// this is treated as a fatal navigation failure for the run.
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 60;

/// Wait after navigation so client-side rendering can finish: 2 seconds
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2_000;

/// Pacing delay between consecutive page fetches: 10 seconds
///
/// Applied between pages only, never after the final one.
pub const DEFAULT_PAGE_DELAY_SECS: u64 = 10;

/// Navigation retries before a failure becomes fatal.
///
/// Zero keeps navigation one-shot.
pub const DEFAULT_NAVIGATION_RETRIES: u8 = 0;

/// Upper bound accepted for the navigation retry count.
pub const MAX_NAVIGATION_RETRIES: u8 = 10;

/// Ceiling for a single backoff delay between navigation attempts: 60 seconds
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Timeout for individual CDP requests issued by the browser handle.
pub const CDP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Browser window size used for every context
pub const WINDOW_WIDTH: u32 = 1600;
pub const WINDOW_HEIGHT: u32 = 900;

/// Prefix of per-process Chrome profile directories.
///
/// The full directory path doubles as the process signature for the orphan sweep.
pub const PROFILE_PREFIX: &str = "realty_chrome";

/// Chrome user agent string
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Listing source recorded when a card carries no owner label.
pub const UNSPECIFIED_SOURCE: &str = "Не указано";
