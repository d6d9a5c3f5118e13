// PharmaLens - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.
// Config values are validated against the ranges declared here.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "PharmaLens";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "PharmaLens";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Data loading
// =============================================================================

/// Pharmacy dataset file name used when neither the CLI nor config names one.
pub const DEFAULT_PHARMACIES_FILE: &str = "pharmacies.json";

/// Review dataset file name used when neither the CLI nor config names one.
pub const DEFAULT_REVIEWS_FILE: &str = "reviews.json";

/// Largest dataset file accepted by the loader. Anything bigger is almost
/// certainly the wrong file.
pub const MAX_DATASET_FILE_SIZE: u64 = 256 * 1024 * 1024; // 256 MB

/// Lowest valid review rating (inclusive).
pub const MIN_REVIEW_RATING: f64 = 1.0;

/// Highest valid review rating (inclusive). Also the upper bound for
/// pharmacy average ratings and predicate rating bounds.
pub const MAX_RATING: f64 = 5.0;

/// Fewest digits a bare number needs to be read as epoch milliseconds.
/// Eleven digits start in March 1973; anything shorter is a year or a
/// compact date.
pub const MIN_EPOCH_MILLIS_DIGITS: usize = 11;

/// City label used when an address has no usable locality segment.
pub const UNKNOWN_CITY: &str = "Unknown";

// =============================================================================
// Derived listing attributes
// =============================================================================

/// Review-count thresholds for marker colours (green / orange / light gray).
/// Anything below the last threshold is drawn red.
pub const MARKER_GREEN_MIN_REVIEWS: u32 = 100;
pub const MARKER_ORANGE_MIN_REVIEWS: u32 = 50;
pub const MARKER_GRAY_MIN_REVIEWS: u32 = 25;

/// Map centre used when there are no markers to average (Bern).
pub const DEFAULT_MAP_CENTRE: (f64, f64) = (46.9480, 7.4474);

// =============================================================================
// Analysis defaults
// =============================================================================

/// Number of pharmacies in the top-performing chart.
pub const DEFAULT_TOP_PLACES: usize = 30;

/// Upper bound for the top-performing list.
pub const MAX_TOP_PLACES: usize = 200;

/// Number of terms in the frequent-words chart.
pub const DEFAULT_FREQUENT_TERMS: usize = 25;

/// Upper bound for the frequent-words list.
pub const MAX_FREQUENT_TERMS: usize = 200;

/// Minimum word length counted by the frequent-words analysis.
pub const MIN_TERM_LENGTH: usize = 3;

/// Accepted `[analysis] granularity` values.
pub const GRANULARITY_NAMES: &[&str] = &["day", "week", "month"];

/// Time-series granularity used when config and CLI are silent.
pub const DEFAULT_GRANULARITY: &str = "month";

/// Default word-count bucket width for the review-length distribution.
pub const DEFAULT_LENGTH_BUCKET_WORDS: usize = 20;

/// Valid range for the review-length bucket width.
pub const MIN_LENGTH_BUCKET_WORDS: usize = 1;
pub const MAX_LENGTH_BUCKET_WORDS: usize = 500;

/// Words ignored by the frequent-words analysis (English and German, the
/// two languages the source dataset mixes).
pub const STOP_WORDS: &[&str] = &[
    "and", "are", "but", "for", "had", "has", "have", "her", "his", "not", "our", "that", "the",
    "their", "there", "they", "this", "was", "were", "with", "you", "your", "very", "from", "all",
    "can", "der", "die", "das", "und", "ist", "ich", "nicht", "mit", "sie", "ein", "eine", "sehr",
    "auf", "für", "den", "dem", "des", "war", "auch", "wir", "hat", "man",
];

// =============================================================================
// UI defaults
// =============================================================================

/// Default body font size in points.
pub const DEFAULT_FONT_SIZE: f32 = 14.5;

/// Minimum allowed font size.
pub const MIN_FONT_SIZE: f32 = 10.0;

/// Maximum allowed font size.
pub const MAX_FONT_SIZE: f32 = 24.0;

/// Accepted `[ui] default_tab` values.
pub const TAB_NAMES: &[&str] = &["map", "list", "analysis"];

/// Tab shown on first start.
pub const DEFAULT_TAB: &str = "map";

/// Maximum number of reviews rendered inside one list-view card.
pub const MAX_REVIEWS_PER_CARD: usize = 200;

/// Maximum number of non-fatal warnings kept in the session.
pub const MAX_WARNINGS: usize = 1_000;

// =============================================================================
// Logging
// =============================================================================

/// Default log level when no override is given.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// File names
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Session persistence file name (stored in the platform data directory).
pub const SESSION_FILE_NAME: &str = "session.json";
