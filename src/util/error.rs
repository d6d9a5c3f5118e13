// PharmaLens - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation between layers; every error keeps its
// causal chain for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error for failures reported to the user as a single message:
/// startup load and config failures, reloads and exports. Filter and
/// aggregate errors stay local to the session and the KPI tiles.
#[derive(Debug)]
pub enum PharmaLensError {
    /// Dataset loading failed (fatal at startup).
    Load(LoadError),

    /// Export operation failed.
    Export(ExportError),

    /// Configuration loading failed.
    Config(ConfigError),
}

impl fmt::Display for PharmaLensError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(e) => write!(f, "Load error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for PharmaLensError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Load errors
// ---------------------------------------------------------------------------

/// Errors raised while reading and validating the two input datasets.
///
/// `origin` is the path (or label, for in-memory input) of the offending
/// source so the startup message tells the user which file to fix.
#[derive(Debug)]
pub enum LoadError {
    /// The source file is missing or unreadable.
    Io { path: PathBuf, source: io::Error },

    /// The source file exceeds the maximum accepted size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// The file extension does not name a supported record format.
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The JSON document could not be parsed at all.
    MalformedJson {
        origin: String,
        source: serde_json::Error,
    },

    /// The CSV document could not be parsed at all.
    MalformedCsv { origin: String, source: csv::Error },

    /// The document parsed, but its top-level shape is not a record
    /// collection (e.g. a bare number or string).
    UnexpectedShape { origin: String, found: &'static str },

    /// The source held no records, or none survived validation.
    EmptySource {
        origin: String,
        what: &'static str,
        rejected: usize,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Cannot read '{}': {source}", path.display())
            }
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "'{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
            Self::UnsupportedFormat { path, extension } => write!(
                f,
                "'{}': unsupported format '{extension}' (expected .json or .csv)",
                path.display()
            ),
            Self::MalformedJson { origin, source } => {
                write!(f, "'{origin}' is not valid JSON: {source}")
            }
            Self::MalformedCsv { origin, source } => {
                write!(f, "'{origin}' is not valid CSV: {source}")
            }
            Self::UnexpectedShape { origin, found } => write!(
                f,
                "'{origin}' must contain an array or object of records, found {found}"
            ),
            Self::EmptySource {
                origin,
                what,
                rejected,
            } => {
                if *rejected == 0 {
                    write!(f, "'{origin}' contains no {what} records")
                } else {
                    write!(
                        f,
                        "'{origin}' contains no valid {what} records ({rejected} rejected)"
                    )
                }
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::MalformedJson { source, .. } => Some(source),
            Self::MalformedCsv { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<LoadError> for PharmaLensError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

/// Non-fatal load diagnostic: reviews whose pharmacy reference did not
/// resolve. The affected reviews are dropped from the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrphanReferenceWarning {
    pub count: usize,
}

impl fmt::Display for OrphanReferenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} review(s) reference an unknown pharmacy and were dropped",
            self.count
        )
    }
}

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

/// Errors related to filter predicates. A rejected predicate never reaches
/// the filter engine; the session keeps its previous valid predicate.
#[derive(Debug)]
pub enum FilterError {
    /// Bounds are inverted, non-finite, or outside the rating scale.
    InvalidPredicate { reason: String },

    /// User-provided review regex is invalid.
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPredicate { reason } => write!(f, "Invalid filter: {reason}"),
            Self::InvalidRegex { pattern, source } => {
                write!(f, "Review regex '{pattern}' does not compile: {source}")
            }
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRegex { source, .. } => Some(source),
            Self::InvalidPredicate { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate errors
// ---------------------------------------------------------------------------

/// Errors from the review aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateError {
    /// The review subset is empty; mean-based figures are undefined.
    /// Rendered as a "no data" placeholder, never as a crash.
    EmptySet,
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySet => f.write_str("no data"),
        }
    }
}

impl std::error::Error for AggregateError {}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to export operations.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Cannot write list export {}: {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "Cannot encode list rows as CSV for {}: {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "Cannot encode list rows as JSON for {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<ExportError> for PharmaLensError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to an explicitly requested configuration file.
///
/// The default config location never produces these: problems there are
/// reported as warnings and defaults are used instead.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "{} is not valid TOML: {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Cannot read config file {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for PharmaLensError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_empty_source_message_mentions_rejections() {
        let none = LoadError::EmptySource {
            origin: "reviews.json".to_string(),
            what: "review",
            rejected: 0,
        };
        assert_eq!(none.to_string(), "'reviews.json' contains no review records");

        let some = LoadError::EmptySource {
            origin: "reviews.json".to_string(),
            what: "review",
            rejected: 3,
        };
        assert!(some.to_string().contains("3 rejected"));
    }

    #[test]
    fn test_io_error_chain_preserved() {
        let err: PharmaLensError = LoadError::Io {
            path: PathBuf::from("missing.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        }
        .into();
        let inner = err.source().expect("load error source");
        assert!(inner.source().is_some(), "io::Error must stay in the chain");
    }

    #[test]
    fn test_export_error_prefixed_and_chained() {
        let err: PharmaLensError = ExportError::Io {
            path: PathBuf::from("out.csv"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        assert!(err.to_string().starts_with("Export error: "));
        assert!(err.to_string().contains("out.csv"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_empty_set_renders_as_no_data() {
        assert_eq!(AggregateError::EmptySet.to_string(), "no data");
    }
}
