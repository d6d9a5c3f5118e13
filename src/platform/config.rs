// PharmaLens - platform/config.rs
//
// Platform-specific configuration, data directory resolution, and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for PharmaLens configuration and session data.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/pharmalens/ or %APPDATA%\PharmaLens\config\)
    pub config_dir: PathBuf,

    /// Data directory for the saved session.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
                data_dir: PathBuf::from("."),
            }
        }
    }

    /// Location of config.toml inside the config directory.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored so a newer config file still works
/// with an older binary.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub data: DataSection,
    pub analysis: AnalysisSection,
    pub ui: UiSection,
    pub logging: LoggingSection,
}

/// `[data]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// Pharmacy dataset path (.json or .csv).
    pub pharmacies: Option<String>,
    /// Review dataset path (.json or .csv).
    pub reviews: Option<String>,
}

/// `[analysis]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    /// Time-series bucket: "day", "week" or "month".
    pub granularity: Option<String>,
    /// Rows in the top-performing table.
    pub top_places: Option<usize>,
    /// Terms in the frequent-words chart.
    pub frequent_terms: Option<usize>,
    /// Word-count bucket width of the review-length chart.
    pub length_bucket_words: Option<usize>,
}

/// `[ui]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct UiSection {
    /// Theme: "dark" or "light".
    pub theme: Option<String>,
    /// Body font size in points.
    pub font_size: Option<f32>,
    /// Tab shown on first start: "map", "list" or "analysis".
    pub default_tab: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Log file path (empty = stderr only).
    pub file: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to the
/// defaults in `util::constants`.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    // -- Data --
    pub pharmacies_path: Option<PathBuf>,
    pub reviews_path: Option<PathBuf>,

    // -- Analysis --
    /// One of `constants::GRANULARITY_NAMES`.
    pub granularity: String,
    pub top_places: usize,
    pub frequent_terms: usize,
    pub length_bucket_words: usize,

    // -- UI --
    /// Dark mode (true) or light mode (false).
    pub dark_mode: bool,
    /// Body font size in points.
    pub font_size: f32,
    /// One of `constants::TAB_NAMES`.
    pub default_tab: String,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    /// Log file path.
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pharmacies_path: None,
            reviews_path: None,
            granularity: constants::DEFAULT_GRANULARITY.to_string(),
            top_places: constants::DEFAULT_TOP_PLACES,
            frequent_terms: constants::DEFAULT_FREQUENT_TERMS,
            length_bucket_words: constants::DEFAULT_LENGTH_BUCKET_WORDS,
            dark_mode: true,
            font_size: constants::DEFAULT_FONT_SIZE,
            default_tab: constants::DEFAULT_TAB.to_string(),
            log_level: None,
            log_file: None,
        }
    }
}

/// Load and validate `config.toml` from the platform config directory.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// A missing file yields defaults with no warnings (first run). An
/// unreadable or unparseable file yields defaults plus a warning so the
/// application still starts.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<String>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    match load_config_file(&config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            (AppConfig::default(), vec![msg])
        }
    }
}

/// Load and validate a config file the user named explicitly (`--config`).
///
/// Unlike [`load_config`], a missing or unparseable file is an error.
pub fn load_config_file(path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let raw: RawConfig = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(path = %path.display(), "Loaded config.toml");
    Ok(validate(raw))
}

fn non_empty_path(value: &Option<String>) -> Option<PathBuf> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Validate each field against named constants, accumulating all warnings.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let mut config = AppConfig::default();

    // -- Data --
    config.pharmacies_path = non_empty_path(&raw.data.pharmacies);
    config.reviews_path = non_empty_path(&raw.data.reviews);

    // -- Analysis: granularity --
    if let Some(ref g) = raw.analysis.granularity {
        let lower = g.to_lowercase();
        if constants::GRANULARITY_NAMES.contains(&lower.as_str()) {
            config.granularity = lower;
        } else {
            warnings.push(format!(
                "[analysis] granularity = \"{g}\" is not recognised. \
                 Valid values: {}. Using default ({}).",
                constants::GRANULARITY_NAMES.join(", "),
                constants::DEFAULT_GRANULARITY,
            ));
        }
    }

    // -- Analysis: top_places --
    if let Some(n) = raw.analysis.top_places {
        if (1..=constants::MAX_TOP_PLACES).contains(&n) {
            config.top_places = n;
        } else {
            warnings.push(format!(
                "[analysis] top_places = {n} is out of range (1-{}). Using default ({}).",
                constants::MAX_TOP_PLACES,
                constants::DEFAULT_TOP_PLACES,
            ));
        }
    }

    // -- Analysis: frequent_terms --
    if let Some(n) = raw.analysis.frequent_terms {
        if (1..=constants::MAX_FREQUENT_TERMS).contains(&n) {
            config.frequent_terms = n;
        } else {
            warnings.push(format!(
                "[analysis] frequent_terms = {n} is out of range (1-{}). Using default ({}).",
                constants::MAX_FREQUENT_TERMS,
                constants::DEFAULT_FREQUENT_TERMS,
            ));
        }
    }

    // -- Analysis: length_bucket_words --
    if let Some(n) = raw.analysis.length_bucket_words {
        if (constants::MIN_LENGTH_BUCKET_WORDS..=constants::MAX_LENGTH_BUCKET_WORDS).contains(&n) {
            config.length_bucket_words = n;
        } else {
            warnings.push(format!(
                "[analysis] length_bucket_words = {n} is out of range ({}-{}). Using default ({}).",
                constants::MIN_LENGTH_BUCKET_WORDS,
                constants::MAX_LENGTH_BUCKET_WORDS,
                constants::DEFAULT_LENGTH_BUCKET_WORDS,
            ));
        }
    }

    // -- UI: theme --
    if let Some(ref theme) = raw.ui.theme {
        match theme.to_lowercase().as_str() {
            "dark" => config.dark_mode = true,
            "light" => config.dark_mode = false,
            other => {
                warnings.push(format!(
                    "[ui] theme = \"{other}\" is not recognised. Expected \"dark\" or \"light\". Using default (dark).",
                ));
            }
        }
    }

    // -- UI: font_size --
    if let Some(size) = raw.ui.font_size {
        if (constants::MIN_FONT_SIZE..=constants::MAX_FONT_SIZE).contains(&size) {
            config.font_size = size;
        } else {
            warnings.push(format!(
                "[ui] font_size = {size} is out of range ({}-{}). Using default ({}).",
                constants::MIN_FONT_SIZE,
                constants::MAX_FONT_SIZE,
                constants::DEFAULT_FONT_SIZE,
            ));
        }
    }

    // -- UI: default_tab --
    if let Some(ref tab) = raw.ui.default_tab {
        let lower = tab.to_lowercase();
        if constants::TAB_NAMES.contains(&lower.as_str()) {
            config.default_tab = lower;
        } else {
            warnings.push(format!(
                "[ui] default_tab = \"{tab}\" is not recognised. \
                 Valid values: {}. Using default ({}).",
                constants::TAB_NAMES.join(", "),
                constants::DEFAULT_TAB,
            ));
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default ({}).",
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    // -- Logging: file --
    config.log_file = non_empty_path(&raw.logging.file);

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> (AppConfig, Vec<String>) {
        validate(toml::from_str(toml_src).unwrap())
    }

    #[test]
    fn test_empty_config_is_default() {
        let (config, warnings) = parse("");
        assert_eq!(config, AppConfig::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_valid_values_applied() {
        let (config, warnings) = parse(
            r#"
            [data]
            pharmacies = "data/pharmacies.csv"
            reviews = ""

            [analysis]
            granularity = "Week"
            top_places = 10
            length_bucket_words = 5

            [ui]
            theme = "light"
            default_tab = "analysis"

            [logging]
            level = "debug"

            [future_section]
            anything = 1
            "#,
        );
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.pharmacies_path, Some(PathBuf::from("data/pharmacies.csv")));
        assert_eq!(config.reviews_path, None);
        assert_eq!(config.granularity, "week");
        assert_eq!(config.top_places, 10);
        assert_eq!(config.length_bucket_words, 5);
        assert!(!config.dark_mode);
        assert_eq!(config.default_tab, "analysis");
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_invalid_values_warn_and_fall_back() {
        let (config, warnings) = parse(
            r#"
            [analysis]
            granularity = "hourly"
            top_places = 0
            frequent_terms = 10000

            [ui]
            theme = "neon"
            font_size = 99.0
            "#,
        );
        assert_eq!(warnings.len(), 5);
        assert_eq!(config.granularity, constants::DEFAULT_GRANULARITY);
        assert_eq!(config.top_places, constants::DEFAULT_TOP_PLACES);
        assert_eq!(config.frequent_terms, constants::DEFAULT_FREQUENT_TERMS);
        assert!(config.dark_mode);
        assert_eq!(config.font_size, constants::DEFAULT_FONT_SIZE);
    }

    #[test]
    fn test_missing_default_file_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = load_config(dir.path());
        assert_eq!(config, AppConfig::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_broken_default_file_warns() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(constants::CONFIG_FILE_NAME), "[ui\ntheme=").unwrap();
        let (config, warnings) = load_config(dir.path());
        assert_eq!(config, AppConfig::default());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_explicit_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            load_config_file(&missing),
            Err(ConfigError::Io { .. })
        ));

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "top_places = [").unwrap();
        assert!(matches!(
            load_config_file(&broken),
            Err(ConfigError::TomlParse { .. })
        ));
    }
}
