// PharmaLens - util/logging.rs
//
// tracing-subscriber setup. The level comes from, in order: RUST_LOG,
// the --debug flag, `[logging] level` in config.toml, then "info".
// Output goes to stderr, or to `[logging] file` when it can be opened.
// Review text and contact numbers are never logged at any level.

use crate::util::constants;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn level_filter(debug_flag: bool, config_level: Option<&str>) -> EnvFilter {
    if std::env::var_os("RUST_LOG").is_some() {
        return EnvFilter::from_default_env();
    }
    let level = match (debug_flag, config_level) {
        (true, _) => "debug",
        (false, Some(level)) => level,
        (false, None) => constants::DEFAULT_LOG_LEVEL,
    };
    EnvFilter::new(level)
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(debug_flag: bool, config_level: Option<&str>, log_file: Option<&Path>) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(level_filter(debug_flag, config_level))
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .compact();

    let opened = log_file.map(|path| {
        (
            path,
            OpenOptions::new().create(true).append(true).open(path),
        )
    });

    match opened {
        Some((_, Ok(file))) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        Some((path, Err(e))) => {
            builder.init();
            tracing::warn!(path = %path.display(), error = %e, "Cannot open log file; logging to stderr");
        }
        None => builder.init(),
    }

    tracing::debug!(
        app = constants::APP_NAME,
        version = constants::APP_VERSION,
        "Logging initialised"
    );
}
