// PharmaLens - app/session.rs
//
// Persists the dashboard view between runs: active tab, filter, chart
// granularity, list order and the dataset paths. Records themselves are
// never stored; they are re-read from the source files on start.

use crate::app::dataset::DataPaths;
use crate::app::state::Tab;
use crate::core::aggregate::Granularity;
use crate::core::filter::FilterPredicate;
use crate::core::views::ListSort;
use crate::util::constants::SESSION_FILE_NAME;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Bumped whenever `SessionData` changes incompatibly.
pub const SESSION_VERSION: u32 = 1;

/// What is written to `session.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Schema version; must equal `SESSION_VERSION` to be accepted.
    pub version: u32,

    #[serde(default)]
    pub active_tab: Tab,

    /// Last valid filter predicate.
    #[serde(default)]
    pub filter: FilterPredicate,

    #[serde(default)]
    pub granularity: Granularity,

    #[serde(default)]
    pub list_sort: ListSort,

    /// Dataset sources of the last session. Used only when neither the
    /// CLI nor config.toml names them.
    #[serde(default)]
    pub data_paths: Option<DataPaths>,
}

/// `session.json` inside the platform data directory.
pub fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SESSION_FILE_NAME)
}

/// Write `data` to `path` through a sibling temp file and a rename, so a
/// failed save leaves the previous session intact.
///
/// Callers log the returned message and carry on.
pub fn save(data: &SessionData, path: &Path) -> Result<(), String> {
    let json =
        serde_json::to_vec_pretty(data).map_err(|e| format!("cannot encode session: {e}"))?;
    let staging = path.with_extension("json.tmp");

    let write = || -> io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let mut file = File::create(&staging)?;
        file.write_all(&json)?;
        file.sync_all()?;
        std::fs::rename(&staging, path)
    };

    if let Err(e) = write() {
        let _ = std::fs::remove_file(&staging);
        return Err(format!("cannot write session file '{}': {e}", path.display()));
    }

    tracing::debug!(path = %path.display(), bytes = json.len(), "Session saved");
    Ok(())
}

/// Read the session at `path`. Any failure, including a file written by a
/// different `SESSION_VERSION`, yields `None`.
pub fn load(path: &Path) -> Option<SessionData> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Session file unreadable");
            return None;
        }
    };

    match serde_json::from_str::<SessionData>(&content) {
        Ok(data) if data.version == SESSION_VERSION => {
            tracing::info!(path = %path.display(), tab = ?data.active_tab, "Session restored");
            Some(data)
        }
        Ok(data) => {
            tracing::warn!(
                found = data.version,
                expected = SESSION_VERSION,
                "Ignoring session from another version"
            );
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed session file");
            None
        }
    }
}
