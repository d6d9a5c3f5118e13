// PharmaLens - app/dataset.rs
//
// Dataset loading orchestration: resolve the two source paths, read both
// files in parallel, hand the content to the core loader and report what
// was dropped.

use crate::core::loader::{self, RecordFormat, RecordInput};
use crate::core::model::DataSet;
use crate::platform::config::AppConfig;
use crate::platform::fs;
use crate::util::constants;
use crate::util::error::LoadError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Locations of the pharmacy and review sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPaths {
    pub pharmacies: PathBuf,
    pub reviews: PathBuf,
}

impl DataPaths {
    /// Resolve source paths. Priority: CLI argument > config `[data]` >
    /// default file name in the current directory.
    pub fn resolve(
        cli_pharmacies: Option<PathBuf>,
        cli_reviews: Option<PathBuf>,
        config: &AppConfig,
    ) -> Self {
        Self {
            pharmacies: cli_pharmacies
                .or_else(|| config.pharmacies_path.clone())
                .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_PHARMACIES_FILE)),
            reviews: cli_reviews
                .or_else(|| config.reviews_path.clone())
                .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_REVIEWS_FILE)),
        }
    }
}

fn read_input(path: &Path) -> Result<RecordInput, LoadError> {
    let format = RecordFormat::from_path(path)?;
    let content = fs::read_dataset_file(path)?;
    Ok(RecordInput {
        origin: path.display().to_string(),
        format,
        content,
    })
}

/// Read and validate both sources.
///
/// The two files are read concurrently; parsing runs afterwards on the
/// calling thread. Orphan reviews are logged and counted, never fatal.
pub fn load_from_paths(paths: &DataPaths) -> Result<DataSet, LoadError> {
    tracing::info!(
        pharmacies = %paths.pharmacies.display(),
        reviews = %paths.reviews.display(),
        "Loading dataset"
    );

    let (pharmacies, reviews) = rayon::join(
        || read_input(&paths.pharmacies),
        || read_input(&paths.reviews),
    );
    let data = loader::load_dataset(&pharmacies?, &reviews?)?;

    if let Some(warning) = loader::orphan_warning(&data.report) {
        tracing::warn!(count = warning.count, "{warning}");
    }
    if data.report.rejected_pharmacies + data.report.rejected_reviews > 0 {
        tracing::warn!(
            pharmacies = data.report.rejected_pharmacies,
            reviews = data.report.rejected_reviews,
            "Quarantined records that failed validation"
        );
    }
    Ok(data)
}

/// Human-readable lines describing what the loader dropped.
pub fn report_lines(data: &DataSet) -> Vec<String> {
    let report = &data.report;
    let mut lines = Vec::new();
    if let Some(warning) = loader::orphan_warning(report) {
        lines.push(warning.to_string());
    }
    if report.rejected_pharmacies > 0 {
        lines.push(format!(
            "{} pharmacy record(s) failed validation and were skipped",
            report.rejected_pharmacies
        ));
    }
    if report.duplicate_pharmacies > 0 {
        lines.push(format!(
            "{} pharmacy record(s) repeated an earlier id and were skipped",
            report.duplicate_pharmacies
        ));
    }
    if report.rejected_reviews > 0 {
        lines.push(format!(
            "{} review record(s) failed validation and were skipped",
            report.rejected_reviews
        ));
    }
    lines
}
