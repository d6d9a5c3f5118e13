// PharmaLens - platform/fs.rs
//
// Dataset file access: size guard plus lossy text decoding.

use crate::util::constants;
use crate::util::error::LoadError;
use std::path::Path;

/// Read a dataset file into a string.
///
/// Files above `MAX_DATASET_FILE_SIZE` are refused before reading. Invalid
/// UTF-8 is replaced rather than rejected and a leading byte-order mark
/// (common in spreadsheet CSV exports) is stripped.
pub fn read_dataset_file(path: &Path) -> Result<String, LoadError> {
    read_with_limit(path, constants::MAX_DATASET_FILE_SIZE)
}

fn read_with_limit(path: &Path, max_size: u64) -> Result<String, LoadError> {
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let size = std::fs::metadata(path).map_err(io_err)?.len();
    if size > max_size {
        return Err(LoadError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            max_size,
        });
    }

    let bytes = std::fs::read(path).map_err(io_err)?;
    let text = String::from_utf8_lossy(&bytes);
    tracing::debug!(path = %path.display(), bytes = size, "Read dataset file");
    Ok(text
        .strip_prefix('\u{feff}')
        .map(str::to_string)
        .unwrap_or_else(|| text.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_and_strips_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.csv");
        std::fs::write(&path, "\u{feff}id,name\n1,A\n").unwrap();
        assert_eq!(read_dataset_file(&path).unwrap(), "id,name\n1,A\n");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_dataset_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.json");
        std::fs::write(&path, "[1, 2, 3, 4, 5]").unwrap();
        let err = read_with_limit(&path, 4).unwrap_err();
        assert!(matches!(err, LoadError::FileTooLarge { max_size: 4, .. }));
    }
}
