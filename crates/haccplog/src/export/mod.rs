//! Backup and report export.
//!
//! - [`backup`]: lossless JSON snapshot and its importer.
//! - [`table`]: lossy tabular projection for reports.
//! - [`xlsx`]: spreadsheet writer for the projection.

pub mod backup;
pub mod table;
pub mod xlsx;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::error::{Error, Result};
use crate::model::AppState;

pub use backup::{backup_file_name, export_backup, import_backup};
pub use table::{build_table, format_cell, Table};

/// File name for a spreadsheet exported on `date`.
#[must_use]
pub fn spreadsheet_file_name(date: NaiveDate) -> String {
    format!("haccp_records_{}.xlsx", date.format("%Y-%m-%d"))
}

/// Write a backup of `state` to `path`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_backup_file(state: &AppState, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let text = export_backup(state)?;
    std::fs::write(path, text)?;
    info!(
        records = state.records.len(),
        "Wrote backup to {}",
        path.display()
    );
    Ok(())
}

/// Read and validate a backup file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read, otherwise the errors of
/// [`import_backup`].
pub fn read_backup_file(path: &Path) -> Result<AppState> {
    let text = std::fs::read_to_string(path)?;
    import_backup(&text)
}

/// Write the spreadsheet report for `state` to `path`.
///
/// Fails with [`Error::ExportUnavailable`] before touching the filesystem
/// when this build has no spreadsheet writer.
///
/// # Errors
///
/// Returns an error if the writer is missing or the workbook cannot be written.
pub fn write_spreadsheet_file(state: &AppState, path: &Path, sheet_name: &str) -> Result<()> {
    if !xlsx::is_available() {
        return Err(Error::ExportUnavailable);
    }
    ensure_parent(path)?;
    xlsx::write_xlsx(&build_table(state), path, sheet_name)
}

/// Resolve the output path for an export: an explicit path wins, otherwise
/// `file_name` inside `dir`.
#[must_use]
pub fn output_path(explicit: Option<PathBuf>, dir: &Path, file_name: &str) -> PathBuf {
    explicit.unwrap_or_else(|| dir.join(file_name))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spreadsheet_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(spreadsheet_file_name(date), "haccp_records_2024-12-31.xlsx");
    }

    #[test]
    fn test_output_path() {
        let dir = Path::new("/exports");
        assert_eq!(
            output_path(None, dir, "a.json"),
            PathBuf::from("/exports/a.json")
        );
        assert_eq!(
            output_path(Some(PathBuf::from("/tmp/b.json")), dir, "a.json"),
            PathBuf::from("/tmp/b.json")
        );
    }

    #[test]
    fn test_backup_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("backup.json");
        let state = AppState::default();

        write_backup_file(&state, &path).unwrap();
        assert_eq!(read_backup_file(&path).unwrap(), state);
    }

    #[test]
    fn test_read_missing_backup_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_backup_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn test_write_spreadsheet_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.xlsx");

        write_spreadsheet_file(&AppState::default(), &path, "衛生管理記録").unwrap();
        assert!(path.exists());
    }

    #[cfg(not(feature = "xlsx"))]
    #[test]
    fn test_write_spreadsheet_file_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.xlsx");

        let err = write_spreadsheet_file(&AppState::default(), &path, "sheet").unwrap_err();
        assert!(matches!(err, Error::ExportUnavailable));
        assert!(!dir.path().join("out").exists());
    }
}
