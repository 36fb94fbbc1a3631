//! Spreadsheet writer for the tabular projection.
//!
//! Only compiled with the `xlsx` feature. Without it every call fails with
//! [`Error::ExportUnavailable`] so a caller never ends up with a half-written
//! file.

use std::path::Path;

#[cfg(feature = "xlsx")]
use tracing::info;

use super::table::Table;
use crate::error::{Error, Result};

/// Whether this build can write spreadsheets.
#[must_use]
pub fn is_available() -> bool {
    cfg!(feature = "xlsx")
}

/// Write `table` to `path` as a single-sheet workbook.
///
/// # Errors
///
/// Returns [`Error::ExportUnavailable`] when built without the `xlsx`
/// feature, or [`Error::Spreadsheet`] if the workbook cannot be written.
#[cfg(feature = "xlsx")]
pub fn write_xlsx(table: &Table, path: &Path, sheet_name: &str) -> Result<()> {
    use rust_xlsxwriter::{Format, Workbook};

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name)?;

    for (col, title) in table.header.iter().enumerate() {
        let col = column_index(col)?;
        sheet.write_string_with_format(0, col, title.as_str(), &header_format)?;
        sheet.set_column_width(col, if col == 0 { 12 } else { 18 })?;
    }

    for (index, row) in table.rows.iter().enumerate() {
        let row_index = u32::try_from(index + 1)
            .map_err(|_| Error::Spreadsheet("too many rows for one sheet".to_string()))?;
        for (col, cell) in row.iter().enumerate() {
            if !cell.is_empty() {
                sheet.write_string(row_index, column_index(col)?, cell.as_str())?;
            }
        }
    }
    sheet.set_freeze_panes(1, 1)?;

    workbook.save(path)?;
    info!(
        rows = table.rows.len(),
        columns = table.width(),
        "Wrote spreadsheet to {}",
        path.display()
    );
    Ok(())
}

/// Write `table` to `path` as a single-sheet workbook.
///
/// # Errors
///
/// Always returns [`Error::ExportUnavailable`]: this build has no
/// spreadsheet writer.
#[cfg(not(feature = "xlsx"))]
pub fn write_xlsx(_table: &Table, _path: &Path, _sheet_name: &str) -> Result<()> {
    Err(Error::ExportUnavailable)
}

#[cfg(feature = "xlsx")]
fn column_index(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| Error::Spreadsheet("sheet has too many columns".to_string()))
}

#[cfg(all(test, feature = "xlsx"))]
mod tests {
    use super::*;
    use crate::export::table::build_table;
    use crate::model::AppState;

    #[test]
    fn test_is_available() {
        assert!(is_available());
    }

    #[test]
    fn test_write_xlsx_creates_zip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.xlsx");

        write_xlsx(&build_table(&AppState::default()), &path, "衛生管理記録").unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_write_xlsx_rejects_bad_sheet_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.xlsx");

        let err = write_xlsx(&build_table(&AppState::default()), &path, "bad[name]").unwrap_err();
        assert!(matches!(err, Error::Spreadsheet(_)));
        assert!(!path.exists());
    }
}
