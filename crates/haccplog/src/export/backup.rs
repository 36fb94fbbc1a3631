//! Full-fidelity JSON backup.
//!
//! The backup file has exactly the persisted shape,
//! `{ "config": [...], "records": { "<date>": {...} } }`, so exporting and
//! importing reproduces the state including photos and display order.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::AppState;
use crate::settings::validate_config;

/// Top-level fields every backup must carry.
const REQUIRED_FIELDS: [&str; 2] = ["config", "records"];

/// Serialize the whole state as a pretty-printed backup document.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn export_backup(state: &AppState) -> Result<String> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// Parse a backup document into a new state.
///
/// The caller's current state is never touched; it is up to the caller to
/// replace it with the returned value.
///
/// # Errors
///
/// - [`Error::BackupRead`] if `text` is not JSON at all.
/// - [`Error::InvalidBackup`] if a required field is missing, has the wrong
///   shape, an item id is duplicated, or a record is filed under another date.
pub fn import_backup(text: &str) -> Result<AppState> {
    let value: Value = serde_json::from_str(text).map_err(Error::BackupRead)?;

    let Some(object) = value.as_object() else {
        return Err(Error::invalid_backup("top level is not an object"));
    };
    for field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            return Err(Error::invalid_backup(format!("missing `{field}`")));
        }
    }

    let state: AppState =
        serde_json::from_value(value).map_err(|e| Error::invalid_backup(e.to_string()))?;

    validate_config(&state.config).map_err(|e| Error::invalid_backup(e.to_string()))?;
    if let Some((key, record)) = state.records.iter().find(|(key, r)| **key != r.date) {
        return Err(Error::invalid_backup(format!(
            "record filed under {key} is dated {}",
            record.date
        )));
    }

    debug!(
        items = state.config.len(),
        records = state.records.len(),
        "Parsed backup"
    );
    Ok(state)
}

/// File name for a backup taken on `date`.
#[must_use]
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("haccp_backup_{}.json", date.format("%Y-%m-%d"))
}
