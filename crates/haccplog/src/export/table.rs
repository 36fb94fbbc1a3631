//! Tabular projection of the day records.
//!
//! This is a human-readable report, not a backup: photos and raw timestamps
//! are dropped, and an empty value or comment is indistinguishable from one
//! that was never entered.

use chrono::Local;

use crate::model::{AppState, CheckItem, DailyCheckResult, DayRecord, ItemType, Verdict};
use crate::settings::sorted_items;

/// Fixed leading columns: date, the three health fields, details, last updated.
pub const FIXED_HEADERS: [&str; 6] = [
    "日付",
    "スタッフ体温",
    "スタッフ症状",
    "スタッフ傷",
    "スタッフ備考",
    "最終更新",
];

/// Cell text for a passed check.
pub const PASS_MARK: &str = "良";

/// Cell text for a failed check.
pub const FAIL_MARK: &str = "否";

/// A header row plus data rows, every row the same width as the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Column titles.
    pub header: Vec<String>,
    /// One row per day record, newest first.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Index of the column titled `title`.
    #[must_use]
    pub fn column(&self, title: &str) -> Option<usize> {
        self.header.iter().position(|h| h == title)
    }
}

/// Project every day record into a row.
#[must_use]
pub fn build_table(state: &AppState) -> Table {
    let items = sorted_items(&state.config);

    let header = FIXED_HEADERS
        .iter()
        .map(ToString::to_string)
        .chain(items.iter().map(|item| item.label()))
        .collect();

    let rows = state
        .records
        .values()
        .rev()
        .map(|record| build_row(record, &items))
        .collect();

    Table { header, rows }
}

fn build_row(record: &DayRecord, items: &[&CheckItem]) -> Vec<String> {
    let health = &record.health;
    let mut row = vec![
        record.date.format("%Y-%m-%d").to_string(),
        health.temp.clone(),
        health.symptom.label().to_string(),
        health.wound.label().to_string(),
        health.details.clone().unwrap_or_default(),
        record
            .last_updated
            .with_timezone(&Local)
            .format("%Y/%m/%d %H:%M:%S")
            .to_string(),
    ];
    for item in items {
        row.push(format_cell(item, record.check(&item.id)));
    }
    row
}

/// Render one check result for `item`.
///
/// `良`/`否`/empty for the judgement, then ` (value+unit)` for record items
/// with a value, then ` [メモ: comment]` when a comment is present.
#[must_use]
pub fn format_cell(item: &CheckItem, result: Option<&DailyCheckResult>) -> String {
    let Some(result) = result else {
        return String::new();
    };

    let mut cell = match result.result {
        Some(Verdict::Yes) => PASS_MARK.to_string(),
        Some(Verdict::No) => FAIL_MARK.to_string(),
        None => String::new(),
    };

    if item.item_type == ItemType::Record {
        if let Some(value) = result.value.as_deref().filter(|v| !v.is_empty()) {
            let unit = item.unit.as_deref().unwrap_or_default();
            cell.push_str(&format!(" ({value}{unit})"));
        }
    }
    if let Some(comment) = result.comment.as_deref().filter(|c| !c.is_empty()) {
        cell.push_str(&format!(" [メモ: {comment}]"));
    }
    cell
}
