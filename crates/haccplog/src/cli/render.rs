//! Plain-text rendering for command output.

use std::fmt::Write as _;

use crate::config::Config;
use crate::model::{AppState, CheckItem, DailyCheckResult, DayRecord, Verdict};
use crate::settings::{categories, sorted_items};
use crate::update::progress;

/// A day's checklist grouped by category, followed by the health record.
#[must_use]
pub fn render_day(state: &AppState, record: &DayRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}  progress {}%",
        record.date.format("%Y-%m-%d"),
        progress(&state.config, record)
    );

    let items = sorted_items(&state.config);
    for category in categories(&state.config) {
        let _ = writeln!(out, "\n{category}");
        for item in items.iter().filter(|item| item.category == category) {
            let _ = writeln!(out, "  {}", render_check_line(item, record.check(&item.id)));
        }
    }

    let health = &record.health;
    let temp = if health.has_temp() {
        format!("{}℃", health.temp)
    } else {
        "-".to_string()
    };
    let _ = writeln!(out, "\nStaff health");
    let _ = writeln!(out, "  temperature: {temp}");
    let _ = writeln!(out, "  symptoms:    {}", health.symptom);
    let _ = writeln!(out, "  wounds:      {}", health.wound);
    if let Some(details) = &health.details {
        let _ = writeln!(out, "  details:     {details}");
    } else if health.needs_details() {
        let _ = writeln!(out, "  details:     (missing)");
    }
    out
}

/// One checklist line: mark, id, text, then any value, comment or photo.
#[must_use]
pub fn render_check_line(item: &CheckItem, result: Option<&DailyCheckResult>) -> String {
    let mark = match result.and_then(|r| r.result) {
        Some(Verdict::Yes) => "[良]",
        Some(Verdict::No) => "[否]",
        None => "[  ]",
    };
    let mut line = format!("{mark} {:<14} {}", item.id, item.text);

    if let Some(result) = result {
        if let Some(value) = result.value.as_deref().filter(|v| !v.is_empty()) {
            let unit = item.unit.as_deref().unwrap_or_default();
            let _ = write!(line, "  = {value}{unit}");
        }
        if let Some(comment) = result.comment.as_deref().filter(|c| !c.is_empty()) {
            let _ = write!(line, "  # {comment}");
        }
        if result.photo.is_some() {
            line.push_str("  (photo)");
        }
    }
    line
}

/// Saved days, newest first, with their progress.
#[must_use]
pub fn render_history(state: &AppState, limit: usize) -> String {
    if state.records.is_empty() {
        return "No records yet.\n".to_string();
    }

    let mut out = String::new();
    for record in state.records.values().rev().take(limit) {
        let _ = writeln!(
            out,
            "{}  {:>3}%  temp {}",
            record.date.format("%Y-%m-%d"),
            progress(&state.config, record),
            if record.health.has_temp() {
                record.health.temp.as_str()
            } else {
                "-"
            }
        );
    }
    out
}

/// The checklist in display order.
#[must_use]
pub fn render_items(config: &[CheckItem]) -> String {
    let mut out = String::new();
    for item in sorted_items(config) {
        let unit = item
            .unit
            .as_deref()
            .map(|u| format!(" ({u})"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:>4}  {:<14} {:<8} {}{unit}",
            item.display_order,
            item.id,
            item.item_type,
            item.label()
        );
    }
    out
}

/// Summary of a validated backup.
#[must_use]
pub fn render_backup_summary(state: &AppState) -> String {
    let range = match (state.records.keys().next(), state.records.keys().next_back()) {
        (Some(first), Some(last)) => format!(", {first} to {last}"),
        _ => String::new(),
    };
    format!(
        "{} checklist items, {} day records{range}",
        state.config.len(),
        state.records.len()
    )
}

/// Human-readable configuration listing.
#[must_use]
pub fn render_config(config: &Config) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Current Configuration");
    let _ = writeln!(out, "=====================");
    let _ = writeln!(out, "\n[Storage]");
    let database = config.database_path();
    let _ = writeln!(out, "  Database path:  {}", database.display());
    let _ = writeln!(out, "  State key:      {}", config.storage.state_key);
    let max = if config.storage.max_bytes == 0 {
        "unlimited".to_string()
    } else {
        config.storage.max_bytes.to_string()
    };
    let _ = writeln!(out, "  Max bytes:      {max}");
    let _ = writeln!(out, "\n[Persistence]");
    let _ = writeln!(out, "  Debounce (ms):  {}", config.persistence.debounce_ms);
    let _ = writeln!(out, "\n[Export]");
    let _ = writeln!(out, "  Output dir:     {}", config.output_dir().display());
    let _ = writeln!(out, "  Sheet name:     {}", config.export.sheet_name);
    let _ = writeln!(out, "\n[Photo]");
    let _ = writeln!(out, "  Max width:      {}", config.photo.max_width);
    let _ = writeln!(out, "  JPEG quality:   {}", config.photo.jpeg_quality);
    out
}
