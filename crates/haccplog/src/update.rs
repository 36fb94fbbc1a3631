//! Pure merge functions over day records.
//!
//! Nothing in here mutates its input. Each function takes the current value by
//! reference and returns a new one, so a caller holding the old record keeps a
//! consistent snapshot.

use chrono::{NaiveDate, Utc};
use tracing::trace;

use crate::model::{CheckItem, Condition, DailyCheckResult, DayRecord, Records};

/// A single health field replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthField {
    /// Body temperature as typed. An empty string clears it.
    Temp(String),
    /// Illness symptoms.
    Symptom(Condition),
    /// Hand wounds.
    Wound(Condition),
    /// Free-text details.
    Details(Option<String>),
}

/// The saved record for `date`, or a fresh default one.
///
/// The default is not inserted into `records`; it only becomes persistent
/// once an edit is applied and the caller stores it with [`upsert_record`].
#[must_use]
pub fn get_or_create(date: NaiveDate, records: &Records) -> DayRecord {
    records
        .get(&date)
        .cloned()
        .unwrap_or_else(|| DayRecord::new(date, Utc::now()))
}

/// Replace the result for `result.item_id`, leaving every other entry alone.
#[must_use]
pub fn apply_check_result(record: &DayRecord, result: DailyCheckResult) -> DayRecord {
    trace!(date = %record.date, item = %result.item_id, "applying check result");

    let mut checks: Vec<DailyCheckResult> = record
        .checks
        .iter()
        .filter(|c| c.item_id != result.item_id)
        .cloned()
        .collect();
    checks.push(result);

    DayRecord {
        date: record.date,
        checks,
        health: record.health.clone(),
        last_updated: Utc::now(),
    }
}

/// Remove the result for `item_id`, returning the item to "unanswered".
#[must_use]
pub fn clear_check_result(record: &DayRecord, item_id: &str) -> DayRecord {
    DayRecord {
        date: record.date,
        checks: record
            .checks
            .iter()
            .filter(|c| c.item_id != item_id)
            .cloned()
            .collect(),
        health: record.health.clone(),
        last_updated: Utc::now(),
    }
}

/// Replace one health field; checks are carried over unchanged.
#[must_use]
pub fn apply_health_field(record: &DayRecord, field: HealthField) -> DayRecord {
    trace!(date = %record.date, ?field, "applying health field");

    let mut health = record.health.clone();
    match field {
        HealthField::Temp(temp) => health.temp = temp,
        HealthField::Symptom(symptom) => health.symptom = symptom,
        HealthField::Wound(wound) => health.wound = wound,
        HealthField::Details(details) => health.details = details,
    }

    DayRecord {
        date: record.date,
        checks: record.checks.clone(),
        health,
        last_updated: Utc::now(),
    }
}

/// Store `record` under its date in a copy of `records`.
#[must_use]
pub fn upsert_record(records: &Records, record: DayRecord) -> Records {
    let mut next = records.clone();
    next.insert(record.date, record);
    next
}

/// Percentage of configured items that have a judgement, rounded.
///
/// Results for items that are no longer configured do not count. An empty
/// configuration yields 0.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress(config: &[CheckItem], record: &DayRecord) -> u8 {
    if config.is_empty() {
        return 0;
    }

    let answered = config
        .iter()
        .filter_map(|item| record.check(&item.id))
        .filter(|check| check.is_answered())
        .count();

    let ratio = answered as f64 / config.len() as f64;
    (ratio * 100.0).round() as u8
}
