//! Core data model for haccplog.
//!
//! The whole persisted unit is an [`AppState`]: the checklist configuration
//! plus a date-keyed map of [`DayRecord`]s. Field names serialize in
//! camelCase so the persisted JSON and the backup file share one shape.

pub mod seed;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Whether a check item is a plain judgement or a judgement plus a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// Yes/no judgement only.
    Boolean,
    /// Yes/no judgement with a recorded value (usually a temperature).
    Record,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Boolean => "boolean",
            Self::Record => "record",
        })
    }
}

/// A configured inspection point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckItem {
    /// Stable unique identifier.
    pub id: String,
    /// Grouping label.
    pub category: String,
    /// The prompt shown for this item.
    pub text: String,
    /// Fixed at creation.
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// Unit appended to recorded values; only meaningful for [`ItemType::Record`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Sort key within the configuration; need not be contiguous.
    pub display_order: i64,
}

impl CheckItem {
    /// Create a new item definition.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        text: impl Into<String>,
        item_type: ItemType,
        display_order: i64,
    ) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            text: text.into(),
            item_type,
            unit: None,
            display_order,
        }
    }

    /// Attach a unit to the item.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Whether results for this item carry a measured value.
    #[must_use]
    pub fn is_record(&self) -> bool {
        self.item_type == ItemType::Record
    }

    /// Column label used by the tabular export: `[category] text`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("[{}] {}", self.category, self.text)
    }
}

/// The outcome of a single judgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// The check passed.
    #[serde(rename = "YES")]
    Yes,
    /// The check failed.
    #[serde(rename = "NO")]
    No,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "YES"),
            Self::No => write!(f, "NO"),
        }
    }
}

/// Outcome for one check item on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCheckResult {
    /// The [`CheckItem::id`] this result answers.
    pub item_id: String,
    /// `None` means the item has not been answered yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Verdict>,
    /// Measured value as typed, only used for record items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Free-text note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Embedded image payload, opaque to the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl DailyCheckResult {
    /// Create an unanswered result for the given item.
    #[must_use]
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            result: None,
            value: None,
            comment: None,
            photo: None,
        }
    }

    /// Set the judgement.
    #[must_use]
    pub fn with_result(mut self, verdict: Verdict) -> Self {
        self.result = Some(verdict);
        self
    }

    /// Set the recorded value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Set the photo payload.
    #[must_use]
    pub fn with_photo(mut self, photo: impl Into<String>) -> Self {
        self.photo = Some(photo.into());
        self
    }

    /// Whether a judgement has been recorded.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.result.is_some()
    }
}

/// Two-valued health observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Condition {
    /// Nothing observed.
    #[default]
    #[serde(rename = "なし")]
    Absent,
    /// Observed; details are expected in [`HealthRecord::details`].
    #[serde(rename = "あり")]
    Present,
}

impl Condition {
    /// The label stored in files and shown in reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Absent => "なし",
            Self::Present => "あり",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Staff health status for one day.
///
/// `temp` stays a plain string: an empty string is how "not measured" has
/// always been stored, and backups from older versions rely on it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Body temperature as typed; empty when not recorded.
    #[serde(default)]
    pub temp: String,
    /// Illness symptoms.
    pub symptom: Condition,
    /// Hand wounds.
    pub wound: Condition,
    /// Free text, expected when either condition is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HealthRecord {
    /// Whether the temperature has been entered.
    #[must_use]
    pub fn has_temp(&self) -> bool {
        !self.temp.is_empty()
    }

    /// Whether any condition is present.
    #[must_use]
    pub fn needs_details(&self) -> bool {
        self.symptom == Condition::Present || self.wound == Condition::Present
    }
}

/// All compliance data for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    /// The date this record covers.
    pub date: NaiveDate,
    /// At most one entry per item id.
    pub checks: Vec<DailyCheckResult>,
    /// Staff health status.
    pub health: HealthRecord,
    /// Refreshed on every mutation.
    pub last_updated: DateTime<Utc>,
}

impl DayRecord {
    /// Create an empty record for `date`, stamped with `now`.
    #[must_use]
    pub fn new(date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            date,
            checks: Vec::new(),
            health: HealthRecord::default(),
            last_updated: now,
        }
    }

    /// Look up the result for an item.
    #[must_use]
    pub fn check(&self, item_id: &str) -> Option<&DailyCheckResult> {
        self.checks.iter().find(|c| c.item_id == item_id)
    }
}

/// Date-keyed day records, kept in date order.
pub type Records = BTreeMap<NaiveDate, DayRecord>;

/// The single persisted root: checklist configuration plus all day records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    /// Ordered checklist definitions.
    pub config: Vec<CheckItem>,
    /// Day records by date.
    pub records: Records,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            config: seed::default_items(),
            records: Records::new(),
        }
    }
}

impl AppState {
    /// Create a state from parts.
    #[must_use]
    pub fn new(config: Vec<CheckItem>, records: Records) -> Self {
        Self { config, records }
    }

    /// Find a configured item by id.
    #[must_use]
    pub fn item(&self, id: &str) -> Option<&CheckItem> {
        self.config.iter().find(|item| item.id == id)
    }

    /// Find a configured item by id, failing with [`Error::UnknownItem`].
    ///
    /// # Errors
    ///
    /// Returns an error if no item has the given id.
    pub fn require_item(&self, id: &str) -> Result<&CheckItem> {
        self.item(id).ok_or_else(|| Error::unknown_item(id))
    }

    /// The record for `date`, if one has been saved.
    #[must_use]
    pub fn record(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.records.get(&date)
    }
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`Error::InvalidDate`] if the input is not a valid calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidDate {
        input: input.to_string(),
    })
}
