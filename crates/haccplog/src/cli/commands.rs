//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands and the small
//! conversions from parsed arguments into domain values.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Args, Subcommand, ValueEnum};

use crate::error::{Error, Result};
use crate::model::{parse_date, CheckItem, Condition, DailyCheckResult, ItemType, Verdict};
use crate::settings::{Direction, NewItem};
use crate::update::HealthField;

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Day to show (YYYY-MM-DD, default today)
    #[arg(short, long, value_parser = date_arg)]
    pub date: Option<NaiveDate>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Check command arguments.
#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("entry")
        .required(true)
        .multiple(true)
        .args(["yes", "no", "value", "comment", "photo"])
))]
pub struct CheckCommand {
    /// Checklist item id (see `items list`)
    pub item_id: String,

    /// Mark the item as passed
    #[arg(long, conflicts_with = "no")]
    pub yes: bool,

    /// Mark the item as failed
    #[arg(long)]
    pub no: bool,

    /// Measured value for record items, e.g. a temperature
    #[arg(long)]
    pub value: Option<String>,

    /// Free-text note
    #[arg(long)]
    pub comment: Option<String>,

    /// Image file to attach
    #[arg(long, value_name = "FILE")]
    pub photo: Option<PathBuf>,

    /// Day to record on (YYYY-MM-DD, default today)
    #[arg(short, long, value_parser = date_arg)]
    pub date: Option<NaiveDate>,
}

impl CheckCommand {
    /// The verdict given on the command line, if any.
    #[must_use]
    pub fn verdict(&self) -> Option<Verdict> {
        match (self.yes, self.no) {
            (true, _) => Some(Verdict::Yes),
            (_, true) => Some(Verdict::No),
            _ => None,
        }
    }

    /// Overlay the given arguments on the existing result for `item`.
    ///
    /// Fields not given on the command line keep their previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidItem`] if a value is given for a boolean item.
    pub fn to_result(
        &self,
        item: &CheckItem,
        existing: Option<&DailyCheckResult>,
        photo: Option<String>,
    ) -> Result<DailyCheckResult> {
        if self.value.is_some() && item.item_type == ItemType::Boolean {
            return Err(Error::invalid_item(format!("{} does not take a value", item.id)));
        }

        let mut result = existing
            .cloned()
            .unwrap_or_else(|| DailyCheckResult::new(item.id.as_str()));
        if let Some(verdict) = self.verdict() {
            result.result = Some(verdict);
        }
        if let Some(value) = &self.value {
            result.value = Some(value.clone());
        }
        if let Some(comment) = &self.comment {
            result.comment = Some(comment.clone());
        }
        if photo.is_some() {
            result.photo = photo;
        }
        Ok(result)
    }
}

/// Uncheck command arguments.
#[derive(Debug, Args)]
pub struct UncheckCommand {
    /// Checklist item id
    pub item_id: String,

    /// Day to clear (YYYY-MM-DD, default today)
    #[arg(short, long, value_parser = date_arg)]
    pub date: Option<NaiveDate>,
}

/// Health command arguments.
#[derive(Debug, Args)]
pub struct HealthCommand {
    /// Staff body temperature; an empty string clears it
    #[arg(long)]
    pub temp: Option<String>,

    /// Illness symptoms
    #[arg(long, value_enum)]
    pub symptom: Option<ConditionArg>,

    /// Hand wounds
    #[arg(long, value_enum)]
    pub wound: Option<ConditionArg>,

    /// Details about symptoms or wounds; an empty string clears them
    #[arg(long)]
    pub details: Option<String>,

    /// Day to record on (YYYY-MM-DD, default today)
    #[arg(short, long, value_parser = date_arg)]
    pub date: Option<NaiveDate>,
}

impl HealthCommand {
    /// The field edits requested, in a fixed order.
    #[must_use]
    pub fn fields(&self) -> Vec<HealthField> {
        let mut fields = Vec::new();
        if let Some(temp) = &self.temp {
            fields.push(HealthField::Temp(temp.clone()));
        }
        if let Some(symptom) = self.symptom {
            fields.push(HealthField::Symptom(symptom.into()));
        }
        if let Some(wound) = self.wound {
            fields.push(HealthField::Wound(wound.into()));
        }
        if let Some(details) = &self.details {
            let details = Some(details.clone()).filter(|d| !d.is_empty());
            fields.push(HealthField::Details(details));
        }
        fields
    }
}

/// History command arguments.
#[derive(Debug, Args)]
pub struct HistoryCommand {
    /// Maximum number of days to list
    #[arg(short, long, default_value = "14")]
    pub limit: usize,
}

/// Checklist item management.
#[derive(Debug, Subcommand)]
pub enum ItemsCommand {
    /// List items in display order
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add an item at the end of the checklist
    Add {
        /// Grouping label
        #[arg(long)]
        category: String,

        /// Prompt text
        #[arg(long)]
        text: String,

        /// Item type
        #[arg(long = "type", value_enum, default_value = "boolean")]
        item_type: ItemTypeArg,

        /// Unit for record items, e.g. ℃
        #[arg(long)]
        unit: Option<String>,
    },

    /// Change an item's prompt text
    Edit {
        /// Item id
        id: String,

        /// New prompt text
        #[arg(long)]
        text: String,
    },

    /// Delete an item (recorded results are kept)
    Remove {
        /// Item id
        id: String,
    },

    /// Move an item within its category
    Move {
        /// Item id
        id: String,

        /// Direction to move
        #[arg(value_enum)]
        direction: DirectionArg,
    },
}

/// Export commands.
#[derive(Debug, Subcommand)]
pub enum ExportCommand {
    /// Write a full JSON backup
    Backup {
        /// Output file (default: haccp_backup_<date>.json in the export directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Write the records as a spreadsheet
    Xlsx {
        /// Output file (default: haccp_records_<date>.xlsx in the export directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// Backup file to restore
    pub file: PathBuf,

    /// Replace all current data; without this the file is only checked
    #[arg(short, long)]
    pub yes: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Presence of a health condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConditionArg {
    /// なし
    #[value(name = "none")]
    Absent,
    /// あり
    Present,
}

impl From<ConditionArg> for Condition {
    fn from(arg: ConditionArg) -> Self {
        match arg {
            ConditionArg::Absent => Self::Absent,
            ConditionArg::Present => Self::Present,
        }
    }
}

/// Item type for new items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ItemTypeArg {
    /// Pass/fail only
    Boolean,
    /// Pass/fail plus a measured value
    Record,
}

impl From<ItemTypeArg> for ItemType {
    fn from(arg: ItemTypeArg) -> Self {
        match arg {
            ItemTypeArg::Boolean => Self::Boolean,
            ItemTypeArg::Record => Self::Record,
        }
    }
}

/// Direction for `items move`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    /// Towards the start of the category
    Up,
    /// Towards the end of the category
    Down,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Up => Self::Up,
            DirectionArg::Down => Self::Down,
        }
    }
}

/// Build a [`NewItem`] from `items add` arguments.
#[must_use]
pub fn new_item(category: &str, text: &str, kind: ItemTypeArg, unit: Option<&str>) -> NewItem {
    NewItem {
        category: category.to_string(),
        text: text.to_string(),
        item_type: kind.into(),
        unit: unit.map(ToString::to_string),
    }
}

/// The given date, or today in local time.
#[must_use]
pub fn date_or_today(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

fn date_arg(input: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(input).map_err(|e| e.to_string())
}
