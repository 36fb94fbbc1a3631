//! Command-line interface for haccplog.
//!
//! This module provides the CLI structure and output rendering for the
//! `haccplog` binary.

mod commands;
pub mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    date_or_today, new_item, CheckCommand, ConditionArg, ConfigCommand, DirectionArg,
    ExportCommand, HealthCommand, HistoryCommand, ImportCommand, ItemTypeArg, ItemsCommand,
    ShowCommand, UncheckCommand,
};

/// haccplog - Daily food-safety checklist and record log
///
/// Records the daily hygiene checklist and staff health status, and exports
/// them as a JSON backup or a spreadsheet for inspection.
#[derive(Debug, Parser)]
#[command(name = "haccplog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show a day's checklist and health record
    Show(ShowCommand),

    /// Record a checklist result
    Check(CheckCommand),

    /// Clear a checklist result
    Uncheck(UncheckCommand),

    /// Record staff health status
    Health(HealthCommand),

    /// List recorded days with their progress
    History(HistoryCommand),

    /// Manage checklist items
    #[command(subcommand)]
    Items(ItemsCommand),

    /// Export a backup or a spreadsheet
    #[command(subcommand)]
    Export(ExportCommand),

    /// Restore from a backup file
    Import(ImportCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Verbosity;
    use chrono::NaiveDate;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "haccplog");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    fn verbosity(flag: &str) -> Verbosity {
        parse(&["haccplog", flag, "show"]).verbosity()
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(parse(&["haccplog", "show"]).verbosity(), Verbosity::Normal);
        assert_eq!(verbosity("-v"), Verbosity::Verbose);
        assert_eq!(verbosity("-vv"), Verbosity::Debug);
        assert_eq!(verbosity("-vvv"), Verbosity::Trace);
        assert_eq!(verbosity("-q"), Verbosity::Quiet);
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["haccplog", "-c", "/custom/config.toml", "history"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_show() {
        let cli = parse(&["haccplog", "show", "--date", "2024-03-01", "--json"]);
        match cli.command {
            Command::Show(cmd) => {
                assert_eq!(cmd.date, NaiveDate::from_ymd_opt(2024, 3, 1));
                assert!(cmd.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_show_bad_date() {
        let args = ["haccplog", "show", "--date", "2024-13-01"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_check() {
        let cli = parse(&[
            "haccplog",
            "check",
            "c2",
            "--no",
            "--value",
            "9",
            "--comment",
            "扉",
        ]);
        match cli.command {
            Command::Check(cmd) => {
                assert_eq!(cmd.item_id, "c2");
                assert!(cmd.no);
                assert_eq!(cmd.value.as_deref(), Some("9"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_check_requires_an_entry() {
        assert!(Cli::try_parse_from(["haccplog", "check", "c1"]).is_err());
    }

    #[test]
    fn test_parse_check_yes_and_no_conflict() {
        let args = ["haccplog", "check", "c1", "--yes", "--no"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_uncheck() {
        match parse(&["haccplog", "uncheck", "c4"]).command {
            Command::Uncheck(UncheckCommand { item_id, date }) => {
                assert_eq!(item_id, "c4");
                assert!(date.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_health() {
        let cli = parse(&[
            "haccplog",
            "health",
            "--temp",
            "36.8",
            "--symptom",
            "present",
            "--wound",
            "none",
        ]);
        match cli.command {
            Command::Health(cmd) => {
                assert_eq!(cmd.temp.as_deref(), Some("36.8"));
                assert_eq!(cmd.symptom, Some(ConditionArg::Present));
                assert_eq!(cmd.wound, Some(ConditionArg::Absent));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_history_default_limit() {
        match parse(&["haccplog", "history"]).command {
            Command::History(cmd) => assert_eq!(cmd.limit, 14),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_items() {
        let cli = parse(&[
            "haccplog",
            "items",
            "add",
            "--category",
            "重要管理",
            "--text",
            "冷凍庫",
            "--type",
            "record",
            "--unit",
            "℃",
        ]);
        match cli.command {
            Command::Items(ItemsCommand::Add { item_type, unit, .. }) => {
                assert_eq!(item_type, ItemTypeArg::Record);
                assert_eq!(unit.as_deref(), Some("℃"));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        match parse(&["haccplog", "items", "move", "c3", "up"]).command {
            Command::Items(ItemsCommand::Move { id, direction }) => {
                assert_eq!(id, "c3");
                assert_eq!(direction, DirectionArg::Up);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(matches!(
            parse(&["haccplog", "items", "remove", "c3"]).command,
            Command::Items(ItemsCommand::Remove { .. })
        ));
        assert!(matches!(
            parse(&["haccplog", "items", "edit", "c3", "--text", "new"]).command,
            Command::Items(ItemsCommand::Edit { .. })
        ));
    }

    #[test]
    fn test_parse_export() {
        assert!(matches!(
            parse(&["haccplog", "export", "backup"]).command,
            Command::Export(ExportCommand::Backup { output: None })
        ));
        let cli = parse(&["haccplog", "export", "xlsx", "-o", "/tmp/r.xlsx"]);
        match cli.command {
            Command::Export(ExportCommand::Xlsx { output }) => {
                assert_eq!(output, Some(PathBuf::from("/tmp/r.xlsx")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_import() {
        let cli = parse(&["haccplog", "import", "backup.json"]);
        match cli.command {
            Command::Import(cmd) => {
                assert_eq!(cmd.file, PathBuf::from("backup.json"));
                assert!(!cmd.yes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_config() {
        let cli = parse(&["haccplog", "config", "show", "--json"]);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Show { json: true })
        ));
        assert!(matches!(
            parse(&["haccplog", "config", "path"]).command,
            Command::Config(ConfigCommand::Path)
        ));
    }
}
