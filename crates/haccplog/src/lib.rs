//! `haccplog` - A daily food-safety compliance log
//!
//! This library keeps a configurable hygiene checklist and per-day records of
//! check results and staff health, persists them through a debounced
//! key-value store, and exports them as a JSON backup or a spreadsheet.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod photo;
pub mod session;
pub mod settings;
pub mod storage;
pub mod update;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::{AppState, CheckItem, DailyCheckResult, DayRecord, HealthRecord, Records};
pub use persistence::{DebouncedSaver, Persistence, SaveOutcome};
pub use session::Session;
pub use storage::{KvStore, MemoryStore, SqliteStore};
