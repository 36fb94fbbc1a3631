//! Error types for haccplog.
//!
//! Every fallible operation in the crate returns [`Result`]. The variants are
//! grouped by the boundary that produces them so callers can turn each one
//! into a user-facing notification without inspecting messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for haccplog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// The store refused a write because it ran out of space.
    #[error("storage capacity exceeded ({bytes} bytes rejected); free up space and try again")]
    StorageFull {
        /// Size of the payload that was rejected.
        bytes: usize,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Checklist Errors ===
    /// No check item with the given id is configured.
    #[error("unknown check item: {id}")]
    UnknownItem {
        /// The id that was looked up.
        id: String,
    },

    /// A check item definition was rejected.
    #[error("invalid check item: {message}")]
    InvalidItem {
        /// Why the item was rejected.
        message: String,
    },

    /// A date argument could not be parsed.
    #[error("invalid date '{input}', expected YYYY-MM-DD")]
    InvalidDate {
        /// The text that failed to parse.
        input: String,
    },

    // === Backup / Export Errors ===
    /// The backup file could not be read as JSON.
    #[error("failed to read backup file: {0}")]
    BackupRead(#[source] serde_json::Error),

    /// The backup file is JSON but not a valid snapshot.
    #[error("invalid backup format: {reason}")]
    InvalidBackup {
        /// What is missing or malformed.
        reason: String,
    },

    /// Spreadsheet support was not compiled into this build.
    #[error("export library unavailable: rebuild with the `xlsx` feature to write spreadsheets")]
    ExportUnavailable,

    /// The spreadsheet writer failed.
    #[error("spreadsheet export failed: {0}")]
    Spreadsheet(String),

    // === Photo Errors ===
    /// The input could not be decoded as an image.
    #[error("unreadable image: {reason}")]
    UnreadableImage {
        /// Decoder message.
        reason: String,
    },

    /// The normalized image could not be encoded.
    #[error("failed to encode image: {0}")]
    ImageEncode(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for haccplog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

#[cfg(feature = "xlsx")]
impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Spreadsheet(err.to_string())
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an invalid backup error.
    #[must_use]
    pub fn invalid_backup(reason: impl Into<String>) -> Self {
        Self::InvalidBackup {
            reason: reason.into(),
        }
    }

    /// Create an invalid item error.
    #[must_use]
    pub fn invalid_item(message: impl Into<String>) -> Self {
        Self::InvalidItem {
            message: message.into(),
        }
    }

    /// Create an unknown item error.
    #[must_use]
    pub fn unknown_item(id: impl Into<String>) -> Self {
        Self::UnknownItem { id: id.into() }
    }

    /// Check if this error means the store is out of space.
    #[must_use]
    pub fn is_storage_full(&self) -> bool {
        matches!(self, Self::StorageFull { .. })
    }

    /// Whether the user can fix the cause and retry the same action.
    ///
    /// None of these leave the in-memory state partially mutated.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::StorageFull { .. }
                | Self::BackupRead(_)
                | Self::InvalidBackup { .. }
                | Self::UnreadableImage { .. }
                | Self::ExportUnavailable
                | Self::UnknownItem { .. }
                | Self::InvalidItem { .. }
                | Self::InvalidDate { .. }
        )
    }

    /// A one-line notification suitable for showing to the person using the log.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::StorageFull { .. } => {
                "Storage is full. Export a backup and delete old photos or records, then try again."
                    .to_string()
            }
            Self::BackupRead(_) => "The backup file could not be read.".to_string(),
            Self::InvalidBackup { .. } => {
                "The file is not a valid backup. Nothing was changed.".to_string()
            }
            Self::UnreadableImage { .. } => {
                "The photo could not be read and was not attached.".to_string()
            }
            Self::ExportUnavailable => {
                "Spreadsheet export is not available in this build.".to_string()
            }
            other => other.to_string(),
        }
    }
}
