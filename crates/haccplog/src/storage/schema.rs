//! `SQLite` schema definitions for haccplog.
//!
//! The database is a plain key-value container: the application state is a
//! single JSON document stored under one key.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};

/// SQL statement to create the key-value table.
pub const CREATE_KV_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_KV_TABLE, CREATE_METADATA_TABLE];

/// Layout version recorded in the metadata table.
pub const SCHEMA_VERSION: i32 = 1;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// Create the tables if needed and stamp the layout version.
///
/// A database written by a newer layout is refused rather than reinterpreted.
///
/// # Errors
///
/// Returns an error if a statement fails or the stored version is unusable.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match stored {
        None => {
            conn.execute(
                "INSERT INTO metadata (key, value) VALUES (?1, ?2)",
                (VERSION_KEY, SCHEMA_VERSION.to_string()),
            )?;
            Ok(())
        }
        Some(value) => match value.parse::<i32>() {
            Ok(version) if version <= SCHEMA_VERSION => Ok(()),
            Ok(version) => Err(Error::DatabaseMigration {
                message: format!(
                    "database layout {version} is newer than supported {SCHEMA_VERSION}"
                ),
            }),
            Err(_) => Err(Error::DatabaseMigration {
                message: format!("invalid schema version: {value}"),
            }),
        },
    }
}
