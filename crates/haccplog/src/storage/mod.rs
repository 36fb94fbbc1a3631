//! Storage layer for haccplog.
//!
//! The application only ever needs one durable slot, so storage is modelled
//! as a tiny key-value interface. [`SqliteStore`] is the on-disk backend;
//! [`MemoryStore`] keeps everything in process and is what tests use.

pub mod memory;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use memory::MemoryStore;

/// A durable string slot addressed by key.
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageFull`] when the backend is out of space, or
    /// another error if the write fails for any other reason.
    fn put(&self, key: &str, value: &str) -> Result<()>;
}

/// `SQLite`-backed key-value store.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        schema::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        schema::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Cap the database size at roughly `max_bytes`.
    ///
    /// `SQLite` never shrinks the cap below the pages already in use, so a
    /// tiny value means "no further growth". Zero leaves the store unbounded.
    ///
    /// # Errors
    ///
    /// Returns an error if the pragma cannot be applied.
    pub fn with_max_bytes(self, max_bytes: u64) -> Result<Self> {
        if max_bytes == 0 {
            return Ok(self);
        }
        {
            let conn = self.lock()?;
            let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;
            let page_size = u64::try_from(page_size).unwrap_or(4096).max(1);
            let pages = (max_bytes / page_size).max(1);
            let applied: i64 = conn.query_row(
                &format!("PRAGMA max_page_count = {pages}"),
                [],
                |row| row.get(0),
            )?;
            debug!(max_bytes, applied_pages = applied, "storage quota applied");
        }
        Ok(self)
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("database connection lock poisoned"))
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |r| r.get(0))
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        let result = conn.execute(
            r"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value, Utc::now().to_rfc3339()],
        );

        match result {
            Ok(_) => {
                debug!(key, bytes = value.len(), "stored value");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::DiskFull => {
                Err(Error::StorageFull { bytes: value.len() })
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("failed to create test store")
    }

    #[test]
    fn test_open_in_memory() {
        let store = create_test_store();
        assert_eq!(store.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_get_missing() {
        let store = create_test_store();
        assert!(store.get("nothing").unwrap().is_none());
    }

    #[test]
    fn test_put_and_get() {
        let store = create_test_store();
        store.put("state", r#"{"config":[]}"#).unwrap();
        assert_eq!(
            store.get("state").unwrap().as_deref(),
            Some(r#"{"config":[]}"#)
        );
    }

    #[test]
    fn test_put_overwrites() {
        let store = create_test_store();
        store.put("state", "one").unwrap();
        store.put("state", "two").unwrap();
        assert_eq!(store.get("state").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_keys_are_independent() {
        let store = create_test_store();
        store.put("a", "1").unwrap();
        store.put("b", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_unicode_value() {
        let store = create_test_store();
        store.put("state", "冷蔵庫の温度 ℃").unwrap();
        assert_eq!(
            store.get("state").unwrap().as_deref(),
            Some("冷蔵庫の温度 ℃")
        );
    }

    #[test]
    fn test_quota_exceeded_is_storage_full() {
        let store = create_test_store().with_max_bytes(1).unwrap();
        let large = "x".repeat(256 * 1024);

        let err = store.put("state", &large).unwrap_err();
        assert!(err.is_storage_full(), "unexpected error: {err}");
        assert!(matches!(err, Error::StorageFull { bytes } if bytes == large.len()));
    }

    #[test]
    fn test_zero_quota_is_unbounded() {
        let store = create_test_store().with_max_bytes(0).unwrap();
        let large = "x".repeat(256 * 1024);
        store.put("state", &large).unwrap();
        assert_eq!(
            store.get("state").unwrap().map(|v| v.len()),
            Some(large.len())
        );
    }

    #[test]
    fn test_open_file_based_persists() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("haccplog.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store.put("state", "persisted").unwrap();
            assert_eq!(store.path(), db_path);
        }

        let reopened = SqliteStore::open(&db_path).unwrap();
        assert_eq!(reopened.get("state").unwrap().as_deref(), Some("persisted"));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested/deeper/haccplog.db");

        let _store = SqliteStore::open(&nested).unwrap();
        assert!(nested.exists());
    }
}
