//! Configuration management for haccplog.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::persistence::DEFAULT_STATE_KEY;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "haccplog";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "haccplog.db";

/// Characters Excel refuses in sheet names.
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `HACCPLOG_`, `__` between sections)
/// 2. TOML config file at `~/.config/haccplog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Save scheduling.
    pub persistence: PersistenceConfig,
    /// Export configuration.
    pub export: ExportConfig,
    /// Photo normalization.
    pub photo: PhotoConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/haccplog/haccplog.db`
    pub database_path: Option<PathBuf>,
    /// Key the application state is stored under.
    pub state_key: String,
    /// Upper bound on the database size in bytes.
    /// Set to 0 for unlimited.
    pub max_bytes: u64,
}

/// Save scheduling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Quiet period before a change is written, in milliseconds.
    pub debounce_ms: u64,
}

/// Export-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory exports are written to when no explicit path is given.
    /// Defaults to the current directory.
    pub output_dir: Option<PathBuf>,
    /// Worksheet name for the spreadsheet export.
    pub sheet_name: String,
}

/// Photo normalization configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoConfig {
    /// Wider photos are scaled down to this many pixels.
    pub max_width: u32,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            state_key: DEFAULT_STATE_KEY.to_string(),
            max_bytes: 0,
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            sheet_name: "衛生管理記録".to_string(),
        }
    }
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            max_width: 800,
            jpeg_quality: 70,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `HACCPLOG_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("HACCPLOG_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.state_key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "state_key must not be empty".to_string(),
            });
        }

        if self.photo.max_width == 0 {
            return Err(Error::ConfigValidation {
                message: "max_width must be greater than 0".to_string(),
            });
        }

        if !(1..=100).contains(&self.photo.jpeg_quality) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "jpeg_quality ({}) must be between 1 and 100",
                    self.photo.jpeg_quality
                ),
            });
        }

        let sheet = &self.export.sheet_name;
        if sheet.is_empty()
            || sheet.chars().count() > 31
            || sheet.contains(FORBIDDEN_SHEET_CHARS)
        {
            return Err(Error::ConfigValidation {
                message: format!(
                    "sheet_name '{sheet}' must be 1-31 characters without any of []:*?/\\"
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the export directory, defaulting to the current directory.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.export
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the save debounce window as a Duration.
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.persistence.debounce_ms)
    }
}
