//! Configuration file support for courtsync
//!
//! Reads from .courtsync/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Where the store lives
    #[serde(default)]
    pub store: StoreConfig,

    /// Where raw tables come from
    #[serde(default)]
    pub source: SourceConfig,

    /// Pauses between external fetches
    #[serde(default)]
    pub pacing: PacingConfig,
}

/// Store locations
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StoreConfig {
    /// Gzip-compressed store that gets published.
    /// Default: "docs/assets/courtsync.db.gz"
    #[serde(default = "default_archive_path")]
    pub archive_path: PathBuf,

    /// Uncompressed working copy. Unset means `.courtsync/courtsync.db`,
    /// found by walking up from the current directory.
    #[serde(default)]
    pub working_path: Option<PathBuf>,
}

fn default_archive_path() -> PathBuf {
    PathBuf::from("docs/assets/courtsync.db.gz")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            archive_path: default_archive_path(),
            working_path: None,
        }
    }
}

/// Scraper output location
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SourceConfig {
    /// Directory of JSON dumps
    /// Default: "scraped"
    #[serde(default = "default_dump_dir")]
    pub dump_dir: PathBuf,
}

fn default_dump_dir() -> PathBuf {
    PathBuf::from("scraped")
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            dump_dir: default_dump_dir(),
        }
    }
}

/// Pauses in milliseconds
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PacingConfig {
    /// After every per-game fetch. Default: 3000
    #[serde(default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,

    /// After a game commits. Default: 100
    #[serde(default = "default_success_delay_ms")]
    pub success_delay_ms: u64,

    /// After a game fails. Default: 5000
    #[serde(default = "default_failure_backoff_ms")]
    pub failure_backoff_ms: u64,
}

fn default_fetch_delay_ms() -> u64 {
    3000
}

fn default_success_delay_ms() -> u64 {
    100
}

fn default_failure_backoff_ms() -> u64 {
    5000
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            fetch_delay_ms: default_fetch_delay_ms(),
            success_delay_ms: default_success_delay_ms(),
            failure_backoff_ms: default_failure_backoff_ms(),
        }
    }
}

impl Config {
    /// Load config from .courtsync/config.toml
    /// Returns default config if file doesn't exist
    pub fn load() -> Self {
        match Self::find_config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load a specific file; unreadable or invalid files fall back to defaults
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config unreadable, using defaults");
                return Self::default();
            }
        };
        match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config invalid, using defaults");
                Self::default()
            }
        }
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(".courtsync").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }

    /// Working store path: COURTSYNC_DB_PATH, then `[store] working_path`,
    /// then the walk-up default
    pub fn working_path(&self) -> PathBuf {
        if std::env::var_os("COURTSYNC_DB_PATH").is_some() {
            return crate::db::Database::db_path();
        }
        self.store
            .working_path
            .clone()
            .unwrap_or_else(crate::db::Database::db_path)
    }
}
