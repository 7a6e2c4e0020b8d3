//! Configuration loading
//!
//! Loads database connection configuration from environment variables,
//! optionally reading from a .env file first.

use crate::prelude::SqlmintError;
use rusqlite::{Connection, OpenFlags};
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, error, info, trace, warn};

/// Database connection configuration
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
    pub read_only: bool,
}

impl DbConfig {
    /// Configuration for a database file with default settings
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: 5000,
            read_only: false,
        }
    }

    /// Load configuration from environment variables
    ///
    /// Expected variables:
    /// - DB_PATH (required)
    /// - DB_BUSY_TIMEOUT_MS (default: 5000)
    /// - DB_READ_ONLY (default: false)
    pub fn from_env() -> Result<Self, SqlmintError> {
        debug!("Loading database configuration from environment");

        let path = env::var("DB_PATH").map_err(|_| {
            error!("DB_PATH environment variable is not set");
            SqlmintError::Config("DB_PATH environment variable is required".to_string())
        })?;

        let timeout_str = env::var("DB_BUSY_TIMEOUT_MS").unwrap_or_else(|_| {
            trace!("DB_BUSY_TIMEOUT_MS not set, using default");
            "5000".to_string()
        });

        let busy_timeout_ms = timeout_str.parse::<u64>().map_err(|e| {
            error!(timeout = ?timeout_str, error = ?e, "Invalid DB_BUSY_TIMEOUT_MS value");
            SqlmintError::Config("DB_BUSY_TIMEOUT_MS must be a number of milliseconds".to_string())
        })?;

        let read_only = match env::var("DB_READ_ONLY") {
            Ok(value) => parse_flag(&value).ok_or_else(|| {
                error!(value = ?value, "Invalid DB_READ_ONLY value");
                SqlmintError::Config("DB_READ_ONLY must be one of true, false, 1, 0".to_string())
            })?,
            Err(_) => {
                trace!("DB_READ_ONLY not set, using default");
                false
            }
        };

        debug!(path = ?path, busy_timeout_ms = ?busy_timeout_ms, read_only = ?read_only, "Configuration loaded");

        Ok(Self {
            path: PathBuf::from(path),
            busy_timeout_ms,
            read_only,
        })
    }

    /// Load a .env file and then read configuration from environment
    pub fn load(env_file: &Path) -> Result<Self, SqlmintError> {
        if env_file.exists() {
            debug!(path = ?env_file, "Loading environment file");
            dotenvy::from_path(env_file).map_err(|e| {
                error!(path = ?env_file, error = ?e, "Failed to load environment file");
                SqlmintError::Config(format!("Failed to load {}: {}", env_file.display(), e))
            })?;
        } else {
            warn!(path = ?env_file, "Environment file not found, using existing environment");
        }

        Self::from_env()
    }

    /// Open flags derived from the configuration
    pub fn open_flags(&self) -> OpenFlags {
        let base = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if self.read_only {
            base | OpenFlags::SQLITE_OPEN_READ_ONLY
        } else {
            base | OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
        }
    }

    /// Open a connection using this configuration
    pub fn open(&self) -> Result<Connection, SqlmintError> {
        info!(path = ?self.path, read_only = ?self.read_only, "Opening SQLite database");

        let conn = Connection::open_with_flags(&self.path, self.open_flags()).map_err(|e| {
            error!(path = ?self.path, error = ?e, "Failed to open database");
            SqlmintError::Connection {
                path: self.path.clone(),
                source: e,
            }
        })?;

        conn.busy_timeout(Duration::from_millis(self.busy_timeout_ms))
            .map_err(|e| SqlmintError::Connection {
                path: self.path.clone(),
                source: e,
            })?;

        Ok(conn)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
