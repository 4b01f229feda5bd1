//! Core error types for flowfocus-core.
//!
//! This module defines the error hierarchy using thiserror. Situations the
//! selector treats as normal outcomes ("nothing fits", "no tasks") are not
//! errors and never appear here.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Core error type for flowfocus-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Calendar provider errors
    #[error("Integration error for '{service}': {message}")]
    Integration {
        service: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No task with this id for the owner
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// No snapshot has been synced for the owner and day
    #[error("No sync data for {owner} on {date}. Please sync first.")]
    SnapshotNotFound { owner: String, date: NaiveDate },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Build an integration error without an underlying source.
    pub fn integration(service: &str, message: impl Into<String>) -> Self {
        CoreError::Integration {
            service: service.to_string(),
            message: message.into(),
            source: None,
        }
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Title missing or blank
    #[error("Title is required")]
    EmptyTitle,

    /// Owner missing or blank
    #[error("Owner is required")]
    EmptyOwner,

    /// Non-positive duration
    #[error("Invalid duration: {0} minutes (must be positive)")]
    InvalidDuration(i64),

    /// Unrecognised priority name
    #[error("Invalid priority '{0}' (expected High, Medium or Low)")]
    InvalidPriority(String),

    /// Work hours outside 0-23 or not ordered
    #[error("Invalid work hours {start}-{end}: {message}")]
    InvalidWorkHours { start: u32, end: u32, message: String },

    /// Unknown IANA time zone name
    #[error("Unknown time zone: {0}")]
    InvalidTimeZone(String),

    /// Timestamp could not be parsed
    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked
                    || inner.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        CoreError::Integration {
            service: "google".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<keyring::Error> for CoreError {
    fn from(err: keyring::Error) -> Self {
        CoreError::Integration {
            service: "keyring".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_not_found_message_prompts_sync() {
        let err = CoreError::SnapshotNotFound {
            owner: "alice".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "No sync data for alice on 2026-03-02. Please sync first."
        );
    }

    #[test]
    fn locked_sqlite_maps_to_locked() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(matches!(DatabaseError::from(err), DatabaseError::Locked));
    }
}
