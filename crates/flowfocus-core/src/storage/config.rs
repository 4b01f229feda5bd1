//! TOML-based application configuration.
//!
//! Stores:
//! - The default owner used when `--owner` is not given
//! - Working hours and the reference time zone
//! - Google Calendar endpoint settings
//!
//! Configuration is stored at `<data dir>/config.toml`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::availability::{validate_work_hours, WorkWindow, DEFAULT_END_HOUR, DEFAULT_START_HOUR};
use crate::error::{ConfigError, ValidationError};

/// Working-hours configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkdayConfig {
    /// IANA zone name, e.g. `America/Chicago`.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,
}

/// Google Calendar configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleConfig {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default)]
    pub workday: WorkdayConfig,
    #[serde(default)]
    pub google: GoogleConfig,
}

// Default functions
fn default_owner() -> String {
    "default".into()
}
fn default_timezone() -> String {
    "America/Chicago".into()
}
fn default_start_hour() -> u32 {
    DEFAULT_START_HOUR
}
fn default_end_hour() -> u32 {
    DEFAULT_END_HOUR
}
fn default_calendar_id() -> String {
    "primary".into()
}
fn default_api_base() -> String {
    "https://www.googleapis.com/calendar/v3".into()
}

impl Default for WorkdayConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            calendar_id: default_calendar_id(),
            api_base: default_api_base(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            workday: WorkdayConfig::default(),
            google: GoogleConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        if key.is_empty() {
            return Err(unknown());
        }

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => value
                    .parse::<bool>()
                    .map(serde_json::Value::Bool)
                    .map_err(|e| invalid(e.to_string()))?,
                serde_json::Value::Number(_) => value
                    .parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(invalid("cannot set a whole section".to_string()));
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit file, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default config");
            Self::default()
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory.
    ///
    /// The result must still pass [`Config::validate`]; the previous value is
    /// kept otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        *self = updated;
        Ok(())
    }

    /// Check working hours, time zone and owner.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_work_hours(self.workday.start_hour, self.workday.end_hour)?;
        self.timezone()?;
        if self.owner.trim().is_empty() {
            return Err(ValidationError::EmptyOwner);
        }
        Ok(())
    }

    /// The reference zone for "today" and working hours.
    pub fn timezone(&self) -> Result<Tz, ValidationError> {
        self.workday
            .timezone
            .parse::<Tz>()
            .map_err(|_| ValidationError::InvalidTimeZone(self.workday.timezone.clone()))
    }

    /// The working-hours window on `day` in the configured zone.
    pub fn work_window(&self, day: NaiveDate) -> Result<WorkWindow, ValidationError> {
        WorkWindow::for_day(
            self.timezone()?,
            day,
            self.workday.start_hour,
            self.workday.end_hour,
        )
    }
}
