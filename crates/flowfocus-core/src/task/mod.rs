//! Task types: the unit of work the selector chooses between.
//!
//! Tasks are owned by exactly one user and carry a fixed duration estimate
//! plus a three-level priority.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Default estimate for new tasks, in minutes.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Task priority.
///
/// `Unranked` is never accepted from user input. It only appears when a
/// stored or serialized value carries an unrecognised name, and it sorts
/// after every named priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
    #[serde(other)]
    Unranked,
}

impl Priority {
    /// Sort rank: 1 = most urgent.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
            Priority::Unranked => 4,
        }
    }

    /// Name used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::Unranked => "Unranked",
        }
    }

    /// Lenient decoding for persisted rows: unknown names demote to `Unranked`.
    pub fn from_stored(s: &str) -> Self {
        s.parse().unwrap_or(Priority::Unranked)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(ValidationError::InvalidPriority(s.to_string())),
        }
    }
}

/// A user's task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Owning user
    pub owner: String,
    pub title: String,
    pub description: Option<String>,
    /// Estimated effort, always positive
    pub duration_minutes: u32,
    pub priority: Priority,
    pub completed: bool,
    /// Set when the task is completed, cleared when it is reopened
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a task from validated input.
    pub fn new(owner: &str, draft: NewTask, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        draft.validate()?;
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner: owner.to_string(),
            title: draft.title.trim().to_string(),
            description: draft.description,
            duration_minutes: draft.duration_minutes,
            priority: draft.priority,
            completed: false,
            completed_at: None,
            created_at: now,
        })
    }

    /// Mark complete or incomplete, keeping `completed_at` consistent.
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        self.completed = completed;
        self.completed_at = if completed { Some(now) } else { None };
    }

    /// Apply a partial update in place.
    ///
    /// Validation happens before any field is touched, so a rejected patch
    /// leaves the task unchanged.
    pub fn apply(&mut self, patch: TaskPatch, now: DateTime<Utc>) -> Result<(), ValidationError> {
        patch.validate()?;

        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(duration) = patch.duration_minutes {
            self.duration_minutes = duration;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(completed) = patch.completed {
            self.set_completed(completed, now);
        }
        Ok(())
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub priority: Priority,
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_MINUTES
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            priority: Priority::default(),
        }
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_duration(self.duration_minutes)?;
        validate_priority(self.priority)
    }
}

/// Partial update for an existing task. `None` leaves the field alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<u32>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(duration) = self.duration_minutes {
            validate_duration(duration)?;
        }
        if let Some(priority) = self.priority {
            validate_priority(priority)?;
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}

fn validate_duration(minutes: u32) -> Result<(), ValidationError> {
    if minutes == 0 {
        return Err(ValidationError::InvalidDuration(0));
    }
    Ok(())
}

fn validate_priority(priority: Priority) -> Result<(), ValidationError> {
    if priority == Priority::Unranked {
        return Err(ValidationError::InvalidPriority(priority.to_string()));
    }
    Ok(())
}
