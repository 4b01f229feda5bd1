//! # FlowFocus Core Library
//!
//! Core logic for FlowFocus, a personal task planner that reads the day's
//! calendar and suggests what to work on next. Every operation is available
//! through the standalone `flowfocus` CLI, which is a thin layer over this
//! crate.
//!
//! ## Architecture
//!
//! - **Availability**: clamps a day's calendar events to the work window and
//!   derives busy and available minutes
//! - **Snapshot**: one stored availability record per owner and day
//! - **Selector**: pure next-task policy over tasks, snapshot and `now`
//! - **Storage**: SQLite for tasks and snapshots, TOML for configuration
//! - **Integrations**: calendar providers (Google Calendar)
//! - **Planner**: sync, daily overview and next-task operations
//!
//! ## Key Components
//!
//! - [`compute_availability`]: availability for one work window
//! - [`select_next_task`]: next-task decision
//! - [`Database`]: task and snapshot persistence
//! - [`Config`]: application configuration management
//! - [`CalendarProvider`]: trait for calendar event sources

pub mod availability;
pub mod clock;
pub mod error;
pub mod integrations;
pub mod planner;
pub mod selector;
pub mod snapshot;
pub mod storage;
pub mod task;

pub use availability::{compute_availability, Availability, CalendarEvent, RawEvent, WorkWindow};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use integrations::{CalendarProvider, GoogleCalendar};
pub use planner::{day_overview, next_task, sync_day, today, DayOverview};
pub use selector::{select_next_task, SelectionReason, TaskSelection};
pub use snapshot::DailySnapshot;
pub use storage::{Config, Database};
pub use task::{NewTask, Priority, Task, TaskPatch};
