//! Day planning operations.
//!
//! Glue between the calendar provider, storage and the pure selector:
//! syncing a day's availability, summarizing it against open tasks, and
//! picking the next task.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::availability::compute_availability;
use crate::clock::Clock;
use crate::error::{CoreError, Result};
use crate::integrations::CalendarProvider;
use crate::selector::{select_next_task, TaskSelection};
use crate::snapshot::DailySnapshot;
use crate::storage::{Config, Database};

/// A synced day compared against the owner's open work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayOverview {
    #[serde(flatten)]
    pub snapshot: DailySnapshot,
    /// Sum of incomplete task durations
    pub total_task_minutes: u32,
    /// `total_task_minutes > available_minutes`
    pub capacity_exceeded: bool,
}

/// Current date in the configured reference zone.
pub fn today(config: &Config, clock: &dyn Clock) -> Result<NaiveDate> {
    let tz = config.timezone()?;
    Ok(clock.now().with_timezone(&tz).date_naive())
}

/// Fetch `day`'s events, compute availability and store the snapshot.
///
/// A provider failure leaves any existing snapshot for the day untouched.
pub async fn sync_day(
    provider: &dyn CalendarProvider,
    db: &Database,
    config: &Config,
    owner: &str,
    day: NaiveDate,
    clock: &dyn Clock,
) -> Result<DailySnapshot> {
    let window = config.work_window(day)?;
    let raw_events = provider.fetch_events(&window).await.map_err(|e| {
        tracing::warn!(provider = provider.name(), %owner, %day, error = %e, "calendar fetch failed");
        e
    })?;

    let availability = compute_availability(&window, &raw_events);
    let snapshot = DailySnapshot::from_availability(owner, day, availability, clock.now());
    let stored = db.upsert_snapshot(&snapshot)?;

    tracing::info!(
        %owner,
        %day,
        fetched = raw_events.len(),
        kept = stored.events.len(),
        available_minutes = stored.available_minutes,
        "synced day"
    );
    Ok(stored)
}

/// The stored snapshot for `day` plus task load.
///
/// # Errors
/// Returns `SnapshotNotFound` if the day has not been synced.
pub fn day_overview(db: &Database, owner: &str, day: NaiveDate) -> Result<DayOverview> {
    let snapshot = db
        .get_snapshot(owner, day)?
        .ok_or_else(|| CoreError::SnapshotNotFound {
            owner: owner.to_string(),
            date: day,
        })?;
    let total_task_minutes = db.total_task_minutes(owner)?;

    Ok(DayOverview {
        capacity_exceeded: total_task_minutes > snapshot.available_minutes,
        total_task_minutes,
        snapshot,
    })
}

/// Select the next task using `day`'s snapshot when one exists.
pub fn next_task(db: &Database, owner: &str, day: NaiveDate, clock: &dyn Clock) -> Result<TaskSelection> {
    let tasks = db.list_incomplete_tasks(owner)?;
    let snapshot = db.get_snapshot(owner, day)?;
    Ok(select_next_task(&tasks, snapshot.as_ref(), clock.now()))
}
