//! Availability calculation for a single work day.
//!
//! Takes the work window and the raw calendar events for the day, drops
//! all-day and malformed events, clamps the rest to the window and sums the
//! busy time. Overlapping events are not merged: each one contributes its
//! own clamped duration, so overlapping busy time is counted twice.

mod raw;
mod window;

pub use raw::{RawEvent, RawEventTime};
pub use window::{validate_work_hours, WorkWindow, DEFAULT_END_HOUR, DEFAULT_START_HOUR};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A timed event clamped to the work window, in the reference zone's offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl CalendarEvent {
    pub fn new(summary: impl Into<String>, start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self {
            summary: summary.into(),
            start,
            end,
        }
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

/// Result of an availability calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// Length of the work window
    pub total_minutes: u32,
    /// Sum of clamped event durations (overlaps double-counted)
    pub busy_minutes: u32,
    /// `total - busy`, floored at zero
    pub available_minutes: u32,
    /// Clamped events ordered by start time
    pub events: Vec<CalendarEvent>,
}

/// Compute busy/available minutes for `window` from `raw_events`.
///
/// Never fails: date-only events and events with unreadable timestamps are
/// skipped, and an empty list yields zero busy time.
pub fn compute_availability(window: &WorkWindow, raw_events: &[RawEvent]) -> Availability {
    let mut events: Vec<CalendarEvent> = raw_events
        .iter()
        .filter_map(|raw| clamp_event(window, raw))
        .collect();

    // Stable: events starting together keep provider order.
    events.sort_by_key(|e| e.start);

    let busy_seconds: i64 = events.iter().map(CalendarEvent::duration_seconds).sum();
    let busy_minutes = u32::try_from(busy_seconds / 60).unwrap_or(u32::MAX);
    let total_minutes = window.total_minutes();

    Availability {
        total_minutes,
        busy_minutes,
        available_minutes: total_minutes.saturating_sub(busy_minutes),
        events,
    }
}

/// Clamp one raw event to the window, or `None` if it should not count.
fn clamp_event(window: &WorkWindow, raw: &RawEvent) -> Option<CalendarEvent> {
    let tz = window.timezone();
    let summary = raw.display_summary();

    let bounds = raw
        .start
        .resolve(&tz)
        .and_then(|start| raw.end.resolve(&tz).map(|end| (start, end)));

    let (start, end) = match bounds {
        Ok((Some(start), Some(end))) => (start, end),
        Ok(_) => {
            tracing::debug!(summary, "skipping all-day event");
            return None;
        }
        Err(e) => {
            tracing::debug!(summary, error = %e, "skipping event with malformed timestamp");
            return None;
        }
    };

    let clamped_start = start.with_timezone(&tz).max(window.start());
    let clamped_end = end.with_timezone(&tz).min(window.end());
    if clamped_start >= clamped_end {
        return None;
    }

    Some(CalendarEvent::new(
        summary,
        clamped_start.fixed_offset(),
        clamped_end.fixed_offset(),
    ))
}
