//! Per-owner, per-day record of synced calendar availability.
//!
//! At most one snapshot exists for an (owner, date) pair; re-syncing the
//! same day overwrites it (see `Database::upsert_snapshot`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::availability::{Availability, CalendarEvent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub owner: String,
    pub date: NaiveDate,
    /// Work-window length
    pub total_minutes: u32,
    /// Always within `[0, total_minutes]`
    pub available_minutes: u32,
    /// Clamped events ordered by start time
    pub events: Vec<CalendarEvent>,
    pub synced_at: DateTime<Utc>,
}

impl DailySnapshot {
    pub fn new(
        owner: &str,
        date: NaiveDate,
        total_minutes: u32,
        available_minutes: u32,
        mut events: Vec<CalendarEvent>,
        synced_at: DateTime<Utc>,
    ) -> Self {
        events.sort_by_key(|e| e.start);
        Self {
            owner: owner.to_string(),
            date,
            total_minutes,
            available_minutes: available_minutes.min(total_minutes),
            events,
            synced_at,
        }
    }

    pub fn from_availability(
        owner: &str,
        date: NaiveDate,
        availability: Availability,
        synced_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            owner,
            date,
            availability.total_minutes,
            availability.available_minutes,
            availability.events,
            synced_at,
        )
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}

/// Stored shape of an event: timestamps kept as text so a bad row can be
/// skipped without losing the rest of the list.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEvent {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
}

/// Serialize an event list as `[{summary, start, end}]` with RFC 3339 offsets.
pub fn encode_events(events: &[CalendarEvent]) -> Result<String, serde_json::Error> {
    let stored: Vec<StoredEvent> = events
        .iter()
        .map(|e| StoredEvent {
            summary: Some(e.summary.clone()),
            start: Some(e.start.to_rfc3339()),
            end: Some(e.end.to_rfc3339()),
        })
        .collect();
    serde_json::to_string(&stored)
}

/// Decode a stored event list, skipping entries whose timestamps do not parse.
pub fn decode_events(json: &str) -> Vec<CalendarEvent> {
    if json.trim().is_empty() {
        return Vec::new();
    }

    let stored: Vec<StoredEvent> = match serde_json::from_str(json) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "undecodable stored event list; treating as empty");
            return Vec::new();
        }
    };

    let mut events: Vec<CalendarEvent> = stored
        .into_iter()
        .filter_map(|s| {
            let start = DateTime::parse_from_rfc3339(s.start.as_deref()?).ok();
            let end = DateTime::parse_from_rfc3339(s.end.as_deref()?).ok();
            match (start, end) {
                (Some(start), Some(end)) => Some(CalendarEvent::new(
                    s.summary.unwrap_or_else(|| "Busy".to_string()),
                    start,
                    end,
                )),
                _ => {
                    tracing::debug!(summary = ?s.summary, "skipping stored event with malformed timestamp");
                    None
                }
            }
        })
        .collect();
    events.sort_by_key(|e| e.start);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ev(summary: &str, start: &str, end: &str) -> CalendarEvent {
        CalendarEvent::new(
            summary,
            DateTime::parse_from_rfc3339(start).unwrap(),
            DateTime::parse_from_rfc3339(end).unwrap(),
        )
    }

    #[test]
    fn encoded_events_keep_offsets() {
        let events = vec![ev(
            "Standup",
            "2026-03-02T09:00:00-06:00",
            "2026-03-02T09:15:00-06:00",
        )];
        let json = encode_events(&events).unwrap();
        assert_eq!(
            json,
            r#"[{"summary":"Standup","start":"2026-03-02T09:00:00-06:00","end":"2026-03-02T09:15:00-06:00"}]"#
        );
        assert_eq!(decode_events(&json), events);
    }

    #[test]
    fn decode_skips_malformed_entries() {
        let json = r#"[
            {"summary":"Bad","start":"yesterday","end":"2026-03-02T10:00:00-06:00"},
            {"summary":"Missing end","start":"2026-03-02T10:00:00-06:00"},
            {"summary":"Good","start":"2026-03-02T11:00:00-06:00","end":"2026-03-02T11:30:00-06:00"}
        ]"#;
        let events = decode_events(json);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary, "Good");
    }

    #[test]
    fn decode_tolerates_garbage_document() {
        assert!(decode_events("{not json").is_empty());
        assert!(decode_events("").is_empty());
        assert!(decode_events("[]").is_empty());
    }

    #[test]
    fn constructor_clamps_available_and_sorts() {
        let snapshot = DailySnapshot::new(
            "alice",
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            480,
            900,
            vec![
                ev("Late", "2026-03-02T15:00:00-06:00", "2026-03-02T16:00:00-06:00"),
                ev("Early", "2026-03-02T09:00:00-06:00", "2026-03-02T10:00:00-06:00"),
            ],
            Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap(),
        );
        assert_eq!(snapshot.available_minutes, 480);
        assert_eq!(snapshot.events[0].summary, "Early");
        assert!(snapshot.has_events());
    }
}
