//! Raw calendar events as delivered by a calendar provider.
//!
//! The shape follows the Google Calendar v3 `Event` resource: each bound is
//! either a precise `dateTime` or a date-only `date` (all-day events).

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One bound (start or end) of a raw event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl RawEventTime {
    /// Precise bound from an RFC 3339 string.
    pub fn timed(date_time: impl Into<String>) -> Self {
        Self {
            date_time: Some(date_time.into()),
            ..Default::default()
        }
    }

    /// Date-only bound.
    pub fn all_day(date: NaiveDate) -> Self {
        Self {
            date: Some(date.format("%Y-%m-%d").to_string()),
            ..Default::default()
        }
    }

    /// Resolve to an instant.
    ///
    /// Returns `Ok(None)` for date-only bounds. A `dateTime` without an
    /// offset is read in its own `timeZone`, falling back to `reference`.
    ///
    /// # Errors
    /// Returns `InvalidTimestamp` when the value cannot be interpreted.
    pub fn resolve(&self, reference: &Tz) -> Result<Option<DateTime<FixedOffset>>, ValidationError> {
        let Some(raw) = self.date_time.as_deref() else {
            if self.date.is_some() {
                return Ok(None);
            }
            return Err(ValidationError::InvalidTimestamp(String::new()));
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(dt));
        }

        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|_| ValidationError::InvalidTimestamp(raw.to_string()))?;
        let tz = match self.time_zone.as_deref() {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| ValidationError::InvalidTimestamp(format!("{raw} [{name}]")))?,
            None => *reference,
        };
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.fixed_offset())
            .map(Some)
            .ok_or_else(|| ValidationError::InvalidTimestamp(raw.to_string()))
    }
}

/// A calendar event before clamping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub start: RawEventTime,
    #[serde(default)]
    pub end: RawEventTime,
}

impl RawEvent {
    pub fn timed(summary: &str, start: &str, end: &str) -> Self {
        Self {
            summary: Some(summary.to_string()),
            start: RawEventTime::timed(start),
            end: RawEventTime::timed(end),
        }
    }

    pub fn all_day(summary: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            summary: Some(summary.to_string()),
            start: RawEventTime::all_day(start),
            end: RawEventTime::all_day(end),
        }
    }

    /// Summary shown for the event; untitled events read as "Busy".
    pub fn display_summary(&self) -> &str {
        self.summary.as_deref().unwrap_or("Busy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn chicago() -> Tz {
        chrono_tz::America::Chicago
    }

    #[test]
    fn parses_offset_and_zulu() {
        let t = RawEventTime::timed("2026-03-02T16:00:00Z");
        let dt = t.resolve(&chicago()).unwrap().unwrap();
        assert_eq!(
            dt.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2026, 3, 2, 16, 0, 0).unwrap()
        );
    }

    #[test]
    fn naive_time_uses_event_zone_then_reference() {
        let mut t = RawEventTime::timed("2026-03-02T11:00:00");
        t.time_zone = Some("America/New_York".to_string());
        let dt = t.resolve(&chicago()).unwrap().unwrap();
        assert_eq!(
            dt.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2026, 3, 2, 16, 0, 0).unwrap()
        );

        let t = RawEventTime::timed("2026-03-02T10:00:00");
        let dt = t.resolve(&chicago()).unwrap().unwrap();
        assert_eq!(
            dt.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2026, 3, 2, 16, 0, 0).unwrap()
        );
    }

    #[test]
    fn date_only_is_none_and_garbage_is_error() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(RawEventTime::all_day(day).resolve(&chicago()), Ok(None));
        assert!(RawEventTime::timed("tomorrow-ish").resolve(&chicago()).is_err());
        assert!(RawEventTime::default().resolve(&chicago()).is_err());
    }

    #[test]
    fn deserializes_google_shape() {
        let json = r#"{
            "summary": "Standup",
            "start": {"dateTime": "2026-03-02T09:00:00-06:00", "timeZone": "America/Chicago"},
            "end": {"dateTime": "2026-03-02T09:15:00-06:00"}
        }"#;
        let event: RawEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.display_summary(), "Standup");
        assert_eq!(
            event.start.time_zone.as_deref(),
            Some("America/Chicago")
        );

        let untitled: RawEvent =
            serde_json::from_str(r#"{"start":{"date":"2026-03-02"},"end":{"date":"2026-03-03"}}"#)
                .unwrap();
        assert_eq!(untitled.display_summary(), "Busy");
    }
}
