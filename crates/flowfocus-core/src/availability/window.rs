//! Work-day window in the reference time zone.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::error::ValidationError;

/// Default work-day bounds (9 AM - 5 PM).
pub const DEFAULT_START_HOUR: u32 = 9;
pub const DEFAULT_END_HOUR: u32 = 17;

/// Half-open interval `[start, end)` of working time for one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkWindow {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

impl WorkWindow {
    /// Build the window for `day` from whole local hours in `tz`.
    ///
    /// # Errors
    /// Returns an error if the hours are outside 0-23 or not ordered.
    pub fn for_day(
        tz: Tz,
        day: NaiveDate,
        start_hour: u32,
        end_hour: u32,
    ) -> Result<Self, ValidationError> {
        validate_work_hours(start_hour, end_hour)?;
        Self::new(
            resolve_local_datetime(&tz, day, start_hour),
            resolve_local_datetime(&tz, day, end_hour),
        )
    }

    /// Build a window from explicit instants.
    ///
    /// # Errors
    /// Returns an error unless `start < end`.
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::InvalidWorkHours {
                start: 0,
                end: 0,
                message: format!("window start {start} is not before end {end}"),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    /// Reference zone the window was built in.
    pub fn timezone(&self) -> Tz {
        self.start.timezone()
    }

    /// Local calendar day of the window start.
    pub fn day(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Window length in whole minutes (480 for a plain 9-17 day).
    pub fn total_minutes(&self) -> u32 {
        (self.end - self.start).num_minutes().max(0) as u32
    }
}

/// Check that work hours are within 0-23 and ordered.
pub fn validate_work_hours(start_hour: u32, end_hour: u32) -> Result<(), ValidationError> {
    if start_hour > 23 || end_hour > 23 {
        return Err(ValidationError::InvalidWorkHours {
            start: start_hour,
            end: end_hour,
            message: "hours must be between 0 and 23".to_string(),
        });
    }
    if start_hour >= end_hour {
        return Err(ValidationError::InvalidWorkHours {
            start: start_hour,
            end: end_hour,
            message: "start hour must be before end hour".to_string(),
        });
    }
    Ok(())
}

/// Resolve a local date + hour to an instant in `tz`.
///
/// Ambiguous times (fall-back) take the earlier instant. Times inside a
/// spring-forward gap take the first valid instant after the gap.
fn resolve_local_datetime(tz: &Tz, date: NaiveDate, hour: u32) -> DateTime<Tz> {
    let naive = NaiveDateTime::new(
        date,
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN),
    );

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            match tz.from_local_datetime(&shifted).earliest() {
                Some(dt) => {
                    tracing::debug!(%date, hour, %tz, "DST gap; using post-transition time");
                    dt
                }
                None => {
                    tracing::warn!(%date, hour, %tz, "could not resolve local time; treating as UTC");
                    tz.from_utc_datetime(&naive)
                }
            }
        }
    }
}
