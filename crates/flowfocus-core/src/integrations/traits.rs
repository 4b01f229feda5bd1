use async_trait::async_trait;

use crate::availability::{RawEvent, WorkWindow};
use crate::error::Result;

/// Source of calendar events for availability sync.
///
/// Implementations return the raw events overlapping the window; clamping,
/// all-day filtering and malformed-event handling happen downstream.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Unique identifier (e.g. "google").
    fn name(&self) -> &str;

    /// Fetch events overlapping `window`.
    async fn fetch_events(&self, window: &WorkWindow) -> Result<Vec<RawEvent>>;
}
