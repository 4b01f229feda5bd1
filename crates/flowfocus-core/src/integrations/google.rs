//! Google Calendar integration.
//!
//! Reads the events of one calendar for a work window through the Calendar
//! v3 `events.list` endpoint, expanding recurring events and following
//! pagination. Authentication is a bearer access token obtained elsewhere.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::traits::CalendarProvider;
use crate::availability::{RawEvent, RawEventTime, WorkWindow};
use crate::error::{CoreError, Result};
use crate::storage::GoogleConfig;

const SERVICE: &str = "google";

/// One page of `events.list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsPage {
    #[serde(default)]
    items: Vec<EventItem>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventItem {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    start: RawEventTime,
    #[serde(default)]
    end: RawEventTime,
}

/// Google Calendar event source.
pub struct GoogleCalendar {
    client: Client,
    api_base: String,
    calendar_id: String,
    token: String,
}

impl GoogleCalendar {
    pub fn new(api_base: &str, calendar_id: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            calendar_id: calendar_id.to_string(),
            token: token.to_string(),
        }
    }

    pub fn from_config(config: &GoogleConfig, token: &str) -> Self {
        Self::new(&config.api_base, &config.calendar_id, token)
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.api_base,
            urlencoding::encode(&self.calendar_id)
        )
    }

    async fn fetch_page(
        &self,
        window: &WorkWindow,
        page_token: Option<&str>,
    ) -> Result<EventsPage> {
        let time_min = window
            .start()
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let time_max = window
            .end()
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut request = self
            .client
            .get(self.events_url())
            .bearer_auth(&self.token)
            .query(&[
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
            ]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        let json: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            CoreError::integration(SERVICE, format!("HTTP {status}: unreadable response ({e})"))
        })?;

        if let Some(err) = json.get("error") {
            let message = err
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Err(CoreError::integration(
                SERVICE,
                format!("Google Calendar API error (HTTP {status}): {message}"),
            ));
        }
        if !status.is_success() {
            return Err(CoreError::integration(SERVICE, format!("HTTP {status}")));
        }

        serde_json::from_value(json)
            .map_err(|e| CoreError::integration(SERVICE, format!("unexpected response: {e}")))
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendar {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn fetch_events(&self, window: &WorkWindow) -> Result<Vec<RawEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.fetch_page(window, page_token.as_deref()).await?;
            tracing::debug!(
                calendar = %self.calendar_id,
                items = page.items.len(),
                "fetched Google Calendar page"
            );

            events.extend(
                page.items
                    .into_iter()
                    .filter(|item| item.status.as_deref() != Some("cancelled"))
                    .map(|item| RawEvent {
                        summary: item.summary,
                        start: item.start,
                        end: item.end,
                    }),
            );

            match page.next_page_token {
                Some(next) if Some(&next) != page_token.as_ref() => page_token = Some(next),
                _ => break,
            }
        }

        Ok(events)
    }
}
