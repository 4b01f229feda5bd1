//! E2E tests for the Google Calendar provider.
//!
//! Tests use mocked HTTP responses to verify request shape, pagination and
//! error handling without real credentials or external API access.

use chrono::{NaiveDate, TimeZone, Utc};
use flowfocus_core::integrations::{CalendarProvider, GoogleCalendar};
use flowfocus_core::{sync_day, Config, CoreError, Database, FixedClock, WorkWindow};
use mockito::Matcher;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

/// 09:00-17:00 America/Chicago on 2026-03-02.
fn window() -> WorkWindow {
    Config::default().work_window(day()).unwrap()
}

fn window_query() -> Vec<Matcher> {
    vec![
        Matcher::UrlEncoded("timeMin".into(), "2026-03-02T15:00:00Z".into()),
        Matcher::UrlEncoded("timeMax".into(), "2026-03-02T23:00:00Z".into()),
        Matcher::UrlEncoded("singleEvents".into(), "true".into()),
        Matcher::UrlEncoded("orderBy".into(), "startTime".into()),
    ]
}

const FIRST_PAGE: &str = r#"{
    "kind": "calendar#events",
    "items": [
        {
            "id": "a1",
            "status": "confirmed",
            "summary": "Standup",
            "start": {"dateTime": "2026-03-02T09:30:00-06:00"},
            "end": {"dateTime": "2026-03-02T09:45:00-06:00"}
        },
        {
            "id": "a2",
            "status": "cancelled",
            "summary": "Moved",
            "start": {"dateTime": "2026-03-02T11:00:00-06:00"},
            "end": {"dateTime": "2026-03-02T12:00:00-06:00"}
        },
        {
            "id": "a3",
            "start": {"date": "2026-03-02"},
            "end": {"date": "2026-03-03"}
        }
    ],
    "nextPageToken": "p2"
}"#;

const SECOND_PAGE: &str = r#"{
    "items": [
        {
            "id": "b1",
            "start": {"dateTime": "2026-03-02T14:00:00", "timeZone": "America/Chicago"},
            "end": {"dateTime": "2026-03-02T15:00:00", "timeZone": "America/Chicago"}
        }
    ]
}"#;

#[tokio::test]
async fn fetch_events_sends_window_and_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/calendars/primary/events")
        .match_header("authorization", "Bearer test-token")
        .match_query(Matcher::AllOf(window_query()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"items": []}"#)
        .create_async()
        .await;

    let google = GoogleCalendar::new(&server.url(), "primary", "test-token");
    let events = google.fetch_events(&window()).await.unwrap();

    assert!(events.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn fetch_events_follows_pages_and_drops_cancelled() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::Regex(
            r"^timeMin=[^&]*&timeMax=[^&]*&singleEvents=true&orderBy=startTime$".into(),
        ))
        .with_status(200)
        .with_body(FIRST_PAGE)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::UrlEncoded("pageToken".into(), "p2".into()))
        .with_status(200)
        .with_body(SECOND_PAGE)
        .create_async()
        .await;

    let google = GoogleCalendar::new(&server.url(), "primary", "test-token");
    let events = google.fetch_events(&window()).await.unwrap();

    let summaries: Vec<&str> = events.iter().map(|e| e.display_summary()).collect();
    assert_eq!(summaries, vec!["Standup", "Busy", "Busy"]);
    assert_eq!(events[1].start.date.as_deref(), Some("2026-03-02"));
    assert_eq!(events[2].start.time_zone.as_deref(), Some("America/Chicago"));
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn calendar_id_is_percent_encoded() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/calendars/team%40example.com/events")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"items": []}"#)
        .create_async()
        .await;

    let google = GoogleCalendar::new(&server.url(), "team@example.com", "t");
    google.fetch_events(&window()).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn api_error_payload_becomes_integration_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"error": {"code": 401, "message": "Invalid Credentials"}}"#)
        .create_async()
        .await;

    let google = GoogleCalendar::new(&server.url(), "primary", "expired");
    let err = google.fetch_events(&window()).await.unwrap_err();

    match err {
        CoreError::Integration { service, message, .. } => {
            assert_eq!(service, "google");
            assert!(message.contains("Invalid Credentials"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn non_json_failure_becomes_integration_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::Any)
        .with_status(502)
        .with_body("<html>Bad Gateway</html>")
        .create_async()
        .await;

    let google = GoogleCalendar::new(&server.url(), "primary", "t");
    let err = google.fetch_events(&window()).await.unwrap_err();
    assert!(matches!(err, CoreError::Integration { .. }));
}

#[tokio::test]
async fn sync_day_against_google_stores_snapshot() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::Regex(
            r"^timeMin=[^&]*&timeMax=[^&]*&singleEvents=true&orderBy=startTime$".into(),
        ))
        .with_status(200)
        .with_body(FIRST_PAGE)
        .create_async()
        .await;
    server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::UrlEncoded("pageToken".into(), "p2".into()))
        .with_status(200)
        .with_body(SECOND_PAGE)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(&dir.path().join("flowfocus.db")).unwrap();
    let clock = FixedClock(Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap());
    let google = GoogleCalendar::new(&server.url(), "primary", "t");

    let snap = sync_day(&google, &db, &Config::default(), "alice", day(), &clock)
        .await
        .unwrap();

    // 15 min standup + 60 min untitled block; all-day and cancelled dropped
    assert_eq!(snap.total_minutes, 480);
    assert_eq!(snap.available_minutes, 405);
    let summaries: Vec<&str> = snap.events.iter().map(|e| e.summary.as_str()).collect();
    assert_eq!(summaries, vec!["Standup", "Busy"]);
    assert_eq!(db.get_snapshot("alice", day()).unwrap(), Some(snap));
}
