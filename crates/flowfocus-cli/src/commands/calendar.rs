//! Calendar sync commands for CLI.

use clap::Subcommand;
use flowfocus_core::integrations::{google_token, GoogleCalendar};
use flowfocus_core::{day_overview, sync_day, Config, Database, SystemClock};

use super::{print_json, resolve_day, resolve_owner, CliResult};

#[derive(Subcommand)]
pub enum CalendarAction {
    /// Fetch the day's events and store its availability
    Sync {
        /// Day to sync (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show the stored availability and task load for a day
    Today {
        /// Day to show (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
}

pub async fn run(action: CalendarAction, owner: Option<&str>) -> CliResult {
    let config = Config::load_or_default();
    config.validate()?;
    let owner = resolve_owner(&config, owner)?;
    let db = Database::open()?;
    let clock = SystemClock;

    match action {
        CalendarAction::Sync { date } => {
            let day = resolve_day(&config, date.as_deref(), &clock)?;
            let (token, source) = google_token()?.ok_or(
                "not authenticated with Google; run `flowfocus auth google login --token <TOKEN>`",
            )?;
            tracing::debug!(?source, "using Google access token");

            let google = GoogleCalendar::from_config(&config.google, &token);
            let snapshot = sync_day(&google, &db, &config, &owner, day, &clock).await?;
            print_json(&snapshot)?;
        }
        CalendarAction::Today { date } => {
            let day = resolve_day(&config, date.as_deref(), &clock)?;
            print_json(&day_overview(&db, &owner, day)?)?;
        }
    }
    Ok(())
}
