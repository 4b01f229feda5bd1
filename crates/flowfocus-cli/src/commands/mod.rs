pub mod auth;
pub mod calendar;
pub mod config;
pub mod task;

use chrono::NaiveDate;
use flowfocus_core::{Clock, Config};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// `--owner` wins over the configured owner.
pub fn resolve_owner(config: &Config, flag: Option<&str>) -> Result<String, Box<dyn std::error::Error>> {
    let owner = flag.unwrap_or(&config.owner).trim();
    if owner.is_empty() {
        return Err("owner must not be empty".into());
    }
    Ok(owner.to_string())
}

/// Parse `--date`, defaulting to today in the configured zone.
pub fn resolve_day(
    config: &Config,
    flag: Option<&str>,
    clock: &dyn Clock,
) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    match flag {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| format!("invalid date '{raw}' (expected YYYY-MM-DD)").into()),
        None => Ok(flowfocus_core::today(config, clock)?),
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
