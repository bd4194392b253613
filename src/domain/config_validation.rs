//! Configuration validation.
//!
//! Validates every config field used by a profiling run and builds the
//! typed options from them.

use crate::domain::error::ScreenerError;
use crate::domain::profile::{MAX_WINDOW_DAYS, ProfileOptions, ReturnWindow, default_return_windows};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::time::Duration;

pub const MAX_HISTORY_DAYS: u32 = MAX_WINDOW_DAYS;
pub const MAX_PRICE_TOLERANCE_DAYS: u32 = 366;
pub const MAX_WORKERS: usize = 64;

/// Where OHLCV data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Csv,
    Sqlite,
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> ScreenerError {
    ScreenerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Integer field that must parse when present.
fn int_field(config: &dyn ConfigPort, section: &str, key: &str, default: i64) -> Result<i64, ScreenerError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| invalid(section, key, format!("{key} must be an integer"))),
    }
}

fn non_negative(config: &dyn ConfigPort, section: &str, key: &str, default: i64) -> Result<u32, ScreenerError> {
    let value = int_field(config, section, key, default)?;
    u32::try_from(value).map_err(|_| invalid(section, key, format!("{key} must be non-negative")))
}

fn bounded(config: &dyn ConfigPort, section: &str, key: &str, default: i64, max: u32) -> Result<u32, ScreenerError> {
    let value = non_negative(config, section, key, default)?;
    if value > max {
        return Err(invalid(section, key, format!("{key} must be at most {max}")));
    }
    Ok(value)
}

pub fn validate_data_source(config: &dyn ConfigPort) -> Result<DataSource, ScreenerError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    match source.trim().to_lowercase().as_str() {
        "csv" => match config.get_string("data", "csv_dir") {
            Some(dir) if !dir.trim().is_empty() => Ok(DataSource::Csv),
            _ => Err(ScreenerError::ConfigMissing {
                section: "data".to_string(),
                key: "csv_dir".to_string(),
            }),
        },
        "sqlite" => match config.get_string("sqlite", "path") {
            Some(path) if !path.trim().is_empty() => Ok(DataSource::Sqlite),
            _ => Err(ScreenerError::ConfigMissing {
                section: "sqlite".to_string(),
                key: "path".to_string(),
            }),
        },
        other => Err(invalid(
            "data",
            "source",
            format!("unknown data source {other:?}, expected csv or sqlite"),
        )),
    }
}

fn validate_workers(config: &dyn ConfigPort) -> Result<usize, ScreenerError> {
    let workers = int_field(config, "profile", "workers", 2)?;
    match usize::try_from(workers) {
        Ok(n) if (1..=MAX_WORKERS).contains(&n) => Ok(n),
        _ => Err(invalid(
            "profile",
            "workers",
            format!("workers must be between 1 and {MAX_WORKERS}"),
        )),
    }
}

fn validate_return_windows(config: &dyn ConfigPort) -> Result<Vec<ReturnWindow>, ScreenerError> {
    match config.get_string("profile", "return_windows") {
        None => Ok(default_return_windows()),
        Some(raw) => ReturnWindow::parse_list(&raw).map_err(|reason| invalid("profile", "return_windows", reason)),
    }
}

fn validate_end_date(config: &dyn ConfigPort) -> Result<Option<NaiveDate>, ScreenerError> {
    match config.get_string("data", "end_date") {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid("data", "end_date", "invalid end_date format, expected YYYY-MM-DD")),
    }
}

fn validate_exchange(config: &dyn ConfigPort) -> Result<String, ScreenerError> {
    match config.get_string("data", "exchange") {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_uppercase()),
        Some(_) => Err(invalid("data", "exchange", "exchange must not be empty")),
        None => Ok("ASX".to_string()),
    }
}

pub fn build_profile_options(config: &dyn ConfigPort) -> Result<ProfileOptions, ScreenerError> {
    let history_days = bounded(config, "data", "history_days", 730, MAX_HISTORY_DAYS)?;
    if history_days == 0 {
        return Err(invalid("data", "history_days", "history_days must be positive"));
    }
    let timeout_secs = non_negative(config, "profile", "timeout_secs", 0)?;
    let benchmark = config
        .get_string("profile", "benchmark")
        .map(|b| b.trim().to_uppercase())
        .filter(|b| !b.is_empty());

    Ok(ProfileOptions {
        workers: validate_workers(config)?,
        price_tolerance_days: bounded(
            config,
            "profile",
            "price_tolerance_days",
            5,
            MAX_PRICE_TOLERANCE_DAYS,
        )?,
        search_forward: config.get_bool("profile", "search_forward", false),
        return_windows: validate_return_windows(config)?,
        exchange: validate_exchange(config)?,
        history_days,
        end_date: validate_end_date(config)?,
        benchmark,
        timeout: (timeout_secs > 0).then(|| Duration::from_secs(u64::from(timeout_secs))),
        ignore_unsupported_func: config.get_bool("profile", "ignore_unsupported_func", true),
        ..ProfileOptions::default()
    })
}
