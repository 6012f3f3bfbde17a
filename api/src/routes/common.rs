//! Parse-and-validate boundary shared by the route modules.
//!
//! Query strings and optional bodies arrive as raw strings and are turned into
//! typed values here. Anything missing or malformed becomes
//! `ServiceError::BadRequest` before a service is called.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::de::DeserializeOwned;
use services::{MAX_ROW_COUNT, ServiceError};
use std::str::FromStr;
use validator::ValidationErrors;

/// Joins the messages of every failed field into one line.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| {
            errs.iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parses an optional numeric parameter; `None` when absent or blank.
pub fn parse_opt<T: FromStr>(name: &str, raw: Option<&str>) -> Result<Option<T>, ServiceError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v.parse::<T>().map(Some).map_err(|_| {
            ServiceError::BadRequest(format!("{name} must be a non-negative integer, got '{v}'"))
        }),
    }
}

/// Like [`parse_opt`] for row counts (`skip`, `limit`, `sessions`), capped at
/// what the database can bind.
pub fn parse_count(name: &str, raw: Option<&str>) -> Result<Option<u64>, ServiceError> {
    match parse_opt::<u64>(name, raw)? {
        Some(n) if n > MAX_ROW_COUNT => Err(ServiceError::BadRequest(format!(
            "{name} must not exceed {MAX_ROW_COUNT}, got {n}"
        ))),
        n => Ok(n),
    }
}

/// Whether a date-only value is taken as the start or the end of that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayEdge {
    Start,
    End,
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (UTC).
pub fn parse_instant(
    name: &str,
    raw: Option<&str>,
    edge: DayEdge,
) -> Result<Option<DateTime<Utc>>, ServiceError> {
    let Some(v) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }

    let date = NaiveDate::parse_from_str(v, "%Y-%m-%d").map_err(|_| {
        ServiceError::BadRequest(format!(
            "{name} must be an RFC 3339 timestamp or YYYY-MM-DD, got '{v}'"
        ))
    })?;
    let time = match edge {
        DayEdge::Start => NaiveTime::MIN,
        DayEdge::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN),
    };
    Ok(Some(date.and_time(time).and_utc()))
}

/// Decodes an optional JSON body: empty means `T::default()`.
pub fn parse_optional_body<T>(body: &[u8]) -> Result<T, ServiceError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ServiceError::BadRequest(format!("Invalid JSON body: {e}")))
}
