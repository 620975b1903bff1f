//! Conversions between stored instants and the dashboard's local
//! `datetime-local` style values (`YYYY-MM-DDTHH:MM`).

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use thiserror::Error;

/// Format of the editable webinar date, minute precision
pub const LOCAL_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

const LOCAL_INPUT_FORMAT_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("Invalid date and time: {0}")]
    InvalidLocal(String),

    #[error("Invalid timestamp: {0}")]
    InvalidInstant(String),

    #[error("Invalid timezone offset: {0}")]
    InvalidOffset(String),
}

/// Shift an instant into the viewer's wall clock, truncated to the minute.
pub fn to_local_input(instant: DateTime<Utc>, offset: FixedOffset) -> String {
    instant
        .with_timezone(&offset)
        .format(LOCAL_INPUT_FORMAT)
        .to_string()
}

/// Interpret a wall-clock value typed by the viewer as an absolute instant.
pub fn from_local_input(value: &str, offset: FixedOffset) -> Result<DateTime<Utc>, DateError> {
    let value = value.trim();
    let naive = NaiveDateTime::parse_from_str(value, LOCAL_INPUT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, LOCAL_INPUT_FORMAT_SECONDS))
        .map_err(|_| DateError::InvalidLocal(value.to_string()))?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| DateError::InvalidLocal(value.to_string()))
}

/// Parse a timestamp as returned by the backend.
///
/// `timestamptz` columns come back as RFC 3339; plain `timestamp` columns
/// have no zone and are read as UTC.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, DateError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    // Postgres renders "+00" rather than "+00:00"
    if let Ok(parsed) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%#z") {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| DateError::InvalidInstant(value.to_string()))
}

/// Render an instant the way the backend stores writes: `2025-03-01T10:00:00.000Z`
pub fn to_iso_millis(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a viewer offset given in minutes east of UTC.
pub fn offset_from_minutes(minutes: &str) -> Result<FixedOffset, DateError> {
    minutes
        .trim()
        .parse::<i32>()
        .ok()
        .and_then(|m| m.checked_mul(60))
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| DateError::InvalidOffset(minutes.to_string()))
}

/// Table cell rendering, e.g. `1 Mar 2025, 03:30 pm`
pub fn display_short(instant: DateTime<Utc>, offset: FixedOffset) -> String {
    instant
        .with_timezone(&offset)
        .format("%-d %b %Y, %I:%M %P")
        .to_string()
}

/// Rendering of the held webinar date, e.g. `1 March 2025, 03:30 pm`
pub fn display_long(local_input: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(local_input, LOCAL_INPUT_FORMAT)
        .ok()
        .map(|naive| naive.format("%-d %B %Y, %I:%M %P").to_string())
}
