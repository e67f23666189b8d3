//! Timestamp parsing utilities
//!
//! Dataset exports, review tables and curated exclusion files write times in
//! several ISO-8601 flavours. All are interpreted as UTC.

use crate::error::{RangeError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a timestamp, accepting RFC 3339, naive date-times and bare dates
///
/// A bare date resolves to midnight UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim().trim_end_matches('Z');
    if trimmed.is_empty() {
        return Err(RangeError::invalid_timestamp(value, "empty value"));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value.trim()) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return start_of_day(value, date);
    }

    Err(RangeError::invalid_timestamp(
        value,
        "expected 'YYYY-MM-DDTHH:MM:SS[.fff][Z]' or 'YYYY-MM-DD'",
    ))
}

/// Parse an optional timestamp; empty and unparseable values give `None`
pub fn parse_optional_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "None")
        .and_then(|s| parse_timestamp(s).ok())
}

/// Parse the closed interval described by an exclusion entry
///
/// Accepts a single instant (`[t, t]`), a bare date (the whole day), or a
/// `start/end` pair where a bare-date end covers its whole day.
pub fn parse_time_span(value: &str) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let value = value.trim();
    match value.split_once('/') {
        Some((start, end)) => {
            let (start, _) = parse_endpoint(start)?;
            let (_, end) = parse_endpoint(end)?;
            Ok((start, end))
        }
        None => parse_endpoint(value),
    }
}

fn parse_endpoint(value: &str) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Ok((start_of_day(value, date)?, end_of_day(value, date)?));
    }
    let instant = parse_timestamp(trimmed)?;
    Ok((instant, instant))
}

fn start_of_day(raw: &str, date: NaiveDate) -> Result<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| RangeError::invalid_timestamp(raw, "date out of range"))
}

fn end_of_day(raw: &str, date: NaiveDate) -> Result<DateTime<Utc>> {
    date.and_hms_nano_opt(23, 59, 59, 999_999_999)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| RangeError::invalid_timestamp(raw, "date out of range"))
}
