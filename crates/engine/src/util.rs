//! Internal helpers for timestamp parsing and formatting.
//!
//! These utilities are **not** part of the public API. Every timestamp the
//! engine stores is `YYYY-MM-DD HH:MM:SS` text so range filters compare
//! correctly as strings.

use chrono::{Local, NaiveDate, NaiveDateTime};

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 2] = [DATE_FORMAT, "%Y/%m/%d"];

pub(crate) fn now_timestamp() -> String {
    Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a user supplied transaction time. Date-only input means midnight.
pub(crate) fn parse_transaction_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Parse a calendar date, accepting a full timestamp and keeping its date.
pub(crate) fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| parse_transaction_time(raw).map(|dt| dt.date()))
}

/// Re-render a stored timestamp at second precision. Unreadable values are
/// returned as stored.
pub(crate) fn display_timestamp(raw: String) -> String {
    match parse_transaction_time(&raw) {
        Some(dt) => dt.format(TIMESTAMP_FORMAT).to_string(),
        None => raw,
    }
}
