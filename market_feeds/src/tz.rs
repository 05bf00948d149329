//! Timestamp parsing and time-zone helpers.
//!
//! What this module provides:
//! - [`parse_feed_timestamp`]: the handful of shapes the vendor uses for bar and
//!   indicator keys ("2024-01-05", "2024-01-05 10:00", "2024-01-05 10:00:00").
//! - [`parse_news_timestamp`]: the compact `20240105T103000` form used by the news feed.
//! - [`parse_stored_timestamp`]: the text form read back from the warehouse.
//! - [`utc_to_zone`]: re-express a naive UTC wall time in the warehouse's fixed zone.
//!
//! Notes:
//! - Vendor timestamps carry no offset; FX series are documented as UTC.
//! - The warehouse stores naive local times in one fixed zone, formatted by [`format_sql`].
//!   Converting *from* UTC is never ambiguous, so no DST policy is needed here.

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Text layout used for every timestamp written to the warehouse.
pub const SQL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A timestamp string matched none of the accepted layouts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unrecognized timestamp {0:?}")]
pub struct TimestampError(pub String);

/// Parse a series key from the vendor payload.
///
/// Date-only keys resolve to midnight.
pub fn parse_feed_timestamp(s: &str) -> Result<NaiveDateTime, TimestampError> {
    let s = s.trim();
    for layout in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, layout) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| TimestampError(s.to_string()))
}

/// Parse the news feed's `time_published` (`%Y%m%dT%H%M%S`).
pub fn parse_news_timestamp(s: &str) -> Result<NaiveDateTime, TimestampError> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y%m%dT%H%M%S")
        .map_err(|_| TimestampError(s.to_string()))
}

/// Parse a timestamp read back from the warehouse.
///
/// Accepts an optional fractional part and either a space or `T` separator,
/// and falls back to the feed layouts for date-only values.
pub fn parse_stored_timestamp(s: &str) -> Result<NaiveDateTime, TimestampError> {
    let s = s.trim();
    for layout in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, layout) {
            return Ok(ts);
        }
    }
    parse_feed_timestamp(s)
}

/// Interpret `naive` as UTC and return the wall time in `tz`.
///
/// Example: 2024-01-03 00:00 UTC in US/Central -> 2024-01-02 18:00.
pub fn utc_to_zone(naive: NaiveDateTime, tz: Tz) -> NaiveDateTime {
    Utc.from_utc_datetime(&naive).with_timezone(&tz).naive_local()
}

/// Format a timestamp the way the warehouse stores it.
pub fn format_sql(ts: NaiveDateTime) -> String {
    ts.format(SQL_FORMAT).to_string()
}
