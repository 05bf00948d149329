//! The per-table high-water mark.
//!
//! Not stored anywhere: it is recomputed every run as `MAX(timestamp column)` of the
//! destination table, so the only state carried between runs lives in the data itself.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::tz::{self, TimestampError};

/// Latest timestamp already persisted for a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HighWaterMark(NaiveDateTime);

impl HighWaterMark {
    pub fn new(ts: NaiveDateTime) -> Self {
        Self(ts)
    }

    /// Mark used for an empty table: 1900-01-01 00:00:00.
    pub fn floor() -> Self {
        let ts = NaiveDate::from_ymd_opt(1900, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or(NaiveDateTime::MIN);
        Self(ts)
    }

    /// Build the mark from a `MAX(...)` result; `None` means the table is empty.
    pub fn from_stored(raw: Option<&str>) -> Result<Self, TimestampError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Self::floor()),
            Some(s) => tz::parse_stored_timestamp(s).map(Self),
        }
    }

    /// True when `ts` is strictly newer than the mark.
    pub fn admits(&self, ts: NaiveDateTime) -> bool {
        ts > self.0
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl Default for HighWaterMark {
    fn default() -> Self {
        Self::floor()
    }
}

impl fmt::Display for HighWaterMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&tz::format_sql(self.0))
    }
}
