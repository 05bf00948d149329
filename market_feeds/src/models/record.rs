//! Canonical in-memory representation of one normalized feed row.
//!
//! Every [`FetchStrategy`](crate::strategies::FetchStrategy) emits these, whatever
//! the upstream payload looked like. Records are produced fresh each run and never
//! mutated afterwards; the warehouse enforces uniqueness on the row key.

use chrono::NaiveDateTime;
use serde::Serialize;

/// A normalized record, one variant per destination row shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum MarketRecord {
    /// One value per timestamp (economic series, commodity prices).
    Scalar {
        timestamp: NaiveDateTime,
        value: f64,
    },
    /// A technical indicator value for one pair.
    Indicator {
        timestamp: NaiveDateTime,
        /// "BASE/QUOTE".
        symbol: String,
        value: f64,
        interval: String,
        time_period: u32,
        series_type: String,
    },
    /// An OHLC bar for one pair, timestamp already in the warehouse zone.
    FxBar {
        timestamp: NaiveDateTime,
        from_symbol: String,
        to_symbol: String,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },
}

impl MarketRecord {
    /// The timestamp compared against the high-water mark.
    pub fn timestamp(&self) -> NaiveDateTime {
        match self {
            Self::Scalar { timestamp, .. }
            | Self::Indicator { timestamp, .. }
            | Self::FxBar { timestamp, .. } => *timestamp,
        }
    }
}
