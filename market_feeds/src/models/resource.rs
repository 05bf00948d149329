//! Registry resource descriptor: one configured external feed.

use serde::{Deserialize, Serialize};

/// Interval used by indicator feeds when the registry leaves it blank.
pub const DEFAULT_INTERVAL: &str = "daily";
/// Time period used by indicator feeds when the registry leaves it blank.
pub const DEFAULT_TIME_PERIOD: u32 = 20;

/// A configured feed plus its destination table and transformation rule.
///
/// Defined by operators in the registry table and read-only to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub resource_id: i32,
    pub name: String,
    /// Raw discriminator; see [`crate::models::feed_kind::FeedKind::from_type_id`].
    pub type_id: i32,
    /// Destination table. Validated as an identifier before use.
    pub target_table: String,
    /// Vendor function name, e.g. "SMA". Required by indicator feeds.
    pub api_function: Option<String>,
    /// `interval` or `interval:time_period`, e.g. "daily:20" or "5min".
    pub api_interval: Option<String>,
    /// Endpoint template with `{placeholder}` slots.
    pub api_endpoint: String,
    /// DDL that creates the destination table if it does not exist.
    pub create_table_sql: String,
    /// Optional merge statement reading its rows from the single bound JSON parameter.
    pub merge_sql: Option<String>,
}

impl ResourceDescriptor {
    /// Split `api_interval` into `(interval, time_period)`.
    ///
    /// `"weekly:50"` -> `("weekly", 50)`; blank -> `("daily", 20)`;
    /// a bare `"60min"` keeps the default period.
    pub fn interval_and_period(&self) -> (String, u32) {
        let raw = self
            .api_interval
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        match raw {
            None => (DEFAULT_INTERVAL.to_string(), DEFAULT_TIME_PERIOD),
            Some(raw) => match raw.split_once(':') {
                Some((interval, period)) => (
                    interval.trim().to_string(),
                    period.trim().parse().unwrap_or(DEFAULT_TIME_PERIOD),
                ),
                None => (raw.to_string(), DEFAULT_TIME_PERIOD),
            },
        }
    }

    /// The bare interval, if one is configured (`"5min:20"` -> `"5min"`).
    pub fn interval(&self) -> Option<String> {
        self.api_interval
            .as_deref()
            .map(|raw| raw.split(':').next().unwrap_or(raw).trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Upper-cased vendor function, e.g. "sma" -> "SMA".
    pub fn function_upper(&self) -> Option<String> {
        self.api_function
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_uppercase)
    }
}
