//! Incremental filter: drop everything the warehouse already has.

use crate::models::{record::MarketRecord, watermark::HighWaterMark};

/// Keep only records strictly newer than `hwm`.
///
/// Timestamps must already be normalized to the warehouse zone, since the mark
/// was read back from the warehouse.
pub fn retain_newer(records: Vec<MarketRecord>, hwm: HighWaterMark) -> Vec<MarketRecord> {
    records
        .into_iter()
        .filter(|r| hwm.admits(r.timestamp()))
        .collect()
}
