//! Upstream half of the feed ingestion pipeline.
//!
//! - [`models`]: feed descriptors and the normalized records produced by a run.
//! - [`providers`]: the [`providers::JsonSource`] seam and the AlphaVantage client behind it.
//! - [`strategies`]: one fetch-and-normalize routine per feed type.
//! - [`filter`]: the high-water-mark filter that makes repeated runs idempotent.
//! - [`tz`]: timestamp parsing and time-zone normalization.

pub mod filter;
pub mod models;
pub mod providers;
pub mod strategies;
pub mod tz;
