//! Warehouse side of the feed pipeline.
//!
//! Reads the resource registry, fetches through `market_feeds`, merges new rows
//! into SQLite feed tables, stages news sentiment, and copies view definitions
//! between warehouses. Jobs run from the `signal-sync` CLI, the HTTP triggers in
//! [`server`] or the cron triggers in [`schedule`].

pub mod db;
pub mod jobs;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod schedule;
pub mod schema;
pub mod server;
pub mod settings;
pub mod views;
pub mod watermark;
pub mod writer;
