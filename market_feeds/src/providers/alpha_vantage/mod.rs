//! AlphaVantage transport and payload shapes.

pub mod client;
pub mod response;

pub use client::{AlphaVantageClient, AlphaVantageConfig};
