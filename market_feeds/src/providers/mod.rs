//! Provider abstraction for upstream feed endpoints.
//!
//! This module defines the [`JsonSource`] trait, the single seam between the fetch
//! strategies and the network. Strategies render an endpoint URL and ask a
//! `JsonSource` for the decoded JSON body; everything vendor-specific about
//! transport (timeouts, throttling, error envelopes) lives behind the trait.
//!
//! [`alpha_vantage::AlphaVantageClient`] is the production implementation. Tests use
//! small in-memory sources that answer from canned payloads.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use market_feeds::providers::{JsonSource, ProviderError};
//! use serde_json::{json, Value};
//!
//! struct Canned;
//!
//! #[async_trait]
//! impl JsonSource for Canned {
//!     async fn get_json(&self, _url: &str) -> Result<Value, ProviderError> {
//!         Ok(json!({ "data": [] }))
//!     }
//! }
//! ```

pub mod alpha_vantage;
pub mod endpoint;

use async_trait::async_trait;
use serde_json::Value;
use snafu::{Backtrace, Snafu};

/// Fetches and decodes one JSON document.
///
/// Implementations must be shareable across the per-pair fan-out.
#[async_trait]
pub trait JsonSource: Send + Sync {
    /// GET `url` and decode the body as JSON.
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - The decoded payload.
    /// * `Err(ProviderError)` - Transport failure, timeout, non-success status, or a
    ///   vendor error envelope. Callers treat this as a skip for that single item.
    async fn get_json(&self, url: &str) -> Result<Value, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}

/// Errors that can occur while talking to a provider or reading its payloads.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider's API returned an error status or an error envelope.
    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        backtrace: Backtrace,
    },

    /// The request could not be built from the resource configuration.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// The payload decoded but did not have the expected shape.
    #[snafu(display("Unexpected payload: {message}"))]
    Payload {
        message: String,
        backtrace: Backtrace,
    },
}
