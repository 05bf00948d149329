use std::{num::NonZeroU32, time::Duration};

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use serde_json::Value;
use snafu::ResultExt;
use tracing::debug;

use crate::providers::{
    ApiSnafu, ClientBuildSnafu, JsonSource, ProviderError, ProviderInitError, ReqwestSnafu,
};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Keys the vendor uses for error envelopes delivered with HTTP 200.
const ENVELOPE_KEYS: [&str; 3] = ["Error Message", "Note", "Information"];

#[derive(Debug, Clone)]
pub struct AlphaVantageConfig {
    pub requests_per_minute: NonZeroU32,
    pub request_timeout: Duration,
}

impl Default for AlphaVantageConfig {
    fn default() -> Self {
        Self {
            // premium-tier allowance
            requests_per_minute: nonzero!(75u32),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Throttled HTTP client for AlphaVantage.
///
/// Every call waits on a shared token bucket, so concurrent fetches across pairs
/// never exceed the configured per-minute allowance. The API key travels inside the
/// rendered URL; this type never sees it.
pub struct AlphaVantageClient {
    client: Client,
    limiter: DefaultDirectRateLimiter,
}

impl AlphaVantageClient {
    pub fn new(config: &AlphaVantageConfig) -> Result<Self, ProviderInitError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            limiter: RateLimiter::direct(Quota::per_minute(config.requests_per_minute)),
        })
    }
}

#[async_trait]
impl JsonSource for AlphaVantageClient {
    async fn get_json(&self, url: &str) -> Result<Value, ProviderError> {
        self.limiter.until_ready().await;

        let response = self.client.get(url).send().await.context(ReqwestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return ApiSnafu {
                message: format!("HTTP {status}: {error_msg}"),
            }
            .fail();
        }

        let payload = response.json::<Value>().await.context(ReqwestSnafu)?;
        if let Some(message) = vendor_error(&payload) {
            return ApiSnafu { message }.fail();
        }
        debug!(status = %status, "payload received");
        Ok(payload)
    }
}

/// The vendor's in-band error message, if `payload` is an error envelope.
pub fn vendor_error(payload: &Value) -> Option<String> {
    ENVELOPE_KEYS.iter().find_map(|key| {
        payload
            .get(*key)
            .map(|msg| match msg.as_str() {
                Some(text) => format!("{key}: {text}"),
                None => format!("{key}: {msg}"),
            })
    })
}
