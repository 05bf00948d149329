//! Global scalar series: economic indicators (type 1) and commodity prices (type 4).

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    models::{currency_pair::CurrencyPair, record::MarketRecord, resource::ResourceDescriptor},
    providers::{alpha_vantage::response::{lenient_f64, ObservationResponse}, endpoint},
    strategies::{FetchContext, FetchStrategy},
    tz::parse_feed_timestamp,
};

/// One request per resource, one [`MarketRecord::Scalar`] per observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObservationSeries;

#[async_trait]
impl FetchStrategy for ObservationSeries {
    async fn fetch(
        &self,
        ctx: &FetchContext<'_>,
        resource: &ResourceDescriptor,
        _pairs: &[CurrencyPair],
    ) -> Vec<MarketRecord> {
        let function = resource.function_upper();
        let interval = resource.interval();
        let mut params = vec![("apikey", ctx.api_key())];
        if let Some(function) = function.as_deref() {
            params.push(("function", function));
        }
        if let Some(interval) = interval.as_deref() {
            params.push(("interval", interval));
        }

        let url = match endpoint::render(&resource.api_endpoint, &params) {
            Ok(url) => url,
            Err(e) => {
                error!(resource = %resource.name, error = %e, "cannot build endpoint");
                return Vec::new();
            }
        };
        info!(resource = %resource.name, url = %ctx.redact(&url), "fetching series");

        match ctx.source.get_json(&url).await {
            Ok(payload) => parse_observations(&payload, &resource.name),
            Err(e) => {
                error!(resource = %resource.name, error = %e, "API call failed");
                Vec::new()
            }
        }
    }
}

/// Normalize a `{"data": [{"date", "value"}]}` payload.
///
/// Entries without a date, without a value, with the "." placeholder or with an
/// unparseable date are skipped.
pub fn parse_observations(payload: &Value, resource: &str) -> Vec<MarketRecord> {
    let response: ObservationResponse = match serde_json::from_value(payload.clone()) {
        Ok(r) => r,
        Err(e) => {
            warn!(resource, error = %e, "unexpected series payload");
            return Vec::new();
        }
    };
    let Some(data) = response.data else {
        warn!(resource, "payload has no data array");
        return Vec::new();
    };

    let mut records = Vec::with_capacity(data.len());
    for obs in data {
        let (Some(date), Some(raw)) = (obs.date, obs.value) else {
            continue;
        };
        let Some(value) = lenient_f64(&raw) else {
            debug!(resource, date = %date, "skipping blank observation");
            continue;
        };
        match parse_feed_timestamp(&date) {
            Ok(timestamp) => records.push(MarketRecord::Scalar { timestamp, value }),
            Err(e) => warn!(resource, error = %e, "skipping observation"),
        }
    }
    records
}
