//! Technical indicators computed per currency pair (type 2).

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{
    models::{currency_pair::CurrencyPair, record::MarketRecord, resource::ResourceDescriptor},
    providers::{alpha_vantage::response::{lenient_f64, IndicatorSeries}, endpoint},
    strategies::{FetchContext, FetchStrategy},
    tz::parse_feed_timestamp,
};

/// Indicators are always computed on closing prices.
pub const SERIES_TYPE: &str = "close";

/// Parameters shared by every pair of one indicator resource.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSpec {
    /// Upper-cased vendor function, e.g. "SMA".
    pub function: String,
    pub interval: String,
    pub time_period: u32,
}

impl IndicatorSpec {
    pub fn from_resource(resource: &ResourceDescriptor) -> Option<Self> {
        let function = resource.function_upper()?;
        let (interval, time_period) = resource.interval_and_period();
        Some(Self { function, interval, time_period })
    }

    /// Payload key holding the series, e.g. "Technical Analysis: SMA".
    pub fn series_key(&self) -> String {
        format!("Technical Analysis: {}", self.function)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TechnicalIndicator;

impl TechnicalIndicator {
    async fn fetch_pair(
        &self,
        ctx: &FetchContext<'_>,
        resource: &ResourceDescriptor,
        spec: &IndicatorSpec,
        pair: &CurrencyPair,
    ) -> Vec<MarketRecord> {
        let symbol = pair.symbol();
        let period = spec.time_period.to_string();
        let params = [
            ("function", spec.function.as_str()),
            ("symbol", symbol.as_str()),
            ("interval", spec.interval.as_str()),
            ("time_period", period.as_str()),
            ("series_type", SERIES_TYPE),
            ("apikey", ctx.api_key()),
        ];
        let url = match endpoint::render(&resource.api_endpoint, &params) {
            Ok(url) => url,
            Err(e) => {
                error!(resource = %resource.name, pair = %pair.display(), error = %e, "cannot build endpoint");
                return Vec::new();
            }
        };
        info!(resource = %resource.name, pair = %pair.display(), url = %ctx.redact(&url), "fetching indicator");

        match ctx.source.get_json(&url).await {
            Ok(payload) => parse_indicator(&payload, spec, pair),
            Err(e) => {
                error!(resource = %resource.name, pair = %pair.display(), error = %e, "API call failed");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl FetchStrategy for TechnicalIndicator {
    async fn fetch(
        &self,
        ctx: &FetchContext<'_>,
        resource: &ResourceDescriptor,
        pairs: &[CurrencyPair],
    ) -> Vec<MarketRecord> {
        let Some(spec) = IndicatorSpec::from_resource(resource) else {
            error!(resource = %resource.name, "indicator resource has no api_function");
            return Vec::new();
        };
        ctx.fan_out(pairs, |pair| self.fetch_pair(ctx, resource, &spec, pair).boxed())
            .await
    }
}

/// Normalize a `Technical Analysis: {FUNC}` payload for one pair.
pub fn parse_indicator(payload: &Value, spec: &IndicatorSpec, pair: &CurrencyPair) -> Vec<MarketRecord> {
    let key = spec.series_key();
    let Some(raw) = payload.get(&key) else {
        warn!(pair = %pair.display(), key = %key, "indicator key missing from payload");
        return Vec::new();
    };
    let series: IndicatorSeries = match serde_json::from_value(raw.clone()) {
        Ok(series) => series,
        Err(e) => {
            warn!(pair = %pair.display(), error = %e, "unexpected indicator payload");
            return Vec::new();
        }
    };

    let symbol = pair.display();
    series
        .iter()
        .filter_map(|(ts, values)| {
            let value = values.get(&spec.function).and_then(lenient_f64)?;
            match parse_feed_timestamp(ts) {
                Ok(timestamp) => Some(MarketRecord::Indicator {
                    timestamp,
                    symbol: symbol.clone(),
                    value,
                    interval: spec.interval.clone(),
                    time_period: spec.time_period,
                    series_type: SERIES_TYPE.to_string(),
                }),
                Err(e) => {
                    warn!(pair = %symbol, error = %e, "skipping indicator value");
                    None
                }
            }
        })
        .collect()
}
