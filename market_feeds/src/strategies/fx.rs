//! FX OHLC bars per currency pair: intraday (type 5) and daily (type 6).
//!
//! Vendor bar timestamps are UTC; each bar is re-expressed in the warehouse zone
//! before it is compared with the high-water mark or written.

use async_trait::async_trait;
use chrono_tz::Tz;
use futures::FutureExt;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{
    models::{currency_pair::CurrencyPair, record::MarketRecord, resource::ResourceDescriptor},
    providers::{alpha_vantage::response::{lenient_f64, FxSeries}, endpoint},
    strategies::{FetchContext, FetchStrategy},
    tz::{parse_feed_timestamp, utc_to_zone},
};

pub const DEFAULT_INTRADAY_INTERVAL: &str = "5min";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FxBars {
    intraday: bool,
}

impl FxBars {
    pub fn intraday() -> Self {
        Self { intraday: true }
    }

    pub fn daily() -> Self {
        Self { intraday: false }
    }

    fn interval(&self, resource: &ResourceDescriptor) -> String {
        resource
            .interval()
            .unwrap_or_else(|| DEFAULT_INTRADAY_INTERVAL.to_string())
    }

    /// Payload key holding the bars.
    pub fn series_key(&self, resource: &ResourceDescriptor) -> String {
        if self.intraday {
            format!("Time Series FX ({})", self.interval(resource))
        } else {
            "Time Series FX (Daily)".to_string()
        }
    }

    async fn fetch_pair(
        &self,
        ctx: &FetchContext<'_>,
        resource: &ResourceDescriptor,
        pair: &CurrencyPair,
    ) -> Vec<MarketRecord> {
        let interval = self.interval(resource);
        let function = resource.function_upper();
        let mut params = vec![
            ("from_symbol", pair.base.as_str()),
            ("to_symbol", pair.quote.as_str()),
            ("interval", interval.as_str()),
            ("apikey", ctx.api_key()),
        ];
        if let Some(function) = function.as_deref() {
            params.push(("function", function));
        }

        let url = match endpoint::render(&resource.api_endpoint, &params) {
            Ok(url) => url,
            Err(e) => {
                error!(resource = %resource.name, pair = %pair.display(), error = %e, "cannot build endpoint");
                return Vec::new();
            }
        };
        info!(resource = %resource.name, pair = %pair.display(), url = %ctx.redact(&url), "fetching fx bars");

        match ctx.source.get_json(&url).await {
            Ok(payload) => parse_fx_bars(&payload, &self.series_key(resource), pair, ctx.target_tz),
            Err(e) => {
                error!(resource = %resource.name, pair = %pair.display(), error = %e, "API call failed");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl FetchStrategy for FxBars {
    async fn fetch(
        &self,
        ctx: &FetchContext<'_>,
        resource: &ResourceDescriptor,
        pairs: &[CurrencyPair],
    ) -> Vec<MarketRecord> {
        ctx.fan_out(pairs, |pair| self.fetch_pair(ctx, resource, pair).boxed())
            .await
    }
}

/// Normalize the bars under `key`, converting timestamps from UTC to `tz`.
///
/// A bar missing any of open, high, low or close is skipped.
pub fn parse_fx_bars(payload: &Value, key: &str, pair: &CurrencyPair, tz: Tz) -> Vec<MarketRecord> {
    let Some(raw) = payload.get(key) else {
        warn!(pair = %pair.display(), key, "series key missing from payload");
        return Vec::new();
    };
    let series: FxSeries = match serde_json::from_value(raw.clone()) {
        Ok(series) => series,
        Err(e) => {
            warn!(pair = %pair.display(), error = %e, "unexpected fx payload");
            return Vec::new();
        }
    };

    let mut records = Vec::with_capacity(series.len());
    for (ts, bar) in &series {
        let utc = match parse_feed_timestamp(ts) {
            Ok(utc) => utc,
            Err(e) => {
                warn!(pair = %pair.display(), error = %e, "skipping bar");
                continue;
            }
        };
        let ohlc = [&bar.open, &bar.high, &bar.low, &bar.close]
            .map(|field| field.as_ref().and_then(lenient_f64));
        let [Some(open), Some(high), Some(low), Some(close)] = ohlc else {
            warn!(pair = %pair.display(), timestamp = %ts, "skipping incomplete bar");
            continue;
        };
        records.push(MarketRecord::FxBar {
            timestamp: utc_to_zone(utc, tz),
            from_symbol: pair.base.clone(),
            to_symbol: pair.quote.clone(),
            open,
            high,
            low,
            close,
        });
    }
    records
}
