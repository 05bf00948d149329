//! Per-feed-kind fetch strategies.
//!
//! Each [`FeedKind`] maps to one [`FetchStrategy`] through [`strategy_for`]. A
//! strategy renders the resource's endpoint, asks the [`JsonSource`] for the
//! payload and normalizes it into [`MarketRecord`]s. Strategies never fail a whole
//! resource: a bad pair, a bad payload or a bad record is logged and skipped, and
//! whatever else could be read is returned.

pub mod economic;
pub mod fx;
pub mod indicator;
pub mod news;

use async_trait::async_trait;
use chrono_tz::Tz;
use futures::{future::BoxFuture, stream, StreamExt};
use secrecy::{ExposeSecret, SecretString};

use crate::{
    filter::retain_newer,
    models::{
        currency_pair::CurrencyPair, feed_kind::FeedKind, record::MarketRecord,
        resource::ResourceDescriptor, watermark::HighWaterMark,
    },
    providers::{endpoint, JsonSource},
};

pub use economic::ObservationSeries;
pub use fx::FxBars;
pub use indicator::TechnicalIndicator;
pub use news::NewsSentimentFetcher;

/// Everything a strategy needs besides the resource itself.
pub struct FetchContext<'a> {
    pub source: &'a dyn JsonSource,
    pub api_key: &'a SecretString,
    /// Zone the warehouse stores timestamps in.
    pub target_tz: Tz,
    /// Upper bound on in-flight per-pair requests; 0 is treated as 1.
    pub max_concurrency: usize,
}

impl FetchContext<'_> {
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// `url` with the API key masked, for logs.
    pub fn redact(&self, url: &str) -> String {
        endpoint::redact(url, self.api_key())
    }

    fn concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }

    /// Run `per_pair` for every pair with bounded concurrency and concatenate the
    /// results in pair order.
    pub(crate) async fn fan_out<'p, F>(&self, pairs: &'p [CurrencyPair], per_pair: F) -> Vec<MarketRecord>
    where
        F: Fn(&'p CurrencyPair) -> BoxFuture<'p, Vec<MarketRecord>>,
    {
        let futures: Vec<BoxFuture<'p, Vec<MarketRecord>>> = pairs.iter().map(per_pair).collect();
        stream::iter(futures)
            .buffered(self.concurrency())
            .concat()
            .await
    }
}

#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Fetch and normalize every record currently available for `resource`.
    ///
    /// `pairs` is ignored by global feeds.
    async fn fetch(
        &self,
        ctx: &FetchContext<'_>,
        resource: &ResourceDescriptor,
        pairs: &[CurrencyPair],
    ) -> Vec<MarketRecord>;

    /// [`fetch`](Self::fetch), then keep only records strictly newer than `hwm`.
    async fn fetch_newer(
        &self,
        ctx: &FetchContext<'_>,
        resource: &ResourceDescriptor,
        pairs: &[CurrencyPair],
        hwm: HighWaterMark,
    ) -> Vec<MarketRecord> {
        retain_newer(self.fetch(ctx, resource, pairs).await, hwm)
    }
}

pub fn strategy_for(kind: FeedKind) -> Box<dyn FetchStrategy> {
    match kind {
        FeedKind::EconomicSeries | FeedKind::Commodity => Box::new(ObservationSeries),
        FeedKind::TechnicalIndicator => Box::new(TechnicalIndicator),
        FeedKind::FxIntraday => Box::new(FxBars::intraday()),
        FeedKind::FxDaily => Box::new(FxBars::daily()),
    }
}
