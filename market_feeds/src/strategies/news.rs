//! News sentiment for every currency in the pair table.

use std::collections::BTreeSet;

use futures::{stream, StreamExt};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    models::{currency_pair::CurrencyPair, news::NewsSentimentRecord},
    providers::{
        alpha_vantage::response::{lenient_f64, NewsItem, NewsResponse},
        endpoint,
    },
    strategies::FetchContext,
    tz::parse_news_timestamp,
};

pub const DEFAULT_NEWS_ENDPOINT: &str = "https://www.alphavantage.co/query?function=NEWS_SENTIMENT&tickers={ticker}&sort=LATEST&limit=2000&apikey={apikey}";

/// `FOREX:{ccy}` for every distinct currency on either side of a pair, sorted.
pub fn tickers_for_pairs(pairs: &[CurrencyPair]) -> Vec<String> {
    pairs
        .iter()
        .flat_map(|p| [p.base.as_str(), p.quote.as_str()])
        .map(str::trim)
        .filter(|ccy| !ccy.is_empty())
        .map(|ccy| format!("FOREX:{ccy}"))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone)]
pub struct NewsSentimentFetcher {
    endpoint_template: String,
}

impl Default for NewsSentimentFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_NEWS_ENDPOINT)
    }
}

impl NewsSentimentFetcher {
    pub fn new(endpoint_template: impl Into<String>) -> Self {
        Self {
            endpoint_template: endpoint_template.into(),
        }
    }

    /// One call per ticker; a failed ticker is logged and contributes nothing.
    pub async fn fetch(&self, ctx: &FetchContext<'_>, tickers: &[String]) -> Vec<NewsSentimentRecord> {
        stream::iter(tickers)
            .map(|ticker| self.fetch_ticker(ctx, ticker))
            .buffered(ctx.max_concurrency.max(1))
            .concat()
            .await
    }

    async fn fetch_ticker(&self, ctx: &FetchContext<'_>, ticker: &str) -> Vec<NewsSentimentRecord> {
        let url = match endpoint::render(
            &self.endpoint_template,
            &[("ticker", ticker), ("apikey", ctx.api_key())],
        ) {
            Ok(url) => url,
            Err(e) => {
                error!(ticker, error = %e, "cannot build news endpoint");
                return Vec::new();
            }
        };
        info!(ticker, url = %ctx.redact(&url), "fetching news sentiment");

        match ctx.source.get_json(&url).await {
            Ok(payload) => parse_news(&payload, ticker),
            Err(e) => {
                error!(ticker, error = %e, "API call failed");
                Vec::new()
            }
        }
    }
}

/// Normalize a `NEWS_SENTIMENT` payload queried for `ticker`.
pub fn parse_news(payload: &Value, ticker: &str) -> Vec<NewsSentimentRecord> {
    let response: NewsResponse = match serde_json::from_value(payload.clone()) {
        Ok(r) => r,
        Err(e) => {
            warn!(ticker, error = %e, "unexpected news payload");
            return Vec::new();
        }
    };
    let feed = response.feed.unwrap_or_default();
    debug!(ticker, items = feed.len(), "news feed received");
    feed.into_iter()
        .filter_map(|item| news_record(item, ticker))
        .collect()
}

fn news_record(item: NewsItem, queried: &str) -> Option<NewsSentimentRecord> {
    let published = item.time_published?;
    let sentiment_score = item.overall_sentiment_score.as_ref().and_then(lenient_f64)?;
    let sentiment_label = item.overall_sentiment_label?;
    let published_at = match parse_news_timestamp(&published) {
        Ok(ts) => ts,
        Err(e) => {
            warn!(ticker = queried, error = %e, "skipping news item");
            return None;
        }
    };

    let topics = item
        .topics
        .unwrap_or_default()
        .into_iter()
        .filter_map(|t| t.topic)
        .collect::<Vec<_>>()
        .join(", ");
    let ticker = item
        .ticker_sentiment
        .unwrap_or_default()
        .into_iter()
        .find_map(|t| t.ticker)
        .unwrap_or_else(|| queried.to_string());
    let relevance_score = item
        .relevance_score
        .as_ref()
        .and_then(lenient_f64)
        .unwrap_or(0.0);

    Some(NewsSentimentRecord {
        published_at,
        ticker,
        topics,
        sentiment_score,
        sentiment_label,
        relevance_score,
        source: item.source,
        article_url: item.url,
        summary: item.summary,
    })
}
