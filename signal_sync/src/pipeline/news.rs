//! News sentiment run.

use anyhow::Context;
use diesel::SqliteConnection;
use market_feeds::strategies::{FetchContext, NewsSentimentFetcher, news::tickers_for_pairs};
use serde::Serialize;
use tracing::info;

use crate::{registry, writer::news::insert_news_if_absent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NewsReport {
    pub tickers: usize,
    pub collected: usize,
    pub inserted: usize,
}

pub struct NewsJob<'a> {
    ctx: FetchContext<'a>,
    fetcher: NewsSentimentFetcher,
}

impl<'a> NewsJob<'a> {
    pub fn new(ctx: FetchContext<'a>, fetcher: NewsSentimentFetcher) -> Self {
        Self { ctx, fetcher }
    }

    pub async fn run(&self, conn: &mut SqliteConnection) -> anyhow::Result<NewsReport> {
        let pairs = registry::currency_pairs(conn).context("reading currency pairs")?;
        let tickers = tickers_for_pairs(&pairs);
        info!(tickers = tickers.len(), "news run started");

        let records = self.fetcher.fetch(&self.ctx, &tickers).await;
        let inserted = insert_news_if_absent(conn, &records).context("staging news records")?;

        let report = NewsReport {
            tickers: tickers.len(),
            collected: records.len(),
            inserted,
        };
        info!(collected = report.collected, inserted = report.inserted, "news run finished");
        Ok(report)
    }
}
