use chrono::NaiveDateTime;
use serde::Serialize;

/// One article's sentiment for one ticker, ready for the staging table.
///
/// Unique on `(published_at, ticker)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsSentimentRecord {
    pub published_at: NaiveDateTime,
    /// e.g. "FOREX:USD".
    pub ticker: String,
    /// Topic names joined with ", ".
    pub topics: String,
    pub sentiment_score: f64,
    pub sentiment_label: String,
    pub relevance_score: f64,
    pub source: Option<String>,
    pub article_url: Option<String>,
    pub summary: Option<String>,
}
