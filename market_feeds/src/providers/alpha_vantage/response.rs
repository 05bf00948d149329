//! Serde shapes for the AlphaVantage payloads the strategies read.
//!
//! The vendor encodes numbers as strings, uses "." for a missing observation, and
//! is loose about which fields are present, so every leaf is optional and numbers
//! go through [`lenient_f64`].

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// `{"data": [{"date": "...", "value": "..."}]}` as returned by economic and commodity series.
#[derive(Deserialize, Debug, Default)]
pub struct ObservationResponse {
    #[serde(default)]
    pub data: Option<Vec<Observation>>,
}

#[derive(Deserialize, Debug)]
pub struct Observation {
    pub date: Option<String>,
    pub value: Option<Value>,
}

/// One entry under `Time Series FX (...)`.
#[derive(Deserialize, Debug)]
pub struct FxBarFields {
    #[serde(rename = "1. open")]
    pub open: Option<Value>,
    #[serde(rename = "2. high")]
    pub high: Option<Value>,
    #[serde(rename = "3. low")]
    pub low: Option<Value>,
    #[serde(rename = "4. close")]
    pub close: Option<Value>,
}

/// Timestamp key -> bar, in payload order.
pub type FxSeries = IndexMap<String, FxBarFields>;

/// Timestamp key -> `{FUNCTION: "value", ...}`, in payload order.
pub type IndicatorSeries = IndexMap<String, IndexMap<String, Value>>;

/// `{"feed": [...]}` from `NEWS_SENTIMENT`.
#[derive(Deserialize, Debug, Default)]
pub struct NewsResponse {
    #[serde(default)]
    pub feed: Option<Vec<NewsItem>>,
}

#[derive(Deserialize, Debug)]
pub struct NewsItem {
    pub time_published: Option<String>,
    pub overall_sentiment_score: Option<Value>,
    pub overall_sentiment_label: Option<String>,
    pub relevance_score: Option<Value>,
    pub source: Option<String>,
    pub url: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub topics: Option<Vec<NewsTopic>>,
    #[serde(default)]
    pub ticker_sentiment: Option<Vec<TickerSentiment>>,
}

#[derive(Deserialize, Debug)]
pub struct NewsTopic {
    pub topic: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct TickerSentiment {
    pub ticker: Option<String>,
}

/// Read a vendor number that may be a JSON number or a numeric string.
///
/// `"."`, blanks, non-numeric text and non-finite values all read as `None`.
pub fn lenient_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s == "." {
                None
            } else {
                s.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}
