//! Diesel row types for the tables owned by the embedded migrations.
//!
//! - [`ResourceRow`] reads `resource_registry` and converts into the feed-side
//!   [`ResourceDescriptor`].
//! - [`NewResource`] and [`NewCurrencyPair`] seed the registry (tests, bootstrap scripts).
//! - [`NewNewsSentiment`] is one staged news row.

use diesel::prelude::*;
use market_feeds::models::{news::NewsSentimentRecord, resource::ResourceDescriptor};
use market_feeds::tz::format_sql;

use crate::schema::{currency_pairs, resource_registry, staging_news_sentiment};

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = resource_registry)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ResourceRow {
    pub id: i32,
    pub name: String,
    pub type_id: i32,
    pub target_table: String,
    pub api_function: Option<String>,
    pub api_interval: Option<String>,
    pub api_endpoint: String,
    pub create_table_sql: String,
    pub merge_sql: Option<String>,
    pub is_active: i32,
}

impl From<ResourceRow> for ResourceDescriptor {
    fn from(row: ResourceRow) -> Self {
        ResourceDescriptor {
            resource_id: row.id,
            name: row.name,
            type_id: row.type_id,
            target_table: row.target_table,
            api_function: row.api_function,
            api_interval: row.api_interval,
            api_endpoint: row.api_endpoint,
            create_table_sql: row.create_table_sql,
            merge_sql: row.merge_sql,
        }
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = resource_registry)]
pub struct NewResource<'a> {
    pub name: &'a str,
    pub type_id: i32,
    pub target_table: &'a str,
    pub api_function: Option<&'a str>,
    pub api_interval: Option<&'a str>,
    pub api_endpoint: &'a str,
    pub create_table_sql: &'a str,
    pub merge_sql: Option<&'a str>,
    pub is_active: i32,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = currency_pairs)]
pub struct NewCurrencyPair<'a> {
    pub base_currency: Option<&'a str>,
    pub quote_currency: Option<&'a str>,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = staging_news_sentiment)]
pub struct NewNewsSentiment {
    pub published_at: String,
    pub ticker: String,
    pub topics: String,
    pub sentiment_score: f64,
    pub sentiment_label: String,
    pub relevance_score: f64,
    pub source: Option<String>,
    pub article_url: Option<String>,
    pub summary: Option<String>,
}

impl From<&NewsSentimentRecord> for NewNewsSentiment {
    fn from(r: &NewsSentimentRecord) -> Self {
        Self {
            published_at: format_sql(r.published_at),
            ticker: r.ticker.clone(),
            topics: r.topics.clone(),
            sentiment_score: r.sentiment_score,
            sentiment_label: r.sentiment_label.clone(),
            relevance_score: r.relevance_score,
            source: r.source.clone(),
            article_url: r.article_url.clone(),
            summary: r.summary.clone(),
        }
    }
}
