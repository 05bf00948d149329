use diesel::prelude::*;
use market_feeds::models::news::NewsSentimentRecord;
use tracing::{info, warn};

use crate::{models::NewNewsSentiment, schema::staging_news_sentiment as sns, writer::WriteError};

/// Insert each record unless `(published_at, ticker)` is already staged.
///
/// All records share one transaction. A record whose probe or insert fails is
/// logged and skipped; the rest still commit. Returns the number inserted.
pub fn insert_news_if_absent(
    conn: &mut SqliteConnection,
    records: &[NewsSentimentRecord],
) -> Result<usize, WriteError> {
    let inserted = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let mut inserted = 0;
        for record in records {
            let row = NewNewsSentiment::from(record);
            match insert_one(conn, &row) {
                Ok(true) => inserted += 1,
                Ok(false) => {}
                Err(e) => warn!(
                    ticker = %row.ticker,
                    published_at = %row.published_at,
                    error = %e,
                    "skipping news record"
                ),
            }
        }
        Ok(inserted)
    })?;
    info!(records = records.len(), inserted, "news staging committed");
    Ok(inserted)
}

fn insert_one(conn: &mut SqliteConnection, row: &NewNewsSentiment) -> QueryResult<bool> {
    let existing: i64 = sns::table
        .filter(sns::published_at.eq(&row.published_at))
        .filter(sns::ticker.eq(&row.ticker))
        .count()
        .get_result(conn)?;
    if existing > 0 {
        return Ok(false);
    }
    diesel::insert_into(sns::table).values(row).execute(conn)?;
    Ok(true)
}
