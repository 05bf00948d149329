//! Batched writes into feed tables.
//!
//! ## Merge path
//! A resource's fresh records are serialized to one JSON array of row objects and
//! bound as the only parameter of one statement. The statement is either the
//! resource's own `merge_sql` (which must read its rows from `json_each(?)`) or the
//! generated upsert:
//!
//! ```sql
//! INSERT INTO "FxDaily" ("Timestamp", "FromSymbol", ...)
//! SELECT json_extract(value, '$.Timestamp'), json_extract(value, '$.FromSymbol'), ...
//! FROM json_each(?) WHERE true
//! ON CONFLICT ("Timestamp", "FromSymbol", "ToSymbol") DO UPDATE SET "OpenPrice" = excluded."OpenPrice", ...
//! ```
//!
//! The destination table needs a unique constraint on the key columns for
//! `ON CONFLICT` to resolve. Each resource merges in its own transaction.
//!
//! ## Record-at-a-time path
//! [`news::insert_news_if_absent`] probes and inserts row by row, for staging tables
//! where a single bad record must not sink the batch.

pub mod layout;
pub mod news;

use diesel::{Connection, RunQueryDsl, SqliteConnection, sql_query, sql_types::Text};
use market_feeds::models::record::MarketRecord;
use thiserror::Error;
use tracing::{debug, info};

use crate::db::ident::{Ident, IdentError};

pub use layout::{RowLayout, resolve_layout};

#[derive(Debug, Error)]
pub enum WriteError {
    #[error(transparent)]
    Ident(#[from] IdentError),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("failed to encode batch: {0}")]
    Encode(#[from] serde_json::Error),
    /// The destination table or a record does not look the way the resource says it should.
    #[error("data shape mismatch: {0}")]
    DataShape(String),
}

/// The generated upsert for `layout` into `table`.
pub fn upsert_statement(table: &Ident, layout: &RowLayout) -> String {
    let columns = layout.columns();
    let insert_cols = columns.iter().map(Ident::quoted).collect::<Vec<_>>().join(", ");
    let extracts = columns
        .iter()
        .map(|c| format!("json_extract(value, '$.{}')", c.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let key_cols = layout.key().iter().map(Ident::quoted).collect::<Vec<_>>().join(", ");
    let updates = layout
        .non_key()
        .map(|c| format!("{0} = excluded.{0}", c.quoted()))
        .collect::<Vec<_>>();
    let action = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };

    format!(
        "INSERT INTO {table} ({insert_cols}) SELECT {extracts} FROM json_each(?) WHERE true \
         ON CONFLICT ({key_cols}) {action}"
    )
}

/// Merge `records` into `table` as one statement inside one transaction.
///
/// Returns the number of rows the statement inserted or updated. An empty batch
/// touches nothing.
pub fn merge_records(
    conn: &mut SqliteConnection,
    table: &Ident,
    layout: &RowLayout,
    merge_override: Option<&str>,
    records: &[MarketRecord],
) -> Result<usize, WriteError> {
    if records.is_empty() {
        debug!(table = %table, "no fresh records");
        return Ok(0);
    }

    let rows = records
        .iter()
        .map(|r| layout.row(r))
        .collect::<Result<Vec<_>, _>>()?;
    let payload = serde_json::to_string(&rows)?;

    let statement = match merge_override.map(str::trim).filter(|s| !s.is_empty()) {
        Some(custom) => custom.to_string(),
        None => upsert_statement(table, layout),
    };

    let merged = conn.transaction(|conn| {
        sql_query(&statement)
            .bind::<Text, _>(&payload)
            .execute(conn)
    })?;
    info!(table = %table, records = records.len(), merged, "merge committed");
    Ok(merged)
}
