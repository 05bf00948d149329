//! High-water mark lookup for feed tables.

use diesel::{
    QueryableByName, RunQueryDsl, SqliteConnection, sql_query,
    sql_types::{Nullable, Text},
};
use market_feeds::models::watermark::HighWaterMark;
use tracing::debug;

use crate::{
    db::{catalog::table_columns, ident::Ident},
    writer::WriteError,
};

/// Column names recognized as a feed table's event time.
pub const TIMESTAMP_COLUMNS: [&str; 2] = ["Timestamp", "PublishedAt"];

#[derive(QueryableByName)]
struct MaxTimestamp {
    #[diesel(sql_type = Nullable<Text>)]
    hwm: Option<String>,
}

/// The first column of `table` named like a timestamp.
pub fn timestamp_column(conn: &mut SqliteConnection, table: &Ident) -> Result<Ident, WriteError> {
    let columns = table_columns(conn, table)?;
    let found = columns
        .iter()
        .find(|c| TIMESTAMP_COLUMNS.iter().any(|t| c.eq_ignore_ascii_case(t)))
        .ok_or_else(|| {
            WriteError::DataShape(format!("{table} has no Timestamp or PublishedAt column"))
        })?;
    Ok(Ident::parse(found)?)
}

/// `MAX(timestamp)` of `table`, or the floor when the table is empty.
pub fn high_water_mark(conn: &mut SqliteConnection, table: &Ident) -> Result<HighWaterMark, WriteError> {
    let column = timestamp_column(conn, table)?;
    let row: MaxTimestamp = sql_query(format!(
        "SELECT CAST(MAX({column}) AS TEXT) AS hwm FROM {table}"
    ))
    .get_result(conn)?;

    let hwm = HighWaterMark::from_stored(row.hwm.as_deref())
        .map_err(|e| WriteError::DataShape(format!("{table}.{column}: {e}")))?;
    debug!(table = %table, hwm = %hwm, "high-water mark");
    Ok(hwm)
}
