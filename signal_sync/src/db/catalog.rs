//! Catalog lookups.

use diesel::{
    QueryResult, QueryableByName, RunQueryDsl, SqliteConnection, sql_query,
    sql_types::{BigInt, Text},
};

use crate::db::ident::Ident;

#[derive(QueryableByName)]
struct Present {
    #[diesel(sql_type = BigInt)]
    present: i64,
}

#[derive(QueryableByName)]
struct ColumnName {
    #[diesel(sql_type = Text)]
    name: String,
}

/// Whether a table called `table` exists (SQLite names are case-insensitive).
pub fn table_exists(conn: &mut SqliteConnection, table: &Ident) -> QueryResult<bool> {
    let row: Present = sql_query(
        "SELECT COUNT(*) AS present FROM sqlite_master \
         WHERE type = 'table' AND name = ? COLLATE NOCASE",
    )
    .bind::<Text, _>(table.as_str())
    .get_result(conn)?;
    Ok(row.present > 0)
}

/// Column names of `table` in declaration order; empty when the table is missing.
pub fn table_columns(conn: &mut SqliteConnection, table: &Ident) -> QueryResult<Vec<String>> {
    let rows: Vec<ColumnName> = sql_query("SELECT name FROM pragma_table_info(?) ORDER BY cid")
        .bind::<Text, _>(table.as_str())
        .load(conn)?;
    Ok(rows.into_iter().map(|r| r.name).collect())
}
