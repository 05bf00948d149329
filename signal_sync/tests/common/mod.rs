#![allow(dead_code)]

use std::{collections::HashMap, path::PathBuf, sync::Mutex};

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Integer, Nullable, Text};
use diesel::{QueryableByName, sql_query};
use market_feeds::providers::{ApiSnafu, JsonSource, ProviderError};
use serde_json::Value;
use signal_sync::db::{connection, migrate};
use signal_sync::models::{NewCurrencyPair, NewResource};
use signal_sync::schema::{currency_pairs, resource_registry};
use tempfile::TempDir;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}
#[derive(QueryableByName)]
struct Count {
    #[diesel(sql_type = BigInt)]
    n: i64,
}

#[derive(QueryableByName, Debug, PartialEq)]
pub struct FxRow {
    #[diesel(sql_type = Text, column_name = "Timestamp")]
    pub timestamp: String,
    #[diesel(sql_type = Text, column_name = "FromSymbol")]
    pub from_symbol: String,
    #[diesel(sql_type = Text, column_name = "ToSymbol")]
    pub to_symbol: String,
    #[diesel(sql_type = Nullable<Double>, column_name = "ClosePrice")]
    pub close: Option<f64>,
}

#[derive(QueryableByName, Debug, PartialEq)]
pub struct ScalarRow {
    #[diesel(sql_type = Text)]
    pub ts: String,
    #[diesel(sql_type = Nullable<Double>)]
    pub value: Option<f64>,
}

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/test.db
}

pub fn temp_path(dir: &TempDir, file: &str) -> String {
    let mut p = PathBuf::from(dir.path());
    p.push(file);
    p.to_string_lossy().to_string()
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let path = temp_path(&dir, "test.db");

    let conn = migrate::open_warehouse(&path).expect("warehouse");
    (TestDb { _dir: dir, path }, conn)
}

/// A plain (unmigrated) database, used as a view-copy source or target.
pub fn plain_db(dir: &TempDir, file: &str) -> (String, SqliteConnection) {
    let path = temp_path(dir, file);
    let conn = connection::connect_sqlite(&path).expect("connect");
    (path, conn)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal");

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

pub fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
    let c: Count = sql_query(format!("SELECT COUNT(*) AS n FROM \"{table}\""))
        .get_result(conn)
        .unwrap();
    c.n
}

pub fn seed_pair(conn: &mut SqliteConnection, base: Option<&str>, quote: Option<&str>) {
    diesel::insert_into(currency_pairs::table)
        .values(NewCurrencyPair {
            base_currency: base,
            quote_currency: quote,
        })
        .execute(conn)
        .unwrap();
}

pub fn resource<'a>(name: &'a str, type_id: i32, table: &'a str, endpoint: &'a str, ddl: &'a str) -> NewResource<'a> {
    NewResource {
        name,
        type_id,
        target_table: table,
        api_function: None,
        api_interval: None,
        api_endpoint: endpoint,
        create_table_sql: ddl,
        merge_sql: None,
        is_active: 1,
    }
}

pub fn seed_resource(conn: &mut SqliteConnection, r: NewResource<'_>) {
    diesel::insert_into(resource_registry::table)
        .values(r)
        .execute(conn)
        .unwrap();
}

pub const FX_DAILY_DDL: &str = "CREATE TABLE IF NOT EXISTS FxDaily (
    id INTEGER PRIMARY KEY,
    Timestamp TEXT NOT NULL,
    FromSymbol TEXT NOT NULL,
    ToSymbol TEXT NOT NULL,
    OpenPrice REAL,
    HighPrice REAL,
    LowPrice REAL,
    ClosePrice REAL,
    UNIQUE (Timestamp, FromSymbol, ToSymbol)
)";

pub const FX_DAILY_ENDPOINT: &str = "https://av.test/query?function=FX_DAILY&from_symbol={from_symbol}&to_symbol={to_symbol}&apikey={apikey}";

pub fn fx_rows(conn: &mut SqliteConnection) -> Vec<FxRow> {
    sql_query("SELECT Timestamp, FromSymbol, ToSymbol, ClosePrice FROM FxDaily ORDER BY Timestamp")
        .load(conn)
        .unwrap()
}

/// Serves canned payloads by URL fragment and records every URL requested.
#[derive(Default)]
pub struct CannedSource {
    routes: HashMap<String, Value>,
    calls: Mutex<Vec<String>>,
}

impl CannedSource {
    pub fn route(mut self, fragment: &str, payload: Value) -> Self {
        self.routes.insert(fragment.to_string(), payload);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl JsonSource for CannedSource {
    async fn get_json(&self, url: &str) -> Result<Value, ProviderError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.routes.iter().find(|(fragment, _)| url.contains(fragment.as_str())) {
            Some((_, payload)) => Ok(payload.clone()),
            None => ApiSnafu {
                message: format!("no canned payload for {url}"),
            }
            .fail(),
        }
    }
}
