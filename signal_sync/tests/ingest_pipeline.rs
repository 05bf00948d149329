mod common;
use common::*;

use chrono_tz::US::Central;
use diesel::{connection::SimpleConnection, prelude::*, sql_query};
use market_feeds::{
    models::record::MarketRecord,
    strategies::FetchContext,
    tz::parse_stored_timestamp,
};
use secrecy::SecretString;
use serde_json::{Value, json};
use signal_sync::{
    db::ident::Ident,
    pipeline::{IngestJob, ResourceStatus, RunReport},
    writer::{RowLayout, merge_records},
};

fn bar(close: &str) -> Value {
    json!({"1. open": "1.00", "2. high": "1.20", "3. low": "0.90", "4. close": close})
}

fn usd_eur_daily() -> Value {
    json!({
        "Meta Data": {"1. Information": "Forex Daily Prices (open, high, low, close)"},
        "Time Series FX (Daily)": {
            "2024-01-03": bar("1.10"),
            "2023-12-30": bar("1.05")
        }
    })
}

async fn run(conn: &mut SqliteConnection, source: &CannedSource) -> RunReport {
    let key = SecretString::from("test-key");
    let ctx = FetchContext {
        source,
        api_key: &key,
        target_tz: Central,
        max_concurrency: 1,
    };
    IngestJob::new(ctx).run(conn).await.expect("ingest run")
}

fn seed_fx_daily(conn: &mut SqliteConnection) {
    seed_resource(conn, resource("FX Daily", 6, "FxDaily", FX_DAILY_ENDPOINT, FX_DAILY_DDL));
    seed_pair(conn, Some("USD"), Some("EUR"));
}

#[tokio::test]
async fn daily_bars_after_the_mark_are_written_in_target_zone() {
    let (_db, mut conn) = setup_db();
    seed_fx_daily(&mut conn);
    conn.batch_execute(FX_DAILY_DDL).unwrap();
    conn.batch_execute(
        "INSERT INTO FxDaily (Timestamp, FromSymbol, ToSymbol, ClosePrice)
         VALUES ('2024-01-01 00:00:00', 'USD', 'EUR', 1.00)",
    )
    .unwrap();
    let source = CannedSource::default().route("from_symbol=USD&to_symbol=EUR", usd_eur_daily());

    let report = run(&mut conn, &source).await;

    assert_eq!(
        report.resources[0].status,
        ResourceStatus::Written { fetched: 2, fresh: 1, merged: 1 }
    );
    let rows = fx_rows(&mut conn);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].timestamp, "2024-01-02 18:00:00");
    assert_eq!(rows[1].close, Some(1.10));
    assert_eq!(
        source.calls(),
        vec!["https://av.test/query?function=FX_DAILY&from_symbol=USD&to_symbol=EUR&apikey=test-key"]
    );
}

#[tokio::test]
async fn second_run_over_unchanged_feed_writes_nothing() {
    let (_db, mut conn) = setup_db();
    seed_fx_daily(&mut conn);
    let source = CannedSource::default().route("from_symbol=USD", usd_eur_daily());

    let first = run(&mut conn, &source).await;
    assert_eq!(first.merged_rows(), 2);

    let second = run(&mut conn, &source).await;
    assert_eq!(
        second.resources[0].status,
        ResourceStatus::Written { fetched: 2, fresh: 0, merged: 0 }
    );
    assert_eq!(count(&mut conn, "FxDaily"), 2);
}

#[tokio::test]
async fn unknown_type_is_skipped_and_siblings_still_run() {
    let (_db, mut conn) = setup_db();
    seed_resource(&mut conn, resource("Mystery", 3, "Mystery", "https://av.test/q?apikey={apikey}", "CREATE TABLE Mystery (x)"));
    seed_fx_daily(&mut conn);
    let source = CannedSource::default().route("from_symbol=USD", usd_eur_daily());

    let report = run(&mut conn, &source).await;

    assert!(matches!(report.resources[0].status, ResourceStatus::Skipped { .. }));
    assert!(matches!(report.resources[1].status, ResourceStatus::Written { merged: 2, .. }));
    assert_eq!((report.skipped(), report.written(), report.failed()), (1, 1, 0));
    // the skipped resource's DDL never ran
    let mystery = Ident::parse("Mystery").unwrap();
    assert!(!signal_sync::db::catalog::table_exists(&mut conn, &mystery).unwrap());
    assert_eq!(source.calls().len(), 1);
}

#[tokio::test]
async fn invalid_table_name_fails_only_that_resource() {
    let (_db, mut conn) = setup_db();
    seed_resource(&mut conn, resource("Evil", 6, "FxDaily; DROP TABLE currency_pairs", FX_DAILY_ENDPOINT, FX_DAILY_DDL));
    seed_fx_daily(&mut conn);
    let source = CannedSource::default().route("from_symbol=USD", usd_eur_daily());

    let report = run(&mut conn, &source).await;

    assert!(matches!(&report.resources[0].status, ResourceStatus::Failed { error } if error.contains("outside")));
    assert!(matches!(report.resources[1].status, ResourceStatus::Written { merged: 2, .. }));
    assert_eq!(count(&mut conn, "currency_pairs"), 1);
}

#[tokio::test]
async fn ddl_that_creates_a_different_table_is_a_failure() {
    let (_db, mut conn) = setup_db();
    seed_resource(&mut conn, resource("Typo", 6, "FxDaily", FX_DAILY_ENDPOINT, "CREATE TABLE IF NOT EXISTS FxDayly (x)"));
    seed_pair(&mut conn, Some("USD"), Some("EUR"));
    let source = CannedSource::default();

    let report = run(&mut conn, &source).await;

    assert!(matches!(&report.resources[0].status, ResourceStatus::Failed { error } if error.contains("does not exist")));
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn economic_series_skips_placeholders_and_discovers_value_column() {
    let (_db, mut conn) = setup_db();
    seed_resource(
        &mut conn,
        resource(
            "CPI",
            1,
            "Cpi",
            "https://av.test/query?function=CPI&interval=monthly&apikey={apikey}",
            "CREATE TABLE IF NOT EXISTS Cpi (id INTEGER PRIMARY KEY, Timestamp TEXT NOT NULL UNIQUE, CpiValue REAL)",
        ),
    );
    let source = CannedSource::default().route(
        "function=CPI",
        json!({"name": "CPI", "data": [
            {"date": "2024-02-01", "value": "310.326"},
            {"date": "2024-01-01", "value": "."},
            {"date": "2023-12-01", "value": "306.746"},
            {"value": "1.0"}
        ]}),
    );

    let report = run(&mut conn, &source).await;

    assert_eq!(
        report.resources[0].status,
        ResourceStatus::Written { fetched: 2, fresh: 2, merged: 2 }
    );
    let rows: Vec<ScalarRow> = sql_query("SELECT Timestamp AS ts, CpiValue AS value FROM Cpi ORDER BY Timestamp")
        .load(&mut conn)
        .unwrap();
    assert_eq!(rows[0], ScalarRow { ts: "2023-12-01 00:00:00".into(), value: Some(306.746) });
    assert_eq!(rows[1].ts, "2024-02-01 00:00:00");
}

#[tokio::test]
async fn indicator_rows_carry_pair_and_parameters() {
    let (_db, mut conn) = setup_db();
    let mut sma = resource(
        "SMA",
        2,
        "Sma",
        "https://av.test/query?function={function}&symbol={symbol}&interval={interval}&time_period={time_period}&series_type={series_type}&apikey={apikey}",
        "CREATE TABLE IF NOT EXISTS Sma (
            Timestamp TEXT NOT NULL, Symbol TEXT NOT NULL, SMA_Value REAL,
            Interval TEXT, TimePeriod INTEGER, SeriesType TEXT,
            PRIMARY KEY (Timestamp, Symbol))",
    );
    sma.api_function = Some("sma");
    sma.api_interval = Some("daily:50");
    seed_resource(&mut conn, sma);
    seed_pair(&mut conn, Some("USD"), Some("EUR"));
    let source = CannedSource::default().route(
        "symbol=USDEUR",
        json!({"Technical Analysis: SMA": {
            "2024-01-05": {"SMA": "0.9150"},
            "2024-01-04": {"SMA": "0.9140"}
        }}),
    );

    let report = run(&mut conn, &source).await;

    assert!(matches!(report.resources[0].status, ResourceStatus::Written { merged: 2, .. }));
    #[derive(diesel::QueryableByName)]
    struct Row {
        #[diesel(sql_type = diesel::sql_types::Text, column_name = "Symbol")]
        symbol: String,
        #[diesel(sql_type = diesel::sql_types::Integer, column_name = "TimePeriod")]
        period: i32,
        #[diesel(sql_type = diesel::sql_types::Text, column_name = "SeriesType")]
        series_type: String,
    }
    let rows: Vec<Row> = sql_query("SELECT Symbol, TimePeriod, SeriesType FROM Sma").load(&mut conn).unwrap();
    assert!(rows.iter().all(|r| r.symbol == "USD/EUR" && r.period == 50 && r.series_type == "close"));
    assert!(source.calls()[0].contains("interval=daily&time_period=50&series_type=close"));
}

#[tokio::test]
async fn resource_merge_statement_override_is_used() {
    let (_db, mut conn) = setup_db();
    let mut wti = resource(
        "WTI",
        4,
        "Wti",
        "https://av.test/query?function=WTI&apikey={apikey}",
        "CREATE TABLE IF NOT EXISTS Wti (Timestamp TEXT PRIMARY KEY, ClosePrice REAL, Source TEXT)",
    );
    wti.merge_sql = Some(
        "INSERT OR REPLACE INTO Wti (Timestamp, ClosePrice, Source)
         SELECT json_extract(value, '$.Timestamp'), json_extract(value, '$.ClosePrice'), 'override'
         FROM json_each(?)",
    );
    seed_resource(&mut conn, wti);
    let source = CannedSource::default().route(
        "function=WTI",
        json!({"data": [{"date": "2024-01-02", "value": "71.2"}]}),
    );

    let report = run(&mut conn, &source).await;

    assert!(matches!(report.resources[0].status, ResourceStatus::Written { merged: 1, .. }));
    #[derive(diesel::QueryableByName)]
    struct Tagged {
        #[diesel(sql_type = diesel::sql_types::Text, column_name = "Source")]
        source: String,
    }
    let tagged: Tagged = sql_query("SELECT Source FROM Wti").get_result(&mut conn).unwrap();
    assert_eq!(tagged.source, "override");
}

#[test]
fn same_key_with_changed_value_updates_in_place() {
    let (_db, mut conn) = setup_db();
    conn.batch_execute(FX_DAILY_DDL).unwrap();
    let table = Ident::parse("FxDaily").unwrap();
    let layout = RowLayout::fx_bar();
    let bar = |close: f64| MarketRecord::FxBar {
        timestamp: parse_stored_timestamp("2024-01-02 18:00:00").unwrap(),
        from_symbol: "USD".into(),
        to_symbol: "EUR".into(),
        open: 1.0,
        high: 1.2,
        low: 0.9,
        close,
    };

    assert_eq!(merge_records(&mut conn, &table, &layout, None, &[bar(1.10)]).unwrap(), 1);
    merge_records(&mut conn, &table, &layout, None, &[bar(1.25)]).unwrap();

    let rows = fx_rows(&mut conn);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].close, Some(1.25));
}

#[test]
fn failed_merge_rolls_back_the_whole_batch() {
    let (_db, mut conn) = setup_db();
    // no unique constraint: ON CONFLICT cannot resolve and the statement fails
    conn.batch_execute("CREATE TABLE Loose (Timestamp TEXT, ClosePrice REAL)").unwrap();
    let table = Ident::parse("Loose").unwrap();
    let layout = RowLayout::scalar(Ident::parse("ClosePrice").unwrap());
    let rec = MarketRecord::Scalar {
        timestamp: parse_stored_timestamp("2024-01-02 00:00:00").unwrap(),
        value: 1.0,
    };

    assert!(merge_records(&mut conn, &table, &layout, None, &[rec.clone(), rec]).is_err());
    assert_eq!(count(&mut conn, "Loose"), 0);
}
