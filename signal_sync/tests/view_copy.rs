mod common;
use common::*;

use std::{path::Path, sync::Arc};

use diesel::{connection::SimpleConnection, prelude::*};
use signal_sync::{
    jobs::{self, ViewOverrides},
    settings::Settings,
    views::{CopyOptions, CopyOutcome, CopySummary, ViewStatus, catalog::list_views, copy_views},
};
use tempfile::TempDir;

const BASE_TABLES: &str = "
    CREATE TABLE FxDaily (Timestamp TEXT, FromSymbol TEXT, ToSymbol TEXT, ClosePrice REAL);
    CREATE TABLE Cpi (Timestamp TEXT PRIMARY KEY, CpiValue REAL);
";

const SOURCE_VIEWS: &str = "
    CREATE VIEW v_latest_fx AS SELECT FromSymbol, ToSymbol, MAX(Timestamp) AS ts FROM FxDaily GROUP BY 1, 2;
    CREATE VIEW v_pairs AS SELECT FromSymbol || '/' || ToSymbol AS pair FROM v_latest_fx;
    CREATE VIEW v_cpi AS SELECT * FROM Cpi;
";

fn source_and_target(dir: &TempDir) -> (String, SqliteConnection, String, SqliteConnection) {
    let (src_path, mut src) = plain_db(dir, "source.db");
    src.batch_execute(BASE_TABLES).unwrap();
    src.batch_execute(SOURCE_VIEWS).unwrap();
    let (dst_path, mut dst) = plain_db(dir, "target.db");
    dst.batch_execute(BASE_TABLES).unwrap();
    (src_path, src, dst_path, dst)
}

fn options(views: &[&str], drop_existing: bool) -> CopyOptions {
    CopyOptions {
        views: views.iter().map(|v| v.to_string()).collect(),
        drop_existing,
        create_schemas: true,
    }
}

fn view_names(conn: &mut SqliteConnection) -> Vec<String> {
    list_views(conn, &[]).unwrap().into_iter().map(|v| v.name).collect()
}

#[test]
fn copies_every_view_in_name_order() {
    let dir = TempDir::new().unwrap();
    let (src_path, mut src, dst_path, mut dst) = source_and_target(&dir);
    let mut summary = CopySummary::start(&src_path, &dst_path, false);

    copy_views(&mut src, Some(&mut dst), &options(&[], true), &mut summary);

    assert_eq!(summary.outcome(), CopyOutcome::Success);
    assert_eq!((summary.total_views, summary.successful, summary.failed), (3, 3, 0));
    assert!(summary.end_time.is_some());
    assert!(summary.errors.is_empty());
    let order: Vec<&str> = summary.view_details.iter().map(|d| d.view.as_str()).collect();
    assert_eq!(order, ["v_cpi", "v_latest_fx", "v_pairs"]);
    assert_eq!(summary.view_details[2].dependencies, ["main.v_latest_fx"]);
    assert_eq!(summary.view_details[1].dependencies, ["main.FxDaily"]);
    assert!(summary.view_details.iter().all(|d| d.schema == "main"));
    assert_eq!(view_names(&mut dst), ["v_cpi", "v_latest_fx", "v_pairs"]);
}

#[test]
fn rerun_with_drop_replaces_existing_views() {
    let dir = TempDir::new().unwrap();
    let (src_path, mut src, dst_path, mut dst) = source_and_target(&dir);
    dst.batch_execute("CREATE VIEW v_cpi AS SELECT 1 AS stale").unwrap();
    let mut summary = CopySummary::start(&src_path, &dst_path, false);

    copy_views(&mut src, Some(&mut dst), &options(&["v_cpi"], true), &mut summary);

    assert_eq!(summary.outcome(), CopyOutcome::Success);
    #[derive(diesel::QueryableByName)]
    struct Sql {
        #[diesel(sql_type = diesel::sql_types::Text)]
        sql: String,
    }
    let stored: Sql = diesel::sql_query("SELECT sql FROM sqlite_master WHERE name = 'v_cpi'")
        .get_result(&mut dst)
        .unwrap();
    assert!(stored.sql.contains("FROM Cpi"));
}

#[test]
fn existing_view_without_drop_is_a_partial_success() {
    let dir = TempDir::new().unwrap();
    let (src_path, mut src, dst_path, mut dst) = source_and_target(&dir);
    dst.batch_execute("CREATE VIEW v_cpi AS SELECT 1 AS stale").unwrap();
    let mut summary = CopySummary::start(&src_path, &dst_path, false);

    copy_views(&mut src, Some(&mut dst), &options(&[], false), &mut summary);

    assert_eq!(summary.outcome(), CopyOutcome::PartialSuccess);
    assert_eq!((summary.successful, summary.failed), (2, 1));
    let cpi = &summary.view_details[0];
    assert_eq!(cpi.status, ViewStatus::Failed);
    assert!(cpi.error.as_deref().unwrap().starts_with("Create view failed"));
    assert_eq!(view_names(&mut dst), ["v_cpi", "v_latest_fx", "v_pairs"]);
}

#[test]
fn every_view_failing_is_a_failure() {
    let dir = TempDir::new().unwrap();
    let (src_path, mut src, dst_path, mut dst) = source_and_target(&dir);
    dst.batch_execute("CREATE VIEW v_cpi AS SELECT 1 AS stale").unwrap();
    let mut summary = CopySummary::start(&src_path, &dst_path, false);

    copy_views(&mut src, Some(&mut dst), &options(&["v_cpi"], false), &mut summary);

    assert_eq!(summary.outcome(), CopyOutcome::Failed);
}

#[test]
fn allow_list_counts_missing_names_as_skipped() {
    let dir = TempDir::new().unwrap();
    let (src_path, mut src, dst_path, mut dst) = source_and_target(&dir);
    let mut summary = CopySummary::start(&src_path, &dst_path, false);

    copy_views(
        &mut src,
        Some(&mut dst),
        &options(&["v_cpi", "v_missing", "FxDaily"], true),
        &mut summary,
    );

    assert_eq!((summary.total_views, summary.successful, summary.skipped), (1, 1, 2));
    assert_eq!(view_names(&mut dst), ["v_cpi"]);
}

#[test]
fn empty_source_reports_no_views() {
    let dir = TempDir::new().unwrap();
    let (src_path, mut src) = plain_db(&dir, "empty.db");
    let (dst_path, mut dst) = plain_db(&dir, "target.db");
    let mut summary = CopySummary::start(&src_path, &dst_path, false);

    copy_views(&mut src, Some(&mut dst), &options(&[], true), &mut summary);

    assert_eq!(summary.total_views, 0);
    assert_eq!(summary.errors, ["No views found in source database"]);
    assert_eq!(summary.outcome(), CopyOutcome::Success);
}

fn settings_for(source: &str, target: &str, dry_run: bool) -> Arc<Settings> {
    let source = source.to_string();
    let target = target.to_string();
    let dry = dry_run.to_string();
    let settings = Settings::from_parts(None, move |key| match key {
        "SOURCE_DATABASE_URL" => Some(source.clone()),
        "TARGET_DATABASE_URL" => Some(target.clone()),
        "DRY_RUN" => Some(dry.clone()),
        _ => None,
    })
    .unwrap();
    Arc::new(settings)
}

#[tokio::test]
async fn dry_run_never_touches_the_target() {
    let dir = TempDir::new().unwrap();
    let (src_path, mut src) = plain_db(&dir, "source.db");
    src.batch_execute(BASE_TABLES).unwrap();
    src.batch_execute(SOURCE_VIEWS).unwrap();
    drop(src);
    let target = temp_path(&dir, "never_created.db");

    let summary = jobs::copy_views(settings_for(&src_path, &target, true), ViewOverrides::default())
        .await
        .unwrap();

    assert!(summary.dry_run);
    assert_eq!((summary.total_views, summary.successful), (3, 3));
    assert!(!Path::new(&target).exists());
}

#[tokio::test]
async fn overrides_take_precedence_over_settings() {
    let dir = TempDir::new().unwrap();
    let (src_path, mut src) = plain_db(&dir, "source.db");
    src.batch_execute(BASE_TABLES).unwrap();
    src.batch_execute(SOURCE_VIEWS).unwrap();
    drop(src);
    let (dst_path, mut dst) = plain_db(&dir, "target.db");
    dst.batch_execute(BASE_TABLES).unwrap();

    let summary = jobs::copy_views(
        settings_for(&src_path, &dst_path, true),
        ViewOverrides {
            views: Some(vec!["v_cpi".to_string()]),
            dry_run: Some(false),
        },
    )
    .await
    .unwrap();

    assert!(!summary.dry_run);
    assert_eq!(summary.total_views, 1);
    assert_eq!(view_names(&mut dst), ["v_cpi"]);
}

#[tokio::test]
async fn unreachable_target_is_an_error() {
    let dir = TempDir::new().unwrap();
    let (src_path, _src) = plain_db(&dir, "source.db");
    let target = temp_path(&dir, "missing/dir/target.db");

    let result = jobs::copy_views(settings_for(&src_path, &target, false), ViewOverrides::default()).await;

    assert!(result.is_err());
}
