//! HTTP triggers.
//!
//! - `GET /health`
//! - `GET|POST /api/ingest`: plaintext result of one ingest run
//! - `GET|POST /api/news`: plaintext result of one news run
//! - `GET|POST /api/views?views=a,b`: JSON view-copy summary, 200/207/500
//! - `GET /api/views/status`: the view-copy configuration
//!
//! A trigger that arrives while the same job is running gets `409 Conflict`.

use std::future::Future;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use shared_utils::env::split_list;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::{
    jobs::{JobRunner, TriggerError, ViewOverrides},
    views::CopyOutcome,
};

pub const INGEST_OK: &str = "Forex data fetch completed successfully!";
pub const NEWS_OK: &str = "News sentiment fetch completed successfully!";

pub fn router(runner: JobRunner) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/ingest", get(ingest).post(ingest))
        .route("/api/news", get(news).post(news))
        .route("/api/views", get(views).post(views))
        .route("/api/views/status", get(views_status))
        .with_state(runner)
        .layer(TraceLayer::new_for_http())
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    runner: JobRunner,
    bind: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "http triggers listening");
    axum::serve(listener, router(runner))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn ingest(State(runner): State<JobRunner>) -> Response {
    plaintext_outcome(runner.ingest().await.map(|_| ()), INGEST_OK)
}

async fn news(State(runner): State<JobRunner>) -> Response {
    plaintext_outcome(runner.news().await.map(|_| ()), NEWS_OK)
}

/// Plaintext body and status for a finished ingest/news trigger.
pub fn plaintext_outcome(result: Result<(), TriggerError>, ok_message: &str) -> Response {
    match result {
        Ok(()) => (StatusCode::OK, ok_message.to_string()).into_response(),
        Err(e @ TriggerError::AlreadyRunning(_)) => {
            warn!(error = %e, "trigger refused");
            (StatusCode::CONFLICT, e.to_string()).into_response()
        }
        Err(TriggerError::Failed(e)) => {
            error!(error = %format!("{e:#}"), "job failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error occurred: {e:#}")).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ViewsQuery {
    views: Option<String>,
}

async fn views(State(runner): State<JobRunner>, Query(query): Query<ViewsQuery>) -> Response {
    let overrides = ViewOverrides {
        views: query.views.as_deref().map(split_list).filter(|v| !v.is_empty()),
        dry_run: None,
    };
    match runner.copy_views(overrides).await {
        Ok(summary) => {
            let outcome = summary.outcome();
            (copy_status(outcome), Json(json!({ "status": outcome, "summary": summary }))).into_response()
        }
        Err(e @ TriggerError::AlreadyRunning(_)) => (
            StatusCode::CONFLICT,
            Json(json!({ "status": "busy", "error": e.to_string() })),
        )
            .into_response(),
        Err(TriggerError::Failed(e)) => {
            let msg = format!("Error in HTTP trigger: {e:#}");
            error!("{msg}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "error": msg })),
            )
                .into_response()
        }
    }
}

/// 200 when nothing failed, 207 when some views failed, 500 when all did.
pub fn copy_status(outcome: CopyOutcome) -> StatusCode {
    match outcome {
        CopyOutcome::Success => StatusCode::OK,
        CopyOutcome::PartialSuccess => StatusCode::MULTI_STATUS,
        CopyOutcome::Failed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn views_status(State(runner): State<JobRunner>) -> impl IntoResponse {
    let settings = runner.settings();
    let cfg = &settings.views;
    let not_set = || "NOT_SET".to_string();
    Json(json!({
        "status": "operational",
        "configuration": {
            "source_database": cfg.source_database_url.clone().unwrap_or_else(not_set),
            "target_database": cfg.target_database_url.clone().unwrap_or_else(not_set),
            "specific_views": if cfg.specific_views.is_empty() { "ALL".to_string() } else { cfg.specific_views.join(",") },
            "drop_existing_views": cfg.drop_existing,
            "create_schemas": cfg.create_schemas,
            "dry_run": cfg.dry_run,
            "sync_schedule": settings.schedule.views,
        }
    }))
}
