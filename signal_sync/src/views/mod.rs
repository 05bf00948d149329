//! Copy view definitions from a source warehouse to a target warehouse.
//!
//! Views are processed in name order. For each one the definition is read from
//! the source and, unless this is a dry run, replayed on the target:
//! schema check, `DROP VIEW IF EXISTS`, then the stored `CREATE VIEW`. Each step
//! commits on its own; a failed step rolls back and marks only that view failed.
//!
//! Dependencies between views are detected and reported but do not change the
//! order. A view created before one it selects from fails and is reported.

pub mod catalog;

use chrono::{DateTime, Utc};
use diesel::{Connection, SqliteConnection};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::db::ident::IdentError;

use catalog::{
    SourceView, create_view, drop_view, ensure_schema, list_views, object_names,
    view_definition, view_dependencies,
};

#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Ident(#[from] IdentError),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("view {0} not found")]
    NotFound(String),
    #[error("schema {0} is not attached to the target")]
    MissingSchema(String),
}

#[derive(Debug, Clone, Default)]
pub struct CopyOptions {
    /// Restrict the copy to these view names; empty copies every view.
    pub views: Vec<String>,
    pub drop_existing: bool,
    pub create_schemas: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewDetail {
    pub schema: String,
    pub view: String,
    pub status: ViewStatus,
    pub error: Option<String>,
    pub dependencies: Vec<String>,
}

/// How a copy run went overall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyOutcome {
    Success,
    PartialSuccess,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct CopySummary {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub source_database: String,
    pub target_database: String,
    pub dry_run: bool,
    pub total_views: usize,
    pub successful: usize,
    pub failed: usize,
    /// Requested names that are not views in the source.
    pub skipped: usize,
    pub view_details: Vec<ViewDetail>,
    pub errors: Vec<String>,
}

impl CopySummary {
    pub fn start(source_database: impl Into<String>, target_database: impl Into<String>, dry_run: bool) -> Self {
        Self {
            start_time: Utc::now(),
            end_time: None,
            source_database: source_database.into(),
            target_database: target_database.into(),
            dry_run,
            total_views: 0,
            successful: 0,
            failed: 0,
            skipped: 0,
            view_details: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn outcome(&self) -> CopyOutcome {
        match (self.successful, self.failed) {
            (0, f) if f > 0 => CopyOutcome::Failed,
            (_, f) if f > 0 => CopyOutcome::PartialSuccess,
            _ => CopyOutcome::Success,
        }
    }

    fn record(&mut self, detail: ViewDetail) {
        match detail.status {
            ViewStatus::Success => self.successful += 1,
            ViewStatus::Failed => self.failed += 1,
        }
        self.view_details.push(detail);
    }

    fn finish(&mut self) {
        self.end_time = Some(Utc::now());
        info!(
            total = self.total_views,
            successful = self.successful,
            failed = self.failed,
            skipped = self.skipped,
            source = %self.source_database,
            target = %self.target_database,
            "view copy finished"
        );
    }
}

/// Copy views from `source` into `target`, or only read them when `target` is `None`.
pub fn copy_views(
    source: &mut SqliteConnection,
    mut target: Option<&mut SqliteConnection>,
    options: &CopyOptions,
    summary: &mut CopySummary,
) {
    let views = match list_views(source, &options.views) {
        Ok(views) => views,
        Err(e) => {
            let msg = format!("Fatal error during view copy operation: {e}");
            error!("{msg}");
            summary.errors.push(msg);
            summary.finish();
            return;
        }
    };
    summary.total_views = views.len();
    summary.skipped = options
        .views
        .iter()
        .filter(|wanted| !views.iter().any(|v| &v.name == *wanted))
        .inspect(|missing| warn!(view = %missing, "requested view not found in source"))
        .count();
    info!(count = views.len(), dry_run = target.is_none(), "views to copy");

    if views.is_empty() {
        warn!("no views found to copy");
        summary.errors.push("No views found in source database".to_string());
        summary.finish();
        return;
    }

    let objects = object_names(source).unwrap_or_else(|e| {
        warn!(error = %e, "could not list source objects, dependencies will be empty");
        Vec::new()
    });

    let total = views.len();
    for (idx, view) in views.into_iter().enumerate() {
        info!(view = %view.qualified(), "[{}/{}] processing view", idx + 1, total);
        let detail = match view_definition(source, &view) {
            Err(e) => failed(&view, Vec::new(), e.to_string()),
            Ok(definition) => {
                let dependencies = view_dependencies(&definition, &view.name, &objects);
                if !dependencies.is_empty() {
                    info!(view = %view.qualified(), dependencies = %dependencies.join(", "), "dependencies");
                }
                match target.as_deref_mut() {
                    None => {
                        info!(view = %view.qualified(), "dry run, target untouched");
                        succeeded(&view, dependencies)
                    }
                    Some(conn) => match replay(conn, &view, &definition, options) {
                        Ok(()) => succeeded(&view, dependencies),
                        Err(msg) => failed(&view, dependencies, msg),
                    },
                }
            }
        };
        summary.record(detail);
    }
    summary.finish();
}

fn replay(
    conn: &mut SqliteConnection,
    view: &SourceView,
    definition: &str,
    options: &CopyOptions,
) -> Result<(), String> {
    if options.create_schemas {
        conn.transaction(|c| ensure_schema(c, &view.schema))
            .map_err(|e| format!("Could not create schema: {e}"))?;
    }
    if options.drop_existing {
        match conn.transaction(|c| drop_view(c, view)) {
            Ok(()) => info!(view = %view.qualified(), "dropped existing view"),
            Err(e) => error!(view = %view.qualified(), error = %e, "could not drop view"),
        }
    }
    conn.transaction(|c| create_view(c, definition))
        .map_err(|e| format!("Create view failed: {e}"))?;
    info!(view = %view.qualified(), "created view");
    Ok(())
}

fn succeeded(view: &SourceView, dependencies: Vec<String>) -> ViewDetail {
    ViewDetail {
        schema: view.schema.clone(),
        view: view.name.clone(),
        status: ViewStatus::Success,
        error: None,
        dependencies,
    }
}

fn failed(view: &SourceView, dependencies: Vec<String>, error: String) -> ViewDetail {
    error!(view = %view.qualified(), error = %error, "view failed");
    ViewDetail {
        schema: view.schema.clone(),
        view: view.name.clone(),
        status: ViewStatus::Failed,
        error: Some(error),
        dependencies,
    }
}
