//! Ingest run: every active resource, strictly one after another.
//!
//! Per resource:
//! 1. dispatch on the type id (unknown ids are skipped before touching the warehouse);
//! 2. validate the target table name and run the resource's DDL in its own transaction;
//! 3. resolve the row layout and read the high-water mark;
//! 4. load currency pairs for per-pair feeds;
//! 5. fetch, keep records newer than the mark, merge.
//!
//! A failure in any step is recorded for that resource and the run moves on.

pub mod news;

use anyhow::Context;
use chrono::{DateTime, Utc};
use diesel::{Connection, SqliteConnection, connection::SimpleConnection};
use market_feeds::{
    filter::retain_newer,
    models::{feed_kind::FeedKind, resource::ResourceDescriptor},
    strategies::{FetchContext, strategy_for},
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    db::{catalog::table_exists, ident::Ident},
    registry,
    watermark::high_water_mark,
    writer::{WriteError, merge_records, resolve_layout},
};

pub use news::{NewsJob, NewsReport};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResourceStatus {
    Skipped { reason: String },
    Written { fetched: usize, fresh: usize, merged: usize },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceOutcome {
    pub resource_id: i32,
    pub name: String,
    #[serde(flatten)]
    pub status: ResourceStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub resources: Vec<ResourceOutcome>,
}

impl RunReport {
    pub fn written(&self) -> usize {
        self.count(|s| matches!(s, ResourceStatus::Written { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, ResourceStatus::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ResourceStatus::Failed { .. }))
    }

    /// Rows inserted or updated across all resources.
    pub fn merged_rows(&self) -> usize {
        self.resources
            .iter()
            .map(|o| match o.status {
                ResourceStatus::Written { merged, .. } => merged,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, pred: impl Fn(&ResourceStatus) -> bool) -> usize {
        self.resources.iter().filter(|o| pred(&o.status)).count()
    }
}

pub struct IngestJob<'a> {
    ctx: FetchContext<'a>,
}

impl<'a> IngestJob<'a> {
    pub fn new(ctx: FetchContext<'a>) -> Self {
        Self { ctx }
    }

    /// Process every active resource. Only a registry read failure aborts the run.
    pub async fn run(&self, conn: &mut SqliteConnection) -> anyhow::Result<RunReport> {
        let started_at = Utc::now();
        let resources = registry::active_resources(conn).context("reading resource registry")?;
        info!(count = resources.len(), "ingest run started");

        let mut outcomes = Vec::with_capacity(resources.len());
        for resource in resources {
            let status = match self.process(conn, &resource).await {
                Ok(status) => status,
                Err(e) => {
                    error!(resource = %resource.name, error = %e, "resource failed");
                    ResourceStatus::Failed { error: e.to_string() }
                }
            };
            outcomes.push(ResourceOutcome {
                resource_id: resource.resource_id,
                name: resource.name,
                status,
            });
        }

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            resources: outcomes,
        };
        info!(
            written = report.written(),
            skipped = report.skipped(),
            failed = report.failed(),
            rows = report.merged_rows(),
            "ingest run finished"
        );
        Ok(report)
    }

    async fn process(
        &self,
        conn: &mut SqliteConnection,
        resource: &ResourceDescriptor,
    ) -> Result<ResourceStatus, WriteError> {
        let Some(kind) = FeedKind::from_type_id(resource.type_id) else {
            warn!(resource = %resource.name, type_id = resource.type_id, "unknown resource type, skipping");
            return Ok(ResourceStatus::Skipped {
                reason: format!("unknown type_id {}", resource.type_id),
            });
        };
        info!(resource = %resource.name, kind = ?kind, "processing resource");

        let table = Ident::parse(&resource.target_table)?;
        ensure_table(conn, resource, &table)?;

        let layout = resolve_layout(conn, kind, resource, &table)?;
        let hwm = high_water_mark(conn, &table)?;
        let pairs = if kind.per_pair() {
            registry::currency_pairs(conn)?
        } else {
            Vec::new()
        };

        let records = strategy_for(kind).fetch(&self.ctx, resource, &pairs).await;
        let fetched = records.len();
        let fresh = retain_newer(records, hwm);
        info!(resource = %resource.name, fetched, fresh = fresh.len(), hwm = %hwm, "filtered against high-water mark");

        let merged = merge_records(conn, &table, &layout, resource.merge_sql.as_deref(), &fresh)?;
        Ok(ResourceStatus::Written {
            fetched,
            fresh: fresh.len(),
            merged,
        })
    }
}

/// Run the resource's DDL (own commit) and confirm the table now exists.
fn ensure_table(
    conn: &mut SqliteConnection,
    resource: &ResourceDescriptor,
    table: &Ident,
) -> Result<(), WriteError> {
    let ddl = resource.create_table_sql.trim();
    if !ddl.is_empty() {
        conn.transaction(|conn| conn.batch_execute(ddl))?;
    }
    if !table_exists(conn, table)? {
        return Err(WriteError::DataShape(format!(
            "table {table} does not exist after running its DDL"
        )));
    }
    Ok(())
}
