//! Job entry points shared by the CLI, the HTTP server and the scheduler.
//!
//! Diesel connections are synchronous, so every run moves onto the blocking pool
//! and drives the async fetch side from there with the runtime handle. One
//! connection is opened per run and closed when the run ends, whatever the outcome.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use anyhow::Context;
use market_feeds::{
    providers::alpha_vantage::AlphaVantageClient,
    strategies::{FetchContext, NewsSentimentFetcher},
};
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::info;

use crate::{
    db::{connection::connect_sqlite, migrate::open_warehouse},
    pipeline::{IngestJob, NewsJob, NewsReport, RunReport},
    settings::Settings,
    views::{CopyOptions, CopySummary, copy_views as copy_view_definitions},
};

/// Per-trigger adjustments to the configured view copy.
#[derive(Debug, Clone, Default)]
pub struct ViewOverrides {
    pub views: Option<Vec<String>>,
    pub dry_run: Option<bool>,
}

async fn run_blocking<T, F>(f: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("job task panicked")?
}

/// One ingest run over every active resource.
pub async fn ingest(settings: Arc<Settings>) -> anyhow::Result<RunReport> {
    let database_url = settings.database_url()?.to_string();
    settings.api_key()?;
    let client = AlphaVantageClient::new(&settings.alphavantage)
        .context("building AlphaVantage client")?;

    run_blocking(move || {
        let mut conn = open_warehouse(&database_url)?;
        let ctx = FetchContext {
            source: &client,
            api_key: settings.api_key()?,
            target_tz: settings.target_timezone,
            max_concurrency: settings.max_concurrent_requests,
        };
        let result = Handle::current().block_on(IngestJob::new(ctx).run(&mut conn));
        drop(conn);
        info!("connection closed");
        result
    })
    .await
}

/// One news sentiment run over every currency in the pair table.
pub async fn news(settings: Arc<Settings>) -> anyhow::Result<NewsReport> {
    let database_url = settings.database_url()?.to_string();
    settings.api_key()?;
    let client = AlphaVantageClient::new(&settings.alphavantage)
        .context("building AlphaVantage client")?;

    run_blocking(move || {
        let mut conn = open_warehouse(&database_url)?;
        let ctx = FetchContext {
            source: &client,
            api_key: settings.api_key()?,
            target_tz: settings.target_timezone,
            max_concurrency: settings.max_concurrent_requests,
        };
        let job = NewsJob::new(ctx, NewsSentimentFetcher::new(settings.news_endpoint.clone()));
        let result = Handle::current().block_on(job.run(&mut conn));
        drop(conn);
        info!("connection closed");
        result
    })
    .await
}

/// Copy view definitions between the configured source and target.
///
/// A dry run never opens the target.
pub async fn copy_views(settings: Arc<Settings>, overrides: ViewOverrides) -> anyhow::Result<CopySummary> {
    let cfg = &settings.views;
    let dry_run = overrides.dry_run.unwrap_or(cfg.dry_run);
    let source_url = cfg.source_url()?.to_string();
    let target_url = if dry_run {
        cfg.target_database_url.clone().unwrap_or_else(|| "NOT_SET".to_string())
    } else {
        cfg.target_url()?.to_string()
    };
    let options = CopyOptions {
        views: overrides.views.unwrap_or_else(|| cfg.specific_views.clone()),
        drop_existing: cfg.drop_existing,
        create_schemas: cfg.create_schemas,
    };

    run_blocking(move || {
        info!(source = %source_url, target = %target_url, dry_run, "starting view copy");
        let mut summary = CopySummary::start(&source_url, &target_url, dry_run);
        let mut source = connect_sqlite(&source_url).context("connecting to source database")?;

        if dry_run {
            copy_view_definitions(&mut source, None, &options, &mut summary);
        } else {
            let mut target = match connect_sqlite(&target_url) {
                Ok(conn) => conn,
                Err(e) => {
                    drop(source);
                    info!("source connection closed");
                    return Err(e.context("connecting to target database"));
                }
            };
            copy_view_definitions(&mut source, Some(&mut target), &options, &mut summary);
            drop(target);
            info!("target connection closed");
        }
        drop(source);
        info!("source connection closed");
        Ok(summary)
    })
    .await
}

/// At most one run at a time.
#[derive(Debug, Clone, Default)]
pub struct JobGuard {
    running: Arc<AtomicBool>,
}

/// Held for the duration of a run; releases the guard on drop.
#[derive(Debug)]
pub struct RunPermit {
    running: Arc<AtomicBool>,
}

impl JobGuard {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// `None` if a run is already in progress.
    pub fn try_start(&self) -> Option<RunPermit> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
            .ok()
            .map(|_| RunPermit {
                running: Arc::clone(&self.running),
            })
    }
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("{0} job is already running")]
    AlreadyRunning(&'static str),
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Settings plus one guard per job; cheap to clone into handlers and cron closures.
#[derive(Clone)]
pub struct JobRunner {
    settings: Arc<Settings>,
    ingest: JobGuard,
    news: JobGuard,
    views: JobGuard,
}

impl JobRunner {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            ingest: JobGuard::default(),
            news: JobGuard::default(),
            views: JobGuard::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn ingest(&self) -> Result<RunReport, TriggerError> {
        let settings = Arc::clone(&self.settings);
        guarded(&self.ingest, "ingest", ingest(settings)).await
    }

    pub async fn news(&self) -> Result<NewsReport, TriggerError> {
        let settings = Arc::clone(&self.settings);
        guarded(&self.news, "news", news(settings)).await
    }

    pub async fn copy_views(&self, overrides: ViewOverrides) -> Result<CopySummary, TriggerError> {
        let settings = Arc::clone(&self.settings);
        guarded(&self.views, "views", copy_views(settings, overrides)).await
    }
}

/// Run `job` under `guard` on its own task, so an abandoned caller cannot
/// release the guard while the run is still going.
async fn guarded<T, F>(guard: &JobGuard, name: &'static str, job: F) -> Result<T, TriggerError>
where
    T: Send + 'static,
    F: Future<Output = anyhow::Result<T>> + Send + 'static,
{
    let permit = guard.try_start().ok_or(TriggerError::AlreadyRunning(name))?;
    let handle = tokio::spawn(async move {
        let _permit = permit;
        job.await
    });
    let result = handle.await.context("job task panicked")?;
    Ok(result?)
}
