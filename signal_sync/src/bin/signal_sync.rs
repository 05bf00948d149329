use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared_utils::env::split_list;
use signal_sync::{
    db::migrate,
    jobs::{self, JobRunner, ViewOverrides},
    schedule,
    server,
    settings::Settings,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(version, about = "Market feed ingestion and warehouse view copy")]
struct Cli {
    /// TOML settings file; environment variables take precedence.
    #[arg(long, value_name = "FILE", env = "SIGNAL_SYNC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Apply the embedded warehouse migrations.
    Migrate,
    /// Run one ingest over every active resource.
    Ingest,
    /// Run one news sentiment fetch.
    News,
    /// Copy view definitions from the source to the target warehouse.
    CopyViews {
        #[arg(long)]
        dry_run: bool,
        /// Comma-separated view names; overrides SPECIFIC_VIEWS.
        #[arg(long, value_name = "a,b")]
        views: Option<String>,
    },
    /// Serve the HTTP triggers and run the cron schedule.
    Serve,
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("signal_sync=info,market_feeds=info"))
        .map_err(|e| anyhow::anyhow!("invalid log filter: {e}"))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();
    let settings = Arc::new(Settings::load(cli.config.as_deref()).context("loading settings")?);

    match cli.cmd {
        Cmd::Migrate => {
            let url = settings.database_url()?.to_string();
            tokio::task::spawn_blocking(move || migrate::run_sqlite(&url)).await??;
            info!("migrations applied");
        }
        Cmd::Ingest => {
            let report = jobs::ingest(settings).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Cmd::News => {
            let report = jobs::news(settings).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Cmd::CopyViews { dry_run, views } => {
            let overrides = ViewOverrides {
                views: views.as_deref().map(split_list),
                dry_run: dry_run.then_some(true),
            };
            let summary = jobs::copy_views(settings, overrides).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Cmd::Serve => {
            let runner = JobRunner::new(Arc::clone(&settings));
            let mut scheduler = if settings.schedule.enabled {
                Some(schedule::start(runner.clone()).await?)
            } else {
                info!("schedule disabled");
                None
            };
            server::serve(runner, &settings.bind, async {
                let _ = tokio::signal::ctrl_c().await;
                info!("shutdown requested");
            })
            .await?;
            if let Some(scheduler) = scheduler.as_mut() {
                scheduler.shutdown().await.context("stopping scheduler")?;
            }
        }
    }

    Ok(())
}
