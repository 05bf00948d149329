//! Cron triggers for the three jobs.
//!
//! Expressions have six fields (seconds first). A run that is still going when
//! its next tick fires is not overlapped; the tick is logged and dropped.

use anyhow::Context;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::jobs::{JobRunner, TriggerError, ViewOverrides};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledJob {
    Ingest,
    News,
    Views,
}

impl ScheduledJob {
    pub const ALL: [ScheduledJob; 3] = [Self::Ingest, Self::News, Self::Views];

    pub fn name(self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::News => "news",
            Self::Views => "views",
        }
    }

    fn cron(self, runner: &JobRunner) -> String {
        let schedule = &runner.settings().schedule;
        match self {
            Self::Ingest => schedule.ingest.clone(),
            Self::News => schedule.news.clone(),
            Self::Views => schedule.views.clone(),
        }
    }

    /// Run once and log the outcome; scheduled runs have no caller to report to.
    pub async fn run_logged(self, runner: &JobRunner) {
        let result = match self {
            Self::Ingest => runner.ingest().await.map(|r| {
                info!(written = r.written(), skipped = r.skipped(), failed = r.failed(), "scheduled ingest done")
            }),
            Self::News => runner.news().await.map(|r| {
                info!(collected = r.collected, inserted = r.inserted, "scheduled news done")
            }),
            Self::Views => runner.copy_views(ViewOverrides::default()).await.map(|s| {
                info!(successful = s.successful, failed = s.failed, "scheduled view copy done")
            }),
        };
        match result {
            Ok(()) => {}
            Err(TriggerError::AlreadyRunning(job)) => {
                warn!(job, "previous run still active, skipping tick")
            }
            Err(TriggerError::Failed(e)) => {
                error!(job = self.name(), error = %format!("{e:#}"), "scheduled run failed")
            }
        }
    }
}

/// Register every job and start ticking. Keep the returned scheduler alive.
pub async fn start(runner: JobRunner) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await.context("creating scheduler")?;

    for job in ScheduledJob::ALL {
        let cron = job.cron(&runner);
        let runner = runner.clone();
        let cron_job = Job::new_async(cron.as_str(), move |_id, _lock| {
            let runner = runner.clone();
            Box::pin(async move { job.run_logged(&runner).await })
        })
        .with_context(|| format!("invalid cron expression {cron:?} for {} job", job.name()))?;
        scheduler
            .add(cron_job)
            .await
            .with_context(|| format!("registering {} job", job.name()))?;
        info!(job = job.name(), cron = %cron, "scheduled");
    }

    scheduler.start().await.context("starting scheduler")?;
    Ok(scheduler)
}
