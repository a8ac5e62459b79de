//! Background cache-warm job.
//!
//! Keeps the snapshot cache populated so dashboard requests rarely pay the
//! sheet fetch latency. The job only calls [`SnapshotCache::snapshot`], so
//! it shares the single-flight refresh with request handlers and does
//! nothing while the cached snapshot is still fresh.
//!
//! [`SnapshotCache::snapshot`]: cowfuel_sheets::SnapshotCache::snapshot

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::api::FuelCache;

/// Builds and starts the background job scheduler.
///
/// When `warm_cron` is `None` the scheduler starts with no jobs. The
/// returned handle must be kept alive for the lifetime of the process.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    cache: Arc<FuelCache>,
    warm_cron: Option<&str>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    match warm_cron {
        Some(cron) => register_warm_job(&scheduler, cache, cron).await?,
        None => tracing::info!("scheduler: cache warm job disabled"),
    }

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_warm_job(
    scheduler: &JobScheduler,
    cache: Arc<FuelCache>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let cache = Arc::clone(&cache);

        Box::pin(async move {
            let view = cache.snapshot().await;
            tracing::debug!(
                total = view.snapshot.counts.total,
                stale = view.stale,
                "scheduler: cache warm tick"
            );
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: registered cache warm job");
    Ok(())
}
