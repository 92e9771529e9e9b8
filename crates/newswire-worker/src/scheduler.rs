//! Cron-driven ingest cycles.

use std::sync::Arc;

use newswire_ingest::{ArticleStore, ImageLookup, IngestionPipeline, SentimentClassifier};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the job scheduler with one ingest job on `cron`.
///
/// The returned handle must be kept alive for the lifetime of the process.
/// Overlapping triggers are dropped by the pipeline's running flag.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the cron expression is invalid or the
/// scheduler cannot be started.
pub async fn build_scheduler<C, I, S>(
    pipeline: Arc<IngestionPipeline<C, I, S>>,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError>
where
    C: SentimentClassifier + 'static,
    I: ImageLookup + 'static,
    S: ArticleStore + 'static,
{
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pipeline = Arc::clone(&pipeline);
        Box::pin(async move {
            pipeline.run_logged("scheduler").await;
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    Ok(scheduler)
}
