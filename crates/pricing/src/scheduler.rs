use crate::refresher::PriceRefresher;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Build the scheduler carrying the daily price refresh job. The caller
/// starts it and keeps it alive for the life of the process.
pub async fn refresh_scheduler(
    refresher: Arc<PriceRefresher>,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let sched = JobScheduler::new().await?;

    sched
        .add(Job::new_async(cron, move |_uuid, _lock| {
            let refresher = refresher.clone();

            Box::pin(async move {
                match refresher.refresh_all().await {
                    Ok(report) => tracing::info!(
                        updated = report.updated,
                        unchecked = report.unchecked_but_stamped,
                        "scheduled price refresh finished"
                    ),
                    Err(err) => tracing::error!(err = %err, "scheduled price refresh failed"),
                }
            })
        })?)
        .await?;

    Ok(sched)
}
