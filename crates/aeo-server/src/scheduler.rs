//! Background job scheduler.
//!
//! Registers the recurring perception scan: on `AEO_SCAN_SCHEDULE` every
//! brand with a stored profile is scanned on the default platform set.

use std::sync::Arc;

use aeo_perception::ScanOptions;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::services::Services;

const TRIGGER_SOURCE: &str = "scheduled";

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    services: Arc<Services>,
    schedule: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    if services.scans.is_some() {
        register_scan_job(&scheduler, pool, services, schedule).await?;
    } else {
        tracing::warn!("scheduler: scans are not configured; weekly scan job not registered");
    }

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_scan_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    services: Arc<Services>,
    schedule: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let pool = pool.clone();
        let services = Arc::clone(&services);

        Box::pin(async move {
            tracing::info!("scheduler: starting scheduled scan run");
            run_scheduled_scans(&pool, &services).await;
            tracing::info!("scheduler: scheduled scan run complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(schedule, "scheduler: scan job registered");
    Ok(())
}

/// Scans each profiled brand in turn. One brand failing does not stop the
/// rest.
async fn run_scheduled_scans(pool: &PgPool, services: &Services) {
    let Some(orchestrator) = services.scans.as_ref() else {
        return;
    };

    let brands = match aeo_db::list_brands_with_profiles(pool).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to load brands with profiles");
            return;
        }
    };

    if brands.is_empty() {
        tracing::info!("scheduler: no brands with profiles; skipping");
        return;
    }

    let options = ScanOptions {
        trigger_source: TRIGGER_SOURCE.to_string(),
        ..ScanOptions::default()
    };

    let mut succeeded = 0usize;
    for brand in &brands {
        match orchestrator.run(brand, &options).await {
            Ok(outcome) => {
                succeeded += 1;
                tracing::info!(
                    brand = %brand.slug,
                    scan = %outcome.public_id,
                    overall = outcome.scores.overall,
                    quadrant = %outcome.quadrant,
                    "scheduler: scan complete"
                );
            }
            Err(e) => {
                tracing::error!(brand = %brand.slug, error = %e, "scheduler: scan failed");
            }
        }
    }

    tracing::info!(
        brands = brands.len(),
        succeeded,
        "scheduler: scans finished"
    );
}
