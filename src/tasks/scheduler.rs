use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::SchedulerConfig;

pub type ScanCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Registers the scan trigger: cron specs when configured, otherwise a fixed
/// interval. Overlap protection lives in the callback's run guard.
pub async fn configure_scan_jobs(
    config: &SchedulerConfig,
    callback: ScanCallback,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    if config.cron_specs.is_empty() {
        let cb = callback.clone();
        let job = Job::new_repeated_async(config.interval, move |_id, _l| {
            let cb = cb.clone();
            Box::pin(async move {
                tracing::info!(target: "scheduler", "interval scan triggered");
                cb().await;
            })
        })?;
        scheduler.add(job).await?;
        tracing::info!(
            target: "scheduler",
            interval_secs = config.interval.as_secs(),
            "interval scan job registered"
        );
    }

    for spec in &config.cron_specs {
        let label = spec.clone();
        let cb = callback.clone();
        let job = Job::new_async(spec.as_str(), move |_id, _l| {
            let cb = cb.clone();
            let cron_label = label.clone();
            Box::pin(async move {
                tracing::info!(target: "scheduler", cron = %cron_label, "scheduled scan triggered");
                cb().await;
            })
        })?;
        scheduler.add(job).await?;
        tracing::info!(target: "scheduler", cron = %spec, "scan job registered");
    }

    scheduler.start().await?;
    Ok(scheduler)
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use futures::FutureExt;

    use super::*;
    use crate::config::RunMode;

    fn scheduler_config(interval: Duration, cron_specs: Vec<String>) -> SchedulerConfig {
        SchedulerConfig {
            mode: RunMode::Daemon,
            interval,
            cron_specs,
            run_on_startup: false,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn interval_job_invokes_callback() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let callback: ScanCallback = Arc::new(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        });

        let mut scheduler =
            configure_scan_jobs(&scheduler_config(Duration::from_secs(1), Vec::new()), callback)
                .await
                .unwrap();

        let waited = tokio::time::timeout(Duration::from_secs(10), async {
            while hits.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await;
        scheduler.shutdown().await.unwrap();
        assert!(waited.is_ok(), "scan callback never ran");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn rejects_invalid_cron_spec() {
        let callback: ScanCallback = Arc::new(|| async {}.boxed());
        let result = configure_scan_jobs(
            &scheduler_config(Duration::from_secs(60), vec!["not a cron".into()]),
            callback,
        )
        .await;
        assert!(result.is_err());
    }
}
