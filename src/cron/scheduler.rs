//! Cron scheduler for periodic store refreshes.
//!
//! Runs jobs like:
//! - Refreshing native and reference asset prices
//! - Refreshing the protocol overview
//! - Rebuilding the daily/weekly chart
//! - Refreshing the recent transactions feed
//! - Refreshing the pair/token directories and the top LP ranking

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{error, info};
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;

use crate::config::RefreshSettings;
use crate::store::Store;

use super::jobs;

/// Cron scheduler that keeps the store fresh.
pub struct CronScheduler {
    store: Arc<Store>,
    settings: Arc<RefreshSettings>,
}

impl CronScheduler {
    pub fn new(store: Arc<Store>, settings: RefreshSettings) -> Self {
        Self {
            store,
            settings: Arc::new(settings),
        }
    }

    /// Starts the cron scheduler and runs until cancellation.
    pub async fn run(&self, cancellation_token: CancellationToken) -> Result<()> {
        let mut scheduler = JobScheduler::new().await?;
        let settings = self.settings.clone();

        let mut registered = 0;
        registered += self
            .register(&scheduler, "refresh_prices", settings.prices_interval_secs, |store| async move {
                jobs::refresh_prices::run(&store).await
            })
            .await?;
        registered += self
            .register(&scheduler, "refresh_global", settings.global_interval_secs, |store| async move {
                jobs::refresh_global::run(&store).await
            })
            .await?;
        registered += self
            .register(&scheduler, "refresh_chart", settings.chart_interval_secs, |store| async move {
                jobs::refresh_chart::run(&store).await
            })
            .await?;
        registered += self
            .register(
                &scheduler,
                "refresh_transactions",
                settings.transactions_interval_secs,
                |store| async move { jobs::refresh_transactions::run(&store).await },
            )
            .await?;
        registered += self
            .register(
                &scheduler,
                "refresh_directory",
                settings.directory_interval_secs,
                |store| async move { jobs::refresh_directory::run(&store).await },
            )
            .await?;

        scheduler.start().await?;
        info!("Cron scheduler started with {} jobs", registered);

        cancellation_token.cancelled().await;
        info!("Cron scheduler shutting down...");

        scheduler.shutdown().await?;
        Ok(())
    }

    /// Registers `job` to run every `interval` seconds. Returns how many jobs
    /// were added: 0 when the interval is 0 (disabled).
    async fn register<F, Fut>(
        &self,
        scheduler: &JobScheduler,
        name: &'static str,
        interval: u64,
        job: F,
    ) -> Result<usize>
    where
        F: Fn(Arc<Store>) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        if interval == 0 {
            info!("Job {} disabled", name);
            return Ok(0);
        }

        let store = self.store.clone();
        let job = Job::new_repeated_async(Duration::from_secs(interval), move |_uuid, _lock| {
            let store = store.clone();
            let job = job.clone();
            Box::pin(async move {
                if let Err(e) = job(store).await {
                    error!("Failed to run {} job: {:#}", name, e);
                }
            })
        })?;

        scheduler.add(job).await?;
        info!("Registered {} job (every {}s)", name, interval);
        Ok(1)
    }
}
