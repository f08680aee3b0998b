use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use jemallocator::Jemalloc;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use dexscope::{CronScheduler, GraphqlIndexer, Indexer, Settings, Store};

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = Arc::new(
        Settings::new().context("Failed to load config.yaml. Please ensure it exists and is valid")?,
    );

    let level = LevelFilter::from_str(&settings.log_level)
        .with_context(|| format!("Invalid log_level: {}", settings.log_level))?;
    SimpleLogger::new()
        .with_level(level)
        .init()
        .context("Failed to initialize logger")?;

    let indexer: Arc<dyn Indexer> = Arc::new(
        GraphqlIndexer::new(&settings.indexer).context("Failed to create indexer client")?,
    );
    let store = Arc::new(Store::new(indexer, &settings));

    let cancellation_token = CancellationToken::new();

    return run(settings, store, cancellation_token).await;
}

async fn run(
    settings: Arc<Settings>,
    store: Arc<Store>,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    info!(
        "Warming up store from {} (blocks: {})",
        settings.indexer.url, settings.indexer.blocks_url
    );
    store.warm_up().await;

    // Periodic refreshes: prices, overview, chart, transactions, directory
    let cron_scheduler = CronScheduler::new(store.clone(), settings.refresh.clone());

    let cron_token = cancellation_token.child_token();
    let cron_handle = tokio::spawn(async move {
        if let Err(e) = cron_scheduler.run(cron_token).await {
            error!("Cron scheduler failed: {:#}", e);
        }
    });

    info!("Cron scheduler started - store will refresh periodically");

    #[cfg(unix)]
    let mut sigterm_stream = {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?
    };

    info!("dexscope running. Press Ctrl+C to stop.");

    #[cfg(unix)]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
            _ = sigterm_stream.recv() => {
                info!("Received SIGTERM, exiting gracefully...");
            },
        };
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
        };
    }

    cancellation_token.cancel();

    info!("Waiting for cron scheduler to stop...");
    let _ = cron_handle.await;

    if let Some(at) = store.last_update().await {
        info!("Last store update at {}", at.to_rfc3339());
    }
    Ok(())
}
