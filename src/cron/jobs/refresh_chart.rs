//! Job to rebuild the daily/weekly chart over the widest window fetched so far.

use anyhow::{bail, Result};
use log::info;

use crate::store::Store;

pub async fn run(store: &Store) -> Result<()> {
    info!("Starting refresh_chart job...");
    let start = std::time::Instant::now();

    let chart = store.refresh_chart().await;
    if chart.is_empty() {
        bail!("chart data unavailable");
    }

    info!(
        "Completed refresh_chart job in {:?} ({} days, {} weeks)",
        start.elapsed(),
        chart.daily.len(),
        chart.weekly.len()
    );
    Ok(())
}
