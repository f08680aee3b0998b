//! Job to refresh the native and reference asset price points.

use anyhow::{bail, Result};
use log::info;

use crate::store::Store;

pub async fn run(store: &Store) -> Result<()> {
    info!("Starting refresh_prices job...");
    let start = std::time::Instant::now();

    let total = store.assets().all().count();
    let refreshed = store.refresh_prices().await;
    if refreshed == 0 {
        bail!("none of the {} tracked asset prices could be fetched", total);
    }

    info!(
        "Completed refresh_prices job in {:?} ({}/{} assets)",
        start.elapsed(),
        refreshed,
        total
    );
    Ok(())
}
