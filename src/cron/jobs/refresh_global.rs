//! Job to refresh the protocol overview.
//!
//! Uses the stored native price point, fetching one only if none is stored.

use anyhow::{bail, Result};
use log::info;

use crate::store::Store;

pub async fn run(store: &Store) -> Result<()> {
    info!("Starting refresh_global job...");
    let start = std::time::Instant::now();

    let data = store.refresh_global_data().await;
    if data.is_empty() {
        bail!("protocol totals unavailable");
    }

    info!(
        "Completed refresh_global job in {:?} (deltas {})",
        start.elapsed(),
        if data.has_changes() { "derived" } else { "missing" }
    );
    Ok(())
}
