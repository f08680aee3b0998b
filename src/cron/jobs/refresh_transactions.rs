//! Job to refresh the recent transactions feed.

use anyhow::{bail, Result};
use log::info;

use crate::store::Store;

pub async fn run(store: &Store) -> Result<()> {
    let start = std::time::Instant::now();

    let transactions = store.refresh_transactions().await;
    if transactions.is_empty() {
        bail!("no transactions returned");
    }

    info!(
        "Completed refresh_transactions job in {:?} ({} mints, {} burns, {} swaps)",
        start.elapsed(),
        transactions.mints.len(),
        transactions.burns.len(),
        transactions.swaps.len()
    );
    Ok(())
}
