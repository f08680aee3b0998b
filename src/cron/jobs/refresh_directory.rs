//! Job to refresh the pair and token directories, then re-rank the top
//! liquidity positions against the new pair table.

use anyhow::{bail, Result};
use log::{info, warn};

use crate::store::Store;

pub async fn run(store: &Store) -> Result<()> {
    info!("Starting refresh_directory job...");
    let start = std::time::Instant::now();

    let pairs = store.refresh_all_pairs().await;
    let tokens = store.refresh_all_tokens().await;
    if pairs.is_empty() && tokens.is_empty() {
        bail!("pair and token directories unavailable");
    }

    // Ranks against the stored table, which is the previous one if the
    // pair refresh just failed.
    let top_lps = store.refresh_top_lps().await;
    if top_lps.is_empty() {
        warn!("Top LP ranking produced no positions");
    }

    info!(
        "Completed refresh_directory job in {:?} ({} pairs, {} tokens, {} top LPs)",
        start.elapsed(),
        pairs.len(),
        tokens.len(),
        top_lps.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::mock::{pair, position, settings, MockIndexer};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_refreshes_directory_and_ranking() {
        let mut mock = MockIndexer::new();
        mock.pair_pages = vec![vec![pair("0x1", 1_000.0, 10.0)]];
        mock.positions.insert("0x1".to_string(), vec![position("0xa", "0x1", 2.0)]);
        let store = Store::new(Arc::new(mock), &settings());

        run(&store).await.unwrap();

        assert_eq!(store.all_pairs().await.unwrap().len(), 1);
        let top_lps = store.top_lps().await.unwrap();
        assert_eq!(top_lps.len(), 1);
        assert_eq!(top_lps[0].usd_value, 200.0);
    }

    #[tokio::test]
    async fn test_fails_when_indexer_down() {
        let mut mock = MockIndexer::new();
        mock.fail_directory = true;
        let store = Store::new(Arc::new(mock), &settings());

        assert!(run(&store).await.is_err());
    }

    #[tokio::test]
    async fn test_runs_on_a_spawned_task() {
        let mut mock = MockIndexer::new();
        mock.pair_pages = vec![vec![pair("0x1", 1_000.0, 10.0), pair("0x2", 500.0, 10.0)]];
        mock.positions.insert("0x2".to_string(), vec![position("0xb", "0x2", 1.0)]);
        let store = Arc::new(Store::new(Arc::new(mock), &settings()));

        let task_store = store.clone();
        tokio::spawn(async move { run(&task_store).await })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(store.top_lps().await.unwrap()[0].pair_address, "0x2");
    }
}
