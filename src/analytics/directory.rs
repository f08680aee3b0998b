//! Directory listings of every pair and token, used for search and as the
//! pair-data table behind the LP ranking.

use std::time::Duration;

use log::{error, info};

use super::{pagination::paginate, with_timeout};
use crate::indexer::{queries::DIRECTORY_PAGE_SIZE, Indexer, PairSummary, TokenSummary};

/// All pairs, largest first, stopping once `limit` entries are gathered.
///
/// Returns an empty list if any page fails.
pub async fn fetch_all_pairs(indexer: &dyn Indexer, timeout: Duration, limit: usize) -> Vec<PairSummary> {
    let result = paginate(DIRECTORY_PAGE_SIZE, Some(limit), move |skip| {
        with_timeout(timeout, "pairs page", indexer.pairs(skip))
    })
    .await;

    match result {
        Ok(pairs) => {
            info!("Fetched {} pairs", pairs.len());
            pairs
        },
        Err(e) => {
            error!("Failed to fetch pairs: {:#}", e);
            Vec::new()
        },
    }
}

/// All tokens by trade volume, stopping once `limit` entries are gathered.
pub async fn fetch_all_tokens(indexer: &dyn Indexer, timeout: Duration, limit: usize) -> Vec<TokenSummary> {
    let result = paginate(DIRECTORY_PAGE_SIZE, Some(limit), move |skip| {
        with_timeout(timeout, "tokens page", indexer.tokens(skip))
    })
    .await;

    match result {
        Ok(tokens) => {
            info!("Fetched {} tokens", tokens.len());
            tokens
        },
        Err(e) => {
            error!("Failed to fetch tokens: {:#}", e);
            Vec::new()
        },
    }
}
