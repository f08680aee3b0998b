//! Metric derivation over indexer data.
//!
//! - [`blocks`] - timestamp → block height resolution for time-travel queries
//! - [`pagination`] - skip-based paging with short-page termination
//! - [`chart`] - gap-filled daily series and weekly rollup
//! - [`global`] - protocol overview with day/week deltas
//! - [`prices`] - reference asset price points
//! - [`directory`] - all pairs / all tokens listings
//! - [`transactions`] - recent mints, burns and swaps
//! - [`top_lps`] - top liquidity positions across the largest pairs
//!
//! Fetching operations never fail: transport errors are logged and replaced
//! by empty or partial results.

pub mod blocks;
pub mod chart;
pub mod directory;
pub mod global;
pub mod pagination;
pub mod prices;
pub mod top_lps;
pub mod transactions;

#[cfg(test)]
pub(crate) mod mock;

use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Result};

pub use blocks::BlockResolver;
pub use chart::{ChartData, DailySnapshot, WeeklyBucket};
pub use global::GlobalData;
pub use prices::PricePoint;
pub use top_lps::{RankedPosition, RankingOptions};
pub use transactions::Transactions;

/// Await an indexer call, failing with a timeout error after `limit`.
pub(crate) async fn with_timeout<T, F>(limit: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow!("{} timed out after {:?}", what, limit)),
    }
}
