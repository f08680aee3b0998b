use std::time::Duration;

use log::{error, warn};
use serde::Serialize;

use super::{with_timeout, BlockResolver};
use crate::{
    config::TrackedAsset,
    indexer::Indexer,
    utils::{minute_floor, percent_change, ONE_DAY_SECS},
};

/// Current and one-day-old USD price of a tracked asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PricePoint {
    pub current: Option<f64>,
    pub one_day_ago: Option<f64>,
    /// `None` when either price is missing or the old price is zero.
    pub percent_change: Option<f64>,
}

impl PricePoint {
    pub fn new(current: Option<f64>, one_day_ago: Option<f64>) -> Self {
        let percent_change = match (current, one_day_ago) {
            (Some(current), Some(old)) => percent_change(current, old),
            _ => None,
        };

        Self {
            current,
            one_day_ago,
            percent_change,
        }
    }

    /// A usable price: present and non-zero.
    pub fn is_valid(&self) -> bool {
        self.current.is_some_and(|p| p > 0.0)
    }

    /// Both current and one-day prices are usable.
    pub fn has_history(&self) -> bool {
        self.is_valid() && self.one_day_ago.is_some_and(|p| p > 0.0)
    }
}

async fn price_at(
    indexer: &dyn Indexer,
    timeout: Duration,
    asset: &TrackedAsset,
    block: Option<u64>,
) -> Option<f64> {
    match with_timeout(timeout, "bundle price", indexer.bundle_price(&asset.field, block)).await {
        Ok(price) => price,
        Err(e) => {
            error!("Failed to fetch {} price (block {:?}): {:#}", asset.key, block, e);
            None
        },
    }
}

/// Price point for `asset`, reading the bundle now and at the block from one
/// day ago (truncated to the minute).
///
/// The one-day price is `None` when no block is found for that timestamp.
pub async fn fetch_price_point(
    indexer: &dyn Indexer,
    blocks: &BlockResolver,
    timeout: Duration,
    asset: &TrackedAsset,
    now: i64,
) -> PricePoint {
    let one_day_back = minute_floor(now - ONE_DAY_SECS);
    let one_day_block = blocks.resolve_block(one_day_back).await;

    let current = price_at(indexer, timeout, asset, None).await;
    let one_day_ago = match one_day_block {
        Some(block) => price_at(indexer, timeout, asset, Some(block)).await,
        None => {
            warn!("No block one day back for {} price", asset.key);
            None
        },
    };

    PricePoint::new(current, one_day_ago)
}
