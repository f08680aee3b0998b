//! Timestamp → block height resolution.
//!
//! Point-in-time ("time travel") queries address history by block number,
//! so every "N days ago" metric starts here. A missing block is a normal
//! outcome (indexer lag, timestamp in the future) and surfaces as `None`.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error};
use moka::future::Cache;

use super::with_timeout;
use crate::indexer::Indexer;

/// Block resolver with a memo of already-resolved timestamps.
#[derive(Clone)]
pub struct BlockResolver {
    indexer: Arc<dyn Indexer>,
    timeout: Duration,
    /// Only hits are cached; misses are retried on the next request.
    resolved: Cache<i64, u64>,
}

impl BlockResolver {
    pub fn new(indexer: Arc<dyn Indexer>, timeout: Duration, cache_ttl: Duration) -> Self {
        let resolved = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(cache_ttl)
            .build();

        Self {
            indexer,
            timeout,
            resolved,
        }
    }

    /// Block height for a single timestamp.
    pub async fn resolve_block(&self, timestamp: i64) -> Option<u64> {
        self.resolve_blocks(&[timestamp]).await.into_iter().next().flatten()
    }

    /// Block heights for many timestamps, in input order.
    ///
    /// Cached timestamps are answered locally; the rest go out as one batch.
    /// If the batch fails every uncached entry is `None`.
    pub async fn resolve_blocks(&self, timestamps: &[i64]) -> Vec<Option<u64>> {
        let mut resolved: Vec<Option<u64>> = Vec::with_capacity(timestamps.len());
        let mut missing: Vec<i64> = Vec::new();

        for ts in timestamps {
            let cached = self.resolved.get(ts).await;
            if cached.is_none() && !missing.contains(ts) {
                missing.push(*ts);
            }
            resolved.push(cached);
        }

        if missing.is_empty() {
            return resolved;
        }

        let fetched = match with_timeout(
            self.timeout,
            "block lookup",
            self.indexer.blocks_at(&missing),
        )
        .await
        {
            Ok(blocks) => blocks,
            Err(e) => {
                error!("Failed to resolve blocks for {} timestamps: {:#}", missing.len(), e);
                return resolved;
            },
        };

        for (ts, block) in missing.iter().zip(fetched) {
            let Some(block) = block else {
                debug!("No block found near timestamp {}", ts);
                continue;
            };
            self.resolved.insert(*ts, block).await;

            for (slot, requested) in resolved.iter_mut().zip(timestamps) {
                if requested == ts {
                    *slot = Some(block);
                }
            }
        }

        resolved
    }
}
