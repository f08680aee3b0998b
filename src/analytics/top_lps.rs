//! Largest liquidity positions across the protocol.
//!
//! The indexer has no global "positions by USD value" view, so the ranking is
//! assembled client side: take the pairs with the most reserves, fetch each
//! pair's largest positions, price every position from the pair's reserves and
//! keep the overall top N.

use std::cmp::Ordering;
use std::time::Duration;

use futures::{stream, StreamExt};
use log::{info, warn};
use rustc_hash::FxHashMap;
use serde::Serialize;

use super::with_timeout;
use crate::indexer::{Indexer, LiquidityPosition, PairSummary};

/// A position priced in USD.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPosition {
    pub user: String,
    pub pair_name: String,
    pub pair_address: String,
    pub token0: String,
    pub token1: String,
    /// `balance / total_supply * reserve_usd`; always finite and non-negative.
    pub usd_value: f64,
}

#[derive(Debug, Clone)]
pub struct RankingOptions {
    /// Pairs (by reserve USD) whose positions are fetched.
    pub top_pairs: usize,
    /// Positions kept after ranking.
    pub top_positions: usize,
    /// In-flight position queries.
    pub max_concurrency: usize,
    /// Per-query timeout.
    pub timeout: Duration,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            top_pairs: 99,
            top_positions: 100,
            max_concurrency: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Descending by `reserve_usd` (missing reserves last), ties by pair id.
fn by_reserve_desc(a: &PairSummary, b: &PairSummary) -> Ordering {
    let a_reserve = a.reserve_usd.unwrap_or(f64::NEG_INFINITY);
    let b_reserve = b.reserve_usd.unwrap_or(f64::NEG_INFINITY);
    b_reserve.total_cmp(&a_reserve).then_with(|| a.id.cmp(&b.id))
}

/// Descending by `usd_value`, ties by pair then user.
fn by_value_desc(a: &RankedPosition, b: &RankedPosition) -> Ordering {
    b.usd_value
        .total_cmp(&a.usd_value)
        .then_with(|| a.pair_address.cmp(&b.pair_address))
        .then_with(|| a.user.cmp(&b.user))
}

/// The `n` pairs holding the most reserves.
pub fn top_pairs_by_reserve(pairs: &FxHashMap<String, PairSummary>, n: usize) -> Vec<&PairSummary> {
    let mut sorted: Vec<&PairSummary> = pairs.values().collect();
    sorted.sort_by(|a, b| by_reserve_desc(a, b));
    sorted.truncate(n);
    sorted
}

/// USD value of a position, `None` when its pair is unknown or the numbers
/// don't produce a finite, non-negative value.
pub fn price_position(
    position: &LiquidityPosition,
    pairs: &FxHashMap<String, PairSummary>,
) -> Option<RankedPosition> {
    let pair = pairs.get(&position.pair.id)?;

    let balance = position.liquidity_token_balance?;
    let total_supply = pair.total_supply.filter(|s| *s > 0.0)?;
    let reserve_usd = pair.reserve_usd?;

    let usd_value = balance / total_supply * reserve_usd;
    if !usd_value.is_finite() || usd_value < 0.0 {
        return None;
    }

    Some(RankedPosition {
        user: position.user.id.clone(),
        pair_name: pair.name(),
        pair_address: pair.id.clone(),
        token0: pair.token0.id.clone(),
        token1: pair.token1.id.clone(),
        usd_value,
    })
}

/// Price, sort and truncate positions.
pub fn rank_positions<I>(positions: I, pairs: &FxHashMap<String, PairSummary>, limit: usize) -> Vec<RankedPosition>
where
    I: IntoIterator<Item = LiquidityPosition>,
{
    let mut ranked: Vec<RankedPosition> = positions
        .into_iter()
        .filter_map(|position| price_position(&position, pairs))
        .collect();

    ranked.sort_by(by_value_desc);
    ranked.truncate(limit);
    ranked
}

/// Top positions across the largest pairs.
///
/// Position queries run concurrently, at most `max_concurrency` at a time,
/// and all of them settle before ranking. A failed or timed-out pair is
/// logged and contributes nothing.
pub async fn fetch_top_lps(
    indexer: &dyn Indexer,
    pairs: &FxHashMap<String, PairSummary>,
    options: &RankingOptions,
) -> Vec<RankedPosition> {
    let start = std::time::Instant::now();
    let timeout = options.timeout;
    let pair_ids: Vec<String> = top_pairs_by_reserve(pairs, options.top_pairs)
        .into_iter()
        .map(|pair| pair.id.clone())
        .collect();

    let lists: Vec<Vec<LiquidityPosition>> = stream::iter(pair_ids)
        .map(move |pair_id| async move {
            match with_timeout(timeout, "liquidity positions", indexer.liquidity_positions(&pair_id)).await {
                Ok(positions) => positions,
                Err(e) => {
                    warn!("Failed to fetch liquidity positions for pair {}: {:#}", pair_id, e);
                    Vec::new()
                },
            }
        })
        .buffer_unordered(options.max_concurrency.max(1))
        .collect()
        .await;

    let fetched: usize = lists.iter().map(Vec::len).sum();
    let ranked = rank_positions(lists.into_iter().flatten(), pairs, options.top_positions);

    info!(
        "Ranked {} of {} liquidity positions in {:?}",
        ranked.len(),
        fetched,
        start.elapsed()
    );

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::mock::{pair, position, MockIndexer};
    use std::sync::atomic::Ordering as AtomicOrdering;

    fn table(pairs: Vec<PairSummary>) -> FxHashMap<String, PairSummary> {
        pairs.into_iter().map(|p| (p.id.clone(), p)).collect()
    }

    fn options() -> RankingOptions {
        RankingOptions {
            max_concurrency: 4,
            timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    #[test]
    fn test_price_position() {
        let pairs = table(vec![pair("0xp", 1_000_000.0, 100.0)]);

        let ranked = price_position(&position("0xu", "0xp", 5.0), &pairs).unwrap();
        assert_eq!(ranked.usd_value, 50_000.0);
        assert_eq!(ranked.pair_name, "AAA-BBB");
        assert_eq!(ranked.token0, "0xp-t0");

        // unknown pair
        assert!(price_position(&position("0xu", "0xmissing", 5.0), &pairs).is_none());
    }

    #[test]
    fn test_zero_supply_is_dropped() {
        let pairs = table(vec![pair("0xp", 1_000.0, 0.0)]);
        assert!(price_position(&position("0xu", "0xp", 5.0), &pairs).is_none());
    }

    #[test]
    fn test_ties_break_deterministically() {
        let pairs = table(vec![pair("0xa", 100.0, 10.0), pair("0xb", 100.0, 10.0)]);
        let positions = vec![
            position("0xu2", "0xb", 1.0),
            position("0xu1", "0xb", 1.0),
            position("0xu3", "0xa", 1.0),
        ];

        let ranked = rank_positions(positions, &pairs, 10);
        let order: Vec<(&str, &str)> = ranked
            .iter()
            .map(|r| (r.pair_address.as_str(), r.user.as_str()))
            .collect();
        assert_eq!(order, vec![("0xa", "0xu3"), ("0xb", "0xu1"), ("0xb", "0xu2")]);
    }

    #[test]
    fn test_top_pairs_by_reserve() {
        let pairs = table(vec![
            pair("0x1", 10.0, 1.0),
            pair("0x2", 30.0, 1.0),
            pair("0x3", 20.0, 1.0),
        ]);

        let top: Vec<&str> = top_pairs_by_reserve(&pairs, 2).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(top, vec!["0x2", "0x3"]);
    }

    #[tokio::test]
    async fn test_failed_pair_does_not_abort_siblings() {
        let pairs = table(vec![
            pair("0x1", 500.0, 100.0),
            pair("0x2", 400.0, 100.0),
            pair("0x3", 300.0, 100.0),
            pair("0x4", 200.0, 100.0),
            pair("0x5", 100.0, 100.0),
        ]);

        let mut mock = MockIndexer::new();
        for (i, id) in ["0x1", "0x2", "0x3", "0x4", "0x5"].iter().enumerate() {
            mock.positions.insert(
                id.to_string(),
                vec![position(&format!("0xuser{}", i), id, 10.0 * (i + 1) as f64)],
            );
        }
        mock.failing_pairs.insert("0x3".to_string());

        let ranked = fetch_top_lps(&mock, &pairs, &options()).await;

        assert_eq!(ranked.len(), 4);
        assert!(ranked.iter().all(|r| r.pair_address != "0x3"));
        for window in ranked.windows(2) {
            assert!(window[0].usd_value >= window[1].usd_value);
        }
        assert_eq!(mock.position_calls.load(AtomicOrdering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_only_largest_pairs_are_queried() {
        let pairs = table((0..120).map(|i| pair(&format!("0x{:03}", i), i as f64, 1.0)).collect());
        let mock = MockIndexer::new();

        fetch_top_lps(&mock, &pairs, &options()).await;

        let requested = mock.requested_pairs.lock().unwrap();
        assert_eq!(requested.len(), 99);
        assert!(!requested.contains(&"0x000".to_string()));
        assert!(requested.contains(&"0x119".to_string()));
    }

    #[tokio::test]
    async fn test_fan_out_is_bounded() {
        let pairs = table((0..20).map(|i| pair(&format!("0x{:02}", i), 100.0, 1.0)).collect());
        let mut mock = MockIndexer::new();
        mock.position_delay = Some(Duration::from_millis(20));

        let opts = RankingOptions {
            max_concurrency: 3,
            ..options()
        };
        fetch_top_lps(&mock, &pairs, &opts).await;

        assert_eq!(mock.position_calls.load(AtomicOrdering::SeqCst), 20);
        assert!(mock.max_in_flight.load(AtomicOrdering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_stalled_pair_times_out() {
        let pairs = table(vec![pair("0x1", 200.0, 10.0), pair("0x2", 100.0, 10.0)]);
        let mut mock = MockIndexer::new();
        mock.positions.insert("0x1".to_string(), vec![position("0xa", "0x1", 1.0)]);
        mock.positions.insert("0x2".to_string(), vec![position("0xb", "0x2", 1.0)]);
        mock.stalled_pairs.insert("0x2".to_string());

        let opts = RankingOptions {
            timeout: Duration::from_millis(50),
            ..options()
        };
        let ranked = fetch_top_lps(&mock, &pairs, &opts).await;

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].pair_address, "0x1");
    }
}
