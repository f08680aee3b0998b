//! Protocol overview: current totals plus day-over-day and week-over-week deltas.
//!
//! Totals are cumulative on the indexer, so "volume in the last day" is the
//! difference between the current total and the total one day ago, and its
//! change compares that delta with the one from the day before.

use std::time::Duration;

use futures::future::join_all;
use log::{error, info, warn};
use serde::Serialize;

use super::{with_timeout, BlockResolver};
use crate::{
    indexer::{Indexer, ProtocolTotals},
    utils::{percent_change, two_point_percent_change, ONE_DAY_SECS},
};

const ONE_WEEK_SECS: i64 = 7 * ONE_DAY_SECS;

/// Overview record. Every derived field is optional so a partially fetched
/// record is representable; callers render missing values as placeholders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobalData {
    /// Latest protocol totals, if the current query succeeded.
    pub current: Option<ProtocolTotals>,
    pub total_liquidity_usd: Option<f64>,
    pub one_day_volume_usd: Option<f64>,
    pub volume_change_usd: Option<f64>,
    pub one_week_volume_usd: Option<f64>,
    pub weekly_volume_change: Option<f64>,
    pub liquidity_change_usd: Option<f64>,
    pub one_day_txns: Option<f64>,
    pub txn_change: Option<f64>,
}

impl GlobalData {
    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Whether the historical deltas were derived.
    pub fn has_changes(&self) -> bool {
        self.one_day_volume_usd.is_some()
    }
}

/// Historical snapshots needed for the deltas.
struct History {
    one_day: ProtocolTotals,
    two_day: ProtocolTotals,
    one_week: ProtocolTotals,
    two_week: ProtocolTotals,
}

/// Fill the derived fields of `data` from the current totals and history.
fn derive(
    data: &mut GlobalData,
    current: &ProtocolTotals,
    history: &History,
    eth_price: f64,
    old_eth_price: f64,
) {
    let volume = current.total_volume_usd.unwrap_or(0.0);

    let (one_day_volume, volume_change) = two_point_percent_change(
        volume,
        history.one_day.total_volume_usd,
        history.two_day.total_volume_usd,
    );
    let (one_week_volume, weekly_change) = two_point_percent_change(
        volume,
        history.one_week.total_volume_usd,
        history.two_week.total_volume_usd,
    );
    let (one_day_txns, txn_change) = two_point_percent_change(
        current.tx_count.unwrap_or(0) as f64,
        history.one_day.tx_count.map(|c| c as f64),
        history.two_day.tx_count.map(|c| c as f64),
    );

    let liquidity_usd = current.total_liquidity_eth.unwrap_or(0.0) * eth_price;
    let old_liquidity_usd = history.one_day.total_liquidity_eth.unwrap_or(0.0) * old_eth_price;

    data.one_day_volume_usd = Some(one_day_volume);
    data.volume_change_usd = Some(volume_change);
    data.one_week_volume_usd = Some(one_week_volume);
    data.weekly_volume_change = Some(weekly_change);
    data.one_day_txns = Some(one_day_txns);
    data.txn_change = Some(txn_change);
    data.liquidity_change_usd = percent_change(liquidity_usd, old_liquidity_usd);
}

/// Totals at `block`; `None` when the block is unknown, the entity is
/// missing, or the query fails.
async fn totals_at(
    indexer: &dyn Indexer,
    timeout: Duration,
    block: Option<u64>,
    label: &str,
) -> Option<ProtocolTotals> {
    let Some(block) = block else {
        warn!("No block for {} snapshot, skipping", label);
        return None;
    };

    match with_timeout(timeout, "protocol totals", indexer.protocol_totals(Some(block))).await {
        Ok(totals) => totals,
        Err(e) => {
            error!("Failed to fetch {} protocol totals at block {}: {:#}", label, block, e);
            None
        },
    }
}

/// Build the overview record.
///
/// `eth_price` / `old_eth_price` are the native asset's current and one-day-old
/// USD prices; liquidity is tracked in the native asset on the indexer.
///
/// Never fails: on transport errors the record holds whatever was fetched.
/// The deltas are only derived when all four historical snapshots exist.
pub async fn fetch_global_data(
    indexer: &dyn Indexer,
    blocks: &BlockResolver,
    timeout: Duration,
    eth_price: f64,
    old_eth_price: f64,
    now: i64,
) -> GlobalData {
    let start = std::time::Instant::now();
    let mut data = GlobalData::default();

    let timestamps = [
        now - ONE_DAY_SECS,
        now - 2 * ONE_DAY_SECS,
        now - ONE_WEEK_SECS,
        now - 2 * ONE_WEEK_SECS,
    ];
    let resolved = blocks.resolve_blocks(&timestamps).await;

    let current = match with_timeout(timeout, "protocol totals", indexer.protocol_totals(None)).await {
        Ok(Some(current)) => current,
        Ok(None) => {
            warn!("Indexer returned no protocol totals");
            return data;
        },
        Err(e) => {
            error!("Failed to fetch current protocol totals: {:#}", e);
            return data;
        },
    };

    data.total_liquidity_usd = current.total_liquidity_eth.map(|eth| eth * eth_price);
    data.current = Some(current.clone());

    let labels = ["one day", "two day", "one week", "two week"];
    let snapshots = join_all(
        resolved
            .iter()
            .zip(labels)
            .map(|(block, label)| totals_at(indexer, timeout, *block, label)),
    )
    .await;

    let history = match snapshots.as_slice() {
        [Some(one_day), Some(two_day), Some(one_week), Some(two_week)] => History {
            one_day: one_day.clone(),
            two_day: two_day.clone(),
            one_week: one_week.clone(),
            two_week: two_week.clone(),
        },
        _ => {
            warn!("Historical protocol snapshots incomplete, returning current totals only");
            return data;
        },
    };
    derive(&mut data, &current, &history, eth_price, old_eth_price);

    info!(
        "Global data updated in {:?}: 24h volume {:.2} USD, liquidity {:.2} USD",
        start.elapsed(),
        data.one_day_volume_usd.unwrap_or(0.0),
        data.total_liquidity_usd.unwrap_or(0.0)
    );

    data
}
