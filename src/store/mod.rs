//! Process-wide analytics store.
//!
//! Holds the latest result of every analytics operation behind one
//! `RwLock`. `ensure_*` accessors answer from the cache and fetch on a miss,
//! `refresh_*` always fetch. Empty or failed results are never stored, so a
//! later access retries. The lock is only taken to read or to apply an
//! [`Update`]; indexer calls run without it.

mod state;

pub use state::{Cached, State, Update};

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::RwLock;

use crate::analytics::{
    chart::fetch_chart_data,
    directory::{fetch_all_pairs, fetch_all_tokens},
    global::fetch_global_data,
    prices::fetch_price_point,
    top_lps::fetch_top_lps,
    transactions::fetch_transactions,
    BlockResolver, ChartData, GlobalData, PricePoint, RankedPosition, RankingOptions, Transactions,
};
use crate::config::{AssetSettings, Settings, TrackedAsset};
use crate::indexer::{Indexer, PairSummary, TokenSummary};
use crate::utils::{now_unix, Timeframe};

pub struct Store {
    indexer: Arc<dyn Indexer>,
    blocks: BlockResolver,
    assets: AssetSettings,
    ranking: RankingOptions,
    timeout: Duration,
    directory_limit: usize,
    chart_timeframe: Timeframe,
    state: RwLock<State>,
}

impl Store {
    pub fn new(indexer: Arc<dyn Indexer>, settings: &Settings) -> Self {
        let timeout = Duration::from_secs(settings.indexer.request_timeout_secs);
        let blocks = BlockResolver::new(
            indexer.clone(),
            timeout,
            Duration::from_secs(settings.indexer.block_cache_ttl_secs),
        );
        let ranking = RankingOptions {
            top_pairs: settings.ranking.top_pairs,
            top_positions: settings.ranking.top_positions,
            max_concurrency: settings.indexer.max_concurrent_requests,
            timeout,
        };

        Self {
            indexer,
            blocks,
            assets: settings.assets.clone(),
            ranking,
            timeout,
            directory_limit: settings.indexer.directory_limit,
            chart_timeframe: settings.refresh.chart_timeframe,
            state: RwLock::new(State::default()),
        }
    }

    pub fn assets(&self) -> &AssetSettings {
        &self.assets
    }

    /// Apply one update atomically.
    pub async fn apply(&self, update: Update) {
        debug!("Applying {} update", update.name());
        self.state.write().await.apply(update, Utc::now());
    }

    pub async fn last_update(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_update
    }

    // ============================================
    // Price points
    // ============================================

    pub async fn price_point(&self, key: &str) -> Option<PricePoint> {
        self.state.read().await.prices.get(key).map(|c| *c.value)
    }

    pub async fn ensure_price_point(&self, asset: &TrackedAsset) -> PricePoint {
        if let Some(point) = self.price_point(&asset.key).await {
            return point;
        }
        self.refresh_price_point(asset).await
    }

    /// Fetch a price point; stored only when the current price is usable.
    pub async fn refresh_price_point(&self, asset: &TrackedAsset) -> PricePoint {
        let point = fetch_price_point(
            self.indexer.as_ref(),
            &self.blocks,
            self.timeout,
            asset,
            now_unix(),
        )
        .await;

        if point.is_valid() {
            self.apply(Update::PricePoint {
                key: asset.key.clone(),
                point,
            })
            .await;
        } else {
            warn!("No usable {} price, not caching", asset.key);
        }
        point
    }

    /// Refresh every tracked asset, native first.
    pub async fn refresh_prices(&self) -> usize {
        let mut refreshed = 0;
        for asset in self.assets.all() {
            if self.refresh_price_point(asset).await.is_valid() {
                refreshed += 1;
            }
        }
        refreshed
    }

    // ============================================
    // Global data
    // ============================================

    pub async fn global_data(&self) -> Option<Arc<GlobalData>> {
        self.state.read().await.global.as_ref().map(|c| c.value.clone())
    }

    pub async fn ensure_global_data(&self) -> Arc<GlobalData> {
        if let Some(data) = self.global_data().await {
            return data;
        }
        self.refresh_global_data().await
    }

    /// Fetch the overview. Needs the native asset's current and one-day-old
    /// prices; without them nothing is fetched and an empty record returned.
    pub async fn refresh_global_data(&self) -> Arc<GlobalData> {
        let native = self.ensure_price_point(&self.assets.native).await;
        let (eth_price, old_eth_price) = match (native.current, native.one_day_ago) {
            (Some(current), Some(old)) if native.has_history() => (current, old),
            _ => {
                warn!("{} price history unavailable, skipping global data", self.assets.native.key);
                return Arc::new(GlobalData::default());
            },
        };

        let data = fetch_global_data(
            self.indexer.as_ref(),
            &self.blocks,
            self.timeout,
            eth_price,
            old_eth_price,
            now_unix(),
        )
        .await;

        if data.is_empty() {
            return Arc::new(data);
        }
        self.apply(Update::GlobalData(data.clone())).await;
        Arc::new(data)
    }

    // ============================================
    // Chart
    // ============================================

    pub async fn chart(&self) -> Option<Arc<ChartData>> {
        self.state.read().await.chart.as_ref().map(|c| c.value.clone())
    }

    /// Chart covering at least `timeframe`. Refetches only when the window
    /// reaches further back than what was fetched before.
    pub async fn ensure_chart(&self, timeframe: Timeframe) -> Arc<ChartData> {
        let now = now_unix();
        let start = timeframe.start_time(now);

        let oldest = {
            let state = self.state.read().await;
            if let Some(chart) = state.chart_covering(start) {
                return chart;
            }
            state.oldest_fetched.map_or(start, |oldest| oldest.min(start))
        };

        self.fetch_chart(oldest, now).await
    }

    /// Rebuild the chart over the window fetched so far, or the configured
    /// timeframe when nothing was fetched yet.
    pub async fn refresh_chart(&self) -> Arc<ChartData> {
        let now = now_unix();
        let oldest = self
            .state
            .read()
            .await
            .oldest_fetched
            .unwrap_or_else(|| self.chart_timeframe.start_time(now));

        self.fetch_chart(oldest, now).await
    }

    async fn fetch_chart(&self, oldest: i64, now: i64) -> Arc<ChartData> {
        let data = fetch_chart_data(self.indexer.as_ref(), self.timeout, oldest, now).await;
        if data.is_empty() {
            return Arc::new(data);
        }

        self.apply(Update::Chart {
            data: data.clone(),
            oldest_fetched: oldest,
        })
        .await;
        Arc::new(data)
    }

    // ============================================
    // Transactions
    // ============================================

    pub async fn transactions(&self) -> Option<Arc<Transactions>> {
        self.state.read().await.transactions.as_ref().map(|c| c.value.clone())
    }

    pub async fn ensure_transactions(&self) -> Arc<Transactions> {
        if let Some(transactions) = self.transactions().await {
            return transactions;
        }
        self.refresh_transactions().await
    }

    pub async fn refresh_transactions(&self) -> Arc<Transactions> {
        let transactions = fetch_transactions(self.indexer.as_ref(), self.timeout).await;
        if !transactions.is_empty() {
            self.apply(Update::Transactions(transactions.clone())).await;
        }
        Arc::new(transactions)
    }

    // ============================================
    // Directory
    // ============================================

    pub async fn all_pairs(&self) -> Option<Arc<Vec<PairSummary>>> {
        self.state.read().await.pairs.as_ref().map(|c| c.value.clone())
    }

    pub async fn ensure_all_pairs(&self) -> Arc<Vec<PairSummary>> {
        if let Some(pairs) = self.all_pairs().await {
            return pairs;
        }
        self.refresh_all_pairs().await
    }

    pub async fn refresh_all_pairs(&self) -> Arc<Vec<PairSummary>> {
        let pairs = fetch_all_pairs(self.indexer.as_ref(), self.timeout, self.directory_limit).await;
        if !pairs.is_empty() {
            self.apply(Update::AllPairs(pairs.clone())).await;
        }
        Arc::new(pairs)
    }

    /// Pair lookup by address, from the last stored directory.
    pub async fn pair(&self, address: &str) -> Option<PairSummary> {
        self.state.read().await.pair_table.get(address).cloned()
    }

    pub async fn all_tokens(&self) -> Option<Arc<Vec<TokenSummary>>> {
        self.state.read().await.tokens.as_ref().map(|c| c.value.clone())
    }

    pub async fn ensure_all_tokens(&self) -> Arc<Vec<TokenSummary>> {
        if let Some(tokens) = self.all_tokens().await {
            return tokens;
        }
        self.refresh_all_tokens().await
    }

    pub async fn refresh_all_tokens(&self) -> Arc<Vec<TokenSummary>> {
        let tokens = fetch_all_tokens(self.indexer.as_ref(), self.timeout, self.directory_limit).await;
        if !tokens.is_empty() {
            self.apply(Update::AllTokens(tokens.clone())).await;
        }
        Arc::new(tokens)
    }

    // ============================================
    // Top liquidity positions
    // ============================================

    pub async fn top_lps(&self) -> Option<Arc<Vec<RankedPosition>>> {
        self.state.read().await.top_lps.as_ref().map(|c| c.value.clone())
    }

    pub async fn ensure_top_lps(&self) -> Arc<Vec<RankedPosition>> {
        if let Some(positions) = self.top_lps().await {
            return positions;
        }
        self.refresh_top_lps().await
    }

    /// Rank positions over the stored pair table, loading the directory
    /// first if it was never fetched.
    pub async fn refresh_top_lps(&self) -> Arc<Vec<RankedPosition>> {
        self.ensure_all_pairs().await;
        let pairs = self.state.read().await.pair_table.clone();
        if pairs.is_empty() {
            warn!("Pair directory empty, skipping top LP ranking");
            return Arc::new(Vec::new());
        }

        let positions = fetch_top_lps(self.indexer.as_ref(), &pairs, &self.ranking).await;
        if !positions.is_empty() {
            self.apply(Update::TopLps(positions.clone())).await;
        }
        Arc::new(positions)
    }

    // ============================================
    // Warm-up
    // ============================================

    /// Populate every section once. Failures leave sections empty for the
    /// next access or scheduled refresh to retry.
    pub async fn warm_up(&self) {
        let start = std::time::Instant::now();

        let prices = self.refresh_prices().await;
        let global = self.refresh_global_data().await;
        let chart = self.ensure_chart(self.chart_timeframe).await;
        let transactions = self.refresh_transactions().await;
        let tokens = self.refresh_all_tokens().await;
        self.refresh_all_pairs().await;
        let top_lps = self.refresh_top_lps().await;

        info!(
            "Store warmed up in {:?}: {} prices, global data {}, {} chart days, {} transactions, {} tokens, {} top LPs",
            start.elapsed(),
            prices,
            if global.is_empty() { "missing" } else { "ok" },
            chart.daily.len(),
            transactions.len(),
            tokens.len(),
            top_lps.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::mock::{pair, position, settings, MockIndexer};
    use crate::indexer::{Swap, TransactionRecord, TransactionRef};
    use std::sync::atomic::Ordering;

    fn store(mock: MockIndexer) -> (Arc<MockIndexer>, Store) {
        let mock = Arc::new(mock);
        let store = Store::new(mock.clone(), &settings());
        (mock, store)
    }

    fn swap_record(id: &str) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            swaps: vec![Swap {
                transaction: TransactionRef {
                    id: id.to_string(),
                    timestamp: Some(1_700_000_000),
                },
                pair: Default::default(),
                to: Some("0xto".to_string()),
                amount_usd: Some(10.0),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_price_point_cached_when_valid() {
        let mut mock = MockIndexer::new();
        mock.prices.insert(("ethPrice".to_string(), None), 2_000.0);
        let (_, store) = store(mock);

        let eth = store.assets().native.clone();
        let point = store.ensure_price_point(&eth).await;

        assert_eq!(point.current, Some(2_000.0));
        assert_eq!(store.price_point("eth").await, Some(point));
        assert!(store.last_update().await.is_some());
    }

    #[tokio::test]
    async fn test_invalid_price_not_cached() {
        let (_, store) = store(MockIndexer::new());

        let eth = store.assets().native.clone();
        let point = store.ensure_price_point(&eth).await;

        assert!(!point.is_valid());
        assert!(store.price_point("eth").await.is_none());
    }

    #[tokio::test]
    async fn test_global_data_needs_price_history() {
        let mut mock = MockIndexer::new();
        // current price only: no block one day back
        mock.prices.insert(("ethPrice".to_string(), None), 2_000.0);
        let (_, store) = store(mock);

        let data = store.ensure_global_data().await;

        assert!(data.is_empty());
        assert!(store.global_data().await.is_none());
    }

    #[tokio::test]
    async fn test_chart_refetches_only_for_wider_window() {
        let (mock, store) = store(MockIndexer::new());

        let week = store.ensure_chart(Timeframe::Week).await;
        assert!(!week.is_empty());
        assert_eq!(mock.day_calls.load(Ordering::SeqCst), 1);

        store.ensure_chart(Timeframe::Week).await;
        assert_eq!(mock.day_calls.load(Ordering::SeqCst), 1);

        let month = store.ensure_chart(Timeframe::Month).await;
        assert_eq!(mock.day_calls.load(Ordering::SeqCst), 2);
        assert!(month.daily.len() > week.daily.len());

        // the month window already covers the week
        store.ensure_chart(Timeframe::Week).await;
        assert_eq!(mock.day_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refresh_chart_uses_configured_timeframe() {
        let mock = Arc::new(MockIndexer::new());
        let mut settings = settings();
        settings.refresh.chart_timeframe = Timeframe::Week;
        let store = Store::new(mock.clone(), &settings);

        store.refresh_chart().await;
        assert_eq!(mock.day_calls.load(Ordering::SeqCst), 1);

        store.ensure_chart(Timeframe::Week).await;
        assert_eq!(mock.day_calls.load(Ordering::SeqCst), 1);

        store.ensure_chart(Timeframe::Month).await;
        assert_eq!(mock.day_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_transactions_retried() {
        let (_, store) = store(MockIndexer::new());

        let transactions = store.ensure_transactions().await;
        assert!(transactions.is_empty());
        assert!(store.transactions().await.is_none());
    }

    #[tokio::test]
    async fn test_transactions_cached() {
        let mut mock = MockIndexer::new();
        mock.transactions = vec![swap_record("0xtx1"), swap_record("0xtx2")];
        let (_, store) = store(mock);

        let transactions = store.ensure_transactions().await;
        assert_eq!(transactions.swaps.len(), 2);
        assert_eq!(store.transactions().await.unwrap().swaps.len(), 2);
    }

    #[tokio::test]
    async fn test_top_lps_loads_directory() {
        let mut mock = MockIndexer::new();
        mock.pair_pages = vec![vec![pair("0x1", 1_000.0, 10.0), pair("0x2", 500.0, 10.0)]];
        mock.positions.insert("0x1".to_string(), vec![position("0xa", "0x1", 1.0)]);
        mock.positions.insert("0x2".to_string(), vec![position("0xb", "0x2", 5.0)]);
        let (mock, store) = store(mock);

        let ranked = store.ensure_top_lps().await;

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].user, "0xb");
        assert_eq!(ranked[0].usd_value, 250.0);
        assert_eq!(ranked[1].usd_value, 100.0);
        assert_eq!(store.pair("0x1").await.unwrap().reserve_usd, Some(1_000.0));

        store.ensure_top_lps().await;
        assert_eq!(mock.pair_calls.load(Ordering::SeqCst), 1);
        assert_eq!(mock.position_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_directory_failure_leaves_store_empty() {
        let mut mock = MockIndexer::new();
        mock.fail_directory = true;
        let (_, store) = store(mock);

        assert!(store.ensure_all_pairs().await.is_empty());
        assert!(store.ensure_all_tokens().await.is_empty());
        assert!(store.ensure_top_lps().await.is_empty());
        assert!(store.all_pairs().await.is_none());
        assert!(store.last_update().await.is_none());
    }
}
