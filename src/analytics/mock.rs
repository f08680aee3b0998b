//! In-memory [`Indexer`] for analytics tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::config::{
    AssetSettings, IndexerSettings, RankingSettings, RefreshSettings, Settings,
};
use crate::indexer::{
    DayData, Indexer, LiquidityPosition, PairSummary, ProtocolTotals, TokenRef, TokenSummary,
    TransactionRecord,
};

#[derive(Default)]
pub struct MockIndexer {
    pub blocks: HashMap<i64, u64>,
    pub fail_blocks: bool,
    pub totals: HashMap<Option<u64>, ProtocolTotals>,
    pub fail_totals: bool,
    pub day_pages: Vec<Vec<DayData>>,
    pub prices: HashMap<(String, Option<u64>), f64>,
    pub fail_prices: bool,
    pub pair_pages: Vec<Vec<PairSummary>>,
    pub token_pages: Vec<Vec<TokenSummary>>,
    pub fail_directory: bool,
    pub positions: HashMap<String, Vec<LiquidityPosition>>,
    pub failing_pairs: HashSet<String>,
    pub stalled_pairs: HashSet<String>,
    pub position_delay: Option<Duration>,
    pub transactions: Vec<TransactionRecord>,
    pub fail_transactions: bool,

    pub block_calls: AtomicUsize,
    pub day_calls: AtomicUsize,
    pub pair_calls: AtomicUsize,
    pub position_calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub requested_pairs: Mutex<Vec<String>>,
}

impl MockIndexer {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T: Clone>(pages: &[Vec<T>], skip: usize, page_size: usize) -> Vec<T> {
    pages.get(skip / page_size).cloned().unwrap_or_default()
}

#[async_trait]
impl Indexer for MockIndexer {
    async fn blocks_at(&self, timestamps: &[i64]) -> Result<Vec<Option<u64>>> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_blocks {
            bail!("blocks indexer unavailable");
        }
        Ok(timestamps
            .iter()
            .map(|ts| self.blocks.get(ts).copied())
            .collect())
    }

    async fn protocol_totals(&self, block: Option<u64>) -> Result<Option<ProtocolTotals>> {
        if self.fail_totals {
            bail!("totals query failed");
        }
        Ok(self.totals.get(&block).cloned())
    }

    async fn day_datas(&self, _start_time: i64, skip: usize) -> Result<Vec<DayData>> {
        self.day_calls.fetch_add(1, Ordering::SeqCst);
        Ok(page(&self.day_pages, skip, 1_000))
    }

    async fn bundle_price(&self, field: &str, block: Option<u64>) -> Result<Option<f64>> {
        if self.fail_prices {
            bail!("bundle query failed");
        }
        Ok(self.prices.get(&(field.to_string(), block)).copied())
    }

    async fn pairs(&self, skip: usize) -> Result<Vec<PairSummary>> {
        self.pair_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_directory {
            bail!("pairs query failed");
        }
        Ok(page(&self.pair_pages, skip, 500))
    }

    async fn tokens(&self, skip: usize) -> Result<Vec<TokenSummary>> {
        if self.fail_directory {
            bail!("tokens query failed");
        }
        Ok(page(&self.token_pages, skip, 500))
    }

    async fn liquidity_positions(&self, pair: &str) -> Result<Vec<LiquidityPosition>> {
        self.position_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_pairs.lock().unwrap().push(pair.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.position_delay {
            tokio::time::sleep(delay).await;
        }
        if self.stalled_pairs.contains(pair) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_pairs.contains(pair) {
            bail!("positions query failed for {}", pair);
        }
        Ok(self.positions.get(pair).cloned().unwrap_or_default())
    }

    async fn transactions(&self) -> Result<Vec<TransactionRecord>> {
        if self.fail_transactions {
            bail!("transactions query failed");
        }
        Ok(self.transactions.clone())
    }
}

// ============================================
// Fixtures
// ============================================

pub fn token(id: &str, symbol: &str) -> TokenRef {
    TokenRef {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: symbol.to_string(),
    }
}

pub fn pair(id: &str, reserve_usd: f64, total_supply: f64) -> PairSummary {
    PairSummary {
        id: id.to_string(),
        token0: token(&format!("{}-t0", id), "AAA"),
        token1: token(&format!("{}-t1", id), "BBB"),
        reserve_usd: Some(reserve_usd),
        total_supply: Some(total_supply),
        ..Default::default()
    }
}

pub fn position(user: &str, pair: &str, balance: f64) -> LiquidityPosition {
    LiquidityPosition {
        user: crate::indexer::EntityRef {
            id: user.to_string(),
        },
        pair: crate::indexer::EntityRef {
            id: pair.to_string(),
        },
        liquidity_token_balance: Some(balance),
    }
}

pub fn day(date: i64, volume: f64, liquidity: f64) -> DayData {
    DayData {
        id: (date / 86_400).to_string(),
        date: Some(date),
        daily_volume_usd: Some(volume),
        total_liquidity_usd: Some(liquidity),
        ..Default::default()
    }
}

pub fn totals(volume: f64, liquidity_eth: f64, tx_count: u64) -> ProtocolTotals {
    ProtocolTotals {
        total_volume_usd: Some(volume),
        total_liquidity_eth: Some(liquidity_eth),
        tx_count: Some(tx_count),
        ..Default::default()
    }
}

pub fn settings() -> Settings {
    Settings {
        indexer: IndexerSettings {
            url: "http://localhost:8000/subgraphs/name/protocol".to_string(),
            blocks_url: "http://localhost:8000/subgraphs/name/blocks".to_string(),
            factory_entity: "uniswapFactories".to_string(),
            day_data_entity: "uniswapDayDatas".to_string(),
            request_timeout_secs: 5,
            max_concurrent_requests: 4,
            block_cache_ttl_secs: 60,
            directory_limit: 1_000,
        },
        assets: AssetSettings::default(),
        refresh: RefreshSettings::default(),
        ranking: RankingSettings::default(),
        log_level: "info".to_string(),
    }
}
