use std::sync::Arc;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;

use crate::analytics::{ChartData, GlobalData, PricePoint, RankedPosition, Transactions};
use crate::indexer::{PairSummary, TokenSummary};

/// A cached value and when it was stored.
#[derive(Debug)]
pub struct Cached<T> {
    pub value: Arc<T>,
    pub fetched_at: DateTime<Utc>,
}

impl<T> Cached<T> {
    fn new(value: T, fetched_at: DateTime<Utc>) -> Self {
        Self {
            value: Arc::new(value),
            fetched_at,
        }
    }
}

impl<T> Clone for Cached<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            fetched_at: self.fetched_at,
        }
    }
}

/// Every mutation the store accepts.
#[derive(Debug, Clone)]
pub enum Update {
    GlobalData(GlobalData),
    Transactions(Transactions),
    /// Chart rebuilt from every day snapshot since `oldest_fetched`.
    Chart { data: ChartData, oldest_fetched: i64 },
    PricePoint { key: String, point: PricePoint },
    /// Pair directory; also rebuilds the pair table keyed by address.
    AllPairs(Vec<PairSummary>),
    AllTokens(Vec<TokenSummary>),
    TopLps(Vec<RankedPosition>),
}

impl Update {
    pub fn name(&self) -> &'static str {
        match self {
            Update::GlobalData(_) => "global_data",
            Update::Transactions(_) => "transactions",
            Update::Chart { .. } => "chart",
            Update::PricePoint { .. } => "price_point",
            Update::AllPairs(_) => "all_pairs",
            Update::AllTokens(_) => "all_tokens",
            Update::TopLps(_) => "top_lps",
        }
    }
}

/// Everything the store holds. Only mutated through [`State::apply`].
#[derive(Debug, Default)]
pub struct State {
    pub global: Option<Cached<GlobalData>>,
    pub transactions: Option<Cached<Transactions>>,
    pub chart: Option<Cached<ChartData>>,
    /// Lower bound of the cached chart's history.
    pub oldest_fetched: Option<i64>,
    pub prices: FxHashMap<String, Cached<PricePoint>>,
    pub pairs: Option<Cached<Vec<PairSummary>>>,
    pub pair_table: Arc<FxHashMap<String, PairSummary>>,
    pub tokens: Option<Cached<Vec<TokenSummary>>>,
    pub top_lps: Option<Cached<Vec<RankedPosition>>>,
    pub last_update: Option<DateTime<Utc>>,
}

impl State {
    pub fn apply(&mut self, update: Update, at: DateTime<Utc>) {
        match update {
            Update::GlobalData(data) => {
                self.global = Some(Cached::new(data, at));
            },
            Update::Transactions(transactions) => {
                self.transactions = Some(Cached::new(transactions, at));
            },
            Update::Chart { data, oldest_fetched } => {
                // A narrower chart never replaces a wider one.
                if self.oldest_fetched.is_some_and(|oldest| oldest < oldest_fetched) {
                    return;
                }
                self.chart = Some(Cached::new(data, at));
                self.oldest_fetched = Some(oldest_fetched);
            },
            Update::PricePoint { key, point } => {
                self.prices.insert(key, Cached::new(point, at));
            },
            Update::AllPairs(pairs) => {
                let table: FxHashMap<String, PairSummary> =
                    pairs.iter().map(|p| (p.id.clone(), p.clone())).collect();
                self.pair_table = Arc::new(table);
                self.pairs = Some(Cached::new(pairs, at));
            },
            Update::AllTokens(tokens) => {
                self.tokens = Some(Cached::new(tokens, at));
            },
            Update::TopLps(positions) => {
                self.top_lps = Some(Cached::new(positions, at));
            },
        }
        self.last_update = Some(at);
    }

    /// Cached chart covering history back to `start`.
    pub fn chart_covering(&self, start: i64) -> Option<Arc<ChartData>> {
        match (&self.chart, self.oldest_fetched) {
            (Some(chart), Some(oldest)) if oldest <= start => Some(chart.value.clone()),
            _ => None,
        }
    }
}
