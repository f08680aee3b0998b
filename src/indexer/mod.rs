//! Boundary to the external GraphQL indexing services.
//!
//! [`Indexer`] is the only seam the analytics layer talks through.
//! [`GraphqlIndexer`] implements it over HTTP; tests substitute in-memory
//! implementations.

mod client;
pub mod models;
pub mod queries;

use anyhow::Result;
use async_trait::async_trait;

pub use client::GraphqlIndexer;
pub use models::{
    Burn, DayData, EntityRef, EventPair, LiquidityPosition, Mint, PairSummary, ProtocolTotals,
    Swap, TokenRef, TokenSummary, TransactionRecord, TransactionRef,
};

/// Queries the analytics layer issues against the indexer.
///
/// Implementations return `Err` only for transport-level failures (network,
/// HTTP status, GraphQL `errors`, undecodable body). Missing entities are
/// `Ok(None)` / empty collections.
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Earliest block in `(ts, ts + 600s)` for each timestamp, in input order.
    async fn blocks_at(&self, timestamps: &[i64]) -> Result<Vec<Option<u64>>>;

    /// Protocol-wide totals, at `block` when given, otherwise latest.
    async fn protocol_totals(&self, block: Option<u64>) -> Result<Option<ProtocolTotals>>;

    /// One page of daily snapshots dated after `start_time`, ascending.
    async fn day_datas(&self, start_time: i64, skip: usize) -> Result<Vec<DayData>>;

    /// USD price stored in `field` of the price bundle.
    async fn bundle_price(&self, field: &str, block: Option<u64>) -> Result<Option<f64>>;

    /// One directory page of pairs.
    async fn pairs(&self, skip: usize) -> Result<Vec<PairSummary>>;

    /// One directory page of tokens.
    async fn tokens(&self, skip: usize) -> Result<Vec<TokenSummary>>;

    /// Largest LP positions of a pair.
    async fn liquidity_positions(&self, pair: &str) -> Result<Vec<LiquidityPosition>>;

    /// Most recent transactions with their mints, burns and swaps.
    async fn transactions(&self) -> Result<Vec<TransactionRecord>>;
}
