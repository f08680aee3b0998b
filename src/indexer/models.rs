//! Wire entities returned by the protocol indexer.
//!
//! Every numeric field is optional and parsed defensively: indexers return
//! decimals as strings, occasionally as numbers, and `null` for fields that
//! were never written.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::{de_f64_opt, de_i64_opt, de_u64_opt};

/// `{ id }` reference to another entity (user, pair, transaction).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EntityRef {
    pub id: String,
}

/// Protocol-wide totals from the factory entity, optionally at a past block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ProtocolTotals {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "totalVolumeUSD", deserialize_with = "de_f64_opt")]
    pub total_volume_usd: Option<f64>,
    #[serde(default, rename = "totalVolumeETH", deserialize_with = "de_f64_opt")]
    pub total_volume_eth: Option<f64>,
    #[serde(default, rename = "untrackedVolumeUSD", deserialize_with = "de_f64_opt")]
    pub untracked_volume_usd: Option<f64>,
    #[serde(default, rename = "totalLiquidityUSD", deserialize_with = "de_f64_opt")]
    pub total_liquidity_usd: Option<f64>,
    #[serde(default, rename = "totalLiquidityETH", deserialize_with = "de_f64_opt")]
    pub total_liquidity_eth: Option<f64>,
    #[serde(default, rename = "txCount", deserialize_with = "de_u64_opt")]
    pub tx_count: Option<u64>,
    #[serde(default, rename = "pairCount", deserialize_with = "de_u64_opt")]
    pub pair_count: Option<u64>,
}

/// Raw protocol day snapshot. Days without trades have no entity at all.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DayData {
    #[serde(default)]
    pub id: String,
    /// Start of the day (unix seconds). Records without one are skipped.
    #[serde(default, deserialize_with = "de_i64_opt")]
    pub date: Option<i64>,
    #[serde(default, rename = "dailyVolumeUSD", deserialize_with = "de_f64_opt")]
    pub daily_volume_usd: Option<f64>,
    #[serde(default, rename = "dailyVolumeETH", deserialize_with = "de_f64_opt")]
    pub daily_volume_eth: Option<f64>,
    #[serde(default, rename = "totalLiquidityUSD", deserialize_with = "de_f64_opt")]
    pub total_liquidity_usd: Option<f64>,
    #[serde(default, rename = "totalLiquidityETH", deserialize_with = "de_f64_opt")]
    pub total_liquidity_eth: Option<f64>,
    #[serde(default, rename = "txCount", deserialize_with = "de_u64_opt")]
    pub tx_count: Option<u64>,
    /// Opaque payload passed through to chart consumers.
    #[serde(default, rename = "mostLiquidTokens")]
    pub most_liquid_tokens: Value,
}

/// Token as embedded in pair and transaction entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenRef {
    pub id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
}

/// Directory entry for a pair. Also the pair-data table the LP ranker reads.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PairSummary {
    pub id: String,
    pub token0: TokenRef,
    pub token1: TokenRef,
    #[serde(default, deserialize_with = "de_f64_opt")]
    pub reserve0: Option<f64>,
    #[serde(default, deserialize_with = "de_f64_opt")]
    pub reserve1: Option<f64>,
    #[serde(default, rename = "reserveUSD", deserialize_with = "de_f64_opt")]
    pub reserve_usd: Option<f64>,
    #[serde(default, rename = "totalSupply", deserialize_with = "de_f64_opt")]
    pub total_supply: Option<f64>,
    #[serde(default, rename = "trackedReserveETH", deserialize_with = "de_f64_opt")]
    pub tracked_reserve_eth: Option<f64>,
    #[serde(default, rename = "volumeUSD", deserialize_with = "de_f64_opt")]
    pub volume_usd: Option<f64>,
}

impl PairSummary {
    /// `TOKEN0-TOKEN1`
    pub fn name(&self) -> String {
        format!("{}-{}", self.token0.symbol, self.token1.symbol)
    }
}

/// Directory entry for a token.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TokenSummary {
    pub id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "derivedETH", deserialize_with = "de_f64_opt")]
    pub derived_eth: Option<f64>,
    #[serde(default, rename = "tradeVolumeUSD", deserialize_with = "de_f64_opt")]
    pub trade_volume_usd: Option<f64>,
    #[serde(default, rename = "totalLiquidity", deserialize_with = "de_f64_opt")]
    pub total_liquidity: Option<f64>,
}

/// A user's LP-token balance in one pair.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LiquidityPosition {
    pub user: EntityRef,
    pub pair: EntityRef,
    #[serde(default, rename = "liquidityTokenBalance", deserialize_with = "de_f64_opt")]
    pub liquidity_token_balance: Option<f64>,
}

/// Transaction hash and timestamp embedded in mint/burn/swap entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TransactionRef {
    pub id: String,
    #[serde(default, deserialize_with = "de_u64_opt")]
    pub timestamp: Option<u64>,
}

/// Pair as embedded in mint/burn/swap entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EventPair {
    #[serde(default)]
    pub id: String,
    pub token0: TokenRef,
    pub token1: TokenRef,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Mint {
    pub transaction: TransactionRef,
    pub pair: EventPair,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default, deserialize_with = "de_f64_opt")]
    pub liquidity: Option<f64>,
    #[serde(default, deserialize_with = "de_f64_opt")]
    pub amount0: Option<f64>,
    #[serde(default, deserialize_with = "de_f64_opt")]
    pub amount1: Option<f64>,
    #[serde(default, rename = "amountUSD", deserialize_with = "de_f64_opt")]
    pub amount_usd: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Burn {
    pub transaction: TransactionRef,
    pub pair: EventPair,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default, deserialize_with = "de_f64_opt")]
    pub liquidity: Option<f64>,
    #[serde(default, deserialize_with = "de_f64_opt")]
    pub amount0: Option<f64>,
    #[serde(default, deserialize_with = "de_f64_opt")]
    pub amount1: Option<f64>,
    #[serde(default, rename = "amountUSD", deserialize_with = "de_f64_opt")]
    pub amount_usd: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Swap {
    pub transaction: TransactionRef,
    pub pair: EventPair,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default, rename = "amount0In", deserialize_with = "de_f64_opt")]
    pub amount0_in: Option<f64>,
    #[serde(default, rename = "amount0Out", deserialize_with = "de_f64_opt")]
    pub amount0_out: Option<f64>,
    #[serde(default, rename = "amount1In", deserialize_with = "de_f64_opt")]
    pub amount1_in: Option<f64>,
    #[serde(default, rename = "amount1Out", deserialize_with = "de_f64_opt")]
    pub amount1_out: Option<f64>,
    #[serde(default, rename = "amountUSD", deserialize_with = "de_f64_opt")]
    pub amount_usd: Option<f64>,
}

/// One on-chain transaction with the protocol events it emitted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TransactionRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub mints: Vec<Mint>,
    #[serde(default)]
    pub burns: Vec<Burn>,
    #[serde(default)]
    pub swaps: Vec<Swap>,
}
