use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::utils::Timeframe;

/// GraphQL endpoints and transport limits.
///
/// Both endpoints speak plain GraphQL over HTTP POST:
/// - `url`: the protocol indexer (pairs, tokens, day datas, bundles, positions)
/// - `blocks_url`: the block-metadata indexer used for timestamp → block lookups
#[derive(Debug, Deserialize, Clone)]
pub struct IndexerSettings {
    pub url: String,
    pub blocks_url: String,
    /// Collection holding protocol-wide totals (forks rename the factory entity).
    #[serde(default = "default_factory_entity")]
    pub factory_entity: String,
    /// Collection holding protocol-wide daily snapshots.
    #[serde(default = "default_day_data_entity")]
    pub day_data_entity: String,
    /// Upper bound for a single indexer call, applied to the HTTP client and
    /// to every awaited query.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Maximum in-flight requests for fan-out operations (top LP ranking).
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    /// How long resolved block heights stay memoized.
    #[serde(default = "default_block_cache_ttl_secs")]
    pub block_cache_ttl_secs: u64,
    /// Accumulated entries after which pair/token directory pagination stops.
    #[serde(default = "default_directory_limit")]
    pub directory_limit: usize,
}

fn default_factory_entity() -> String {
    "uniswapFactories".to_string()
}

fn default_day_data_entity() -> String {
    "uniswapDayDatas".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_requests() -> usize {
    16
}

fn default_block_cache_ttl_secs() -> u64 {
    3600
}

fn default_directory_limit() -> usize {
    1_000
}

/// A reference asset whose price is read from the indexer's price bundle.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TrackedAsset {
    /// Store key, e.g. `eth` or `link`
    pub key: String,
    /// Field on the `bundles` entity holding the USD price, e.g. `ethPrice`
    pub field: String,
}

/// Assets tracked for price points.
///
/// The native asset is always tracked; it feeds the liquidity USD conversion
/// of the global overview.
#[derive(Debug, Deserialize, Clone)]
pub struct AssetSettings {
    #[serde(default = "default_native_asset")]
    pub native: TrackedAsset,
    #[serde(default)]
    pub reference: Vec<TrackedAsset>,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            native: default_native_asset(),
            reference: Vec::new(),
        }
    }
}

fn default_native_asset() -> TrackedAsset {
    TrackedAsset {
        key: "eth".to_string(),
        field: "ethPrice".to_string(),
    }
}

impl AssetSettings {
    /// Native asset first, then reference assets in configured order.
    pub fn all(&self) -> impl Iterator<Item = &TrackedAsset> {
        std::iter::once(&self.native).chain(self.reference.iter())
    }
}

/// Cron refresh intervals. A value of 0 disables the job.
#[derive(Debug, Deserialize, Clone)]
pub struct RefreshSettings {
    #[serde(default = "default_prices_interval")]
    pub prices_interval_secs: u64,
    #[serde(default = "default_global_interval")]
    pub global_interval_secs: u64,
    #[serde(default = "default_chart_interval")]
    pub chart_interval_secs: u64,
    #[serde(default = "default_transactions_interval")]
    pub transactions_interval_secs: u64,
    #[serde(default = "default_directory_interval")]
    pub directory_interval_secs: u64,
    /// Window the chart is warmed up with and refreshed over until a wider
    /// one is requested.
    #[serde(default)]
    pub chart_timeframe: Timeframe,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            prices_interval_secs: default_prices_interval(),
            global_interval_secs: default_global_interval(),
            chart_interval_secs: default_chart_interval(),
            transactions_interval_secs: default_transactions_interval(),
            directory_interval_secs: default_directory_interval(),
            chart_timeframe: Timeframe::default(),
        }
    }
}

fn default_prices_interval() -> u64 {
    300 // 5 minutes
}

fn default_global_interval() -> u64 {
    300
}

fn default_chart_interval() -> u64 {
    3600 // 1 hour
}

fn default_transactions_interval() -> u64 {
    60
}

fn default_directory_interval() -> u64 {
    3600
}

/// Top LP ranking sizes.
#[derive(Debug, Deserialize, Clone)]
pub struct RankingSettings {
    #[serde(default = "default_top_pairs")]
    pub top_pairs: usize,
    #[serde(default = "default_top_positions")]
    pub top_positions: usize,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            top_pairs: default_top_pairs(),
            top_positions: default_top_positions(),
        }
    }
}

fn default_top_pairs() -> usize {
    99
}

fn default_top_positions() -> usize {
    100
}

/// Root application configuration.
///
/// Loaded from `config.{yaml,toml,json}` at startup, with `DEXSCOPE__`
/// prefixed environment variables taking precedence
/// (e.g. `DEXSCOPE__INDEXER__URL`).
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub indexer: IndexerSettings,
    #[serde(default)]
    pub assets: AssetSettings,
    #[serde(default)]
    pub refresh: RefreshSettings,
    #[serde(default)]
    pub ranking: RankingSettings,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config"))
            .add_source(Environment::with_prefix("DEXSCOPE").separator("__"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }
}
