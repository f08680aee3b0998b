use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use super::{
    queries::{self, BLOCKS_PER_QUERY},
    DayData, Indexer, LiquidityPosition, PairSummary, ProtocolTotals, TokenSummary,
    TransactionRecord,
};
use crate::{config::IndexerSettings, utils::value_to_f64};

/// GraphQL request body.
#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

/// GraphQL response envelope.
#[derive(Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Deserialize)]
struct BlockRow {
    #[serde(default, deserialize_with = "crate::utils::de_u64_opt")]
    number: Option<u64>,
}

#[derive(Deserialize)]
struct FactoriesData {
    #[serde(default)]
    factories: Vec<ProtocolTotals>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DayDatasData {
    #[serde(default)]
    day_datas: Vec<DayData>,
}

#[derive(Deserialize)]
struct BundlesData {
    #[serde(default)]
    bundles: Vec<HashMap<String, Value>>,
}

#[derive(Deserialize)]
struct PairsData {
    #[serde(default)]
    pairs: Vec<PairSummary>,
}

#[derive(Deserialize)]
struct TokensData {
    #[serde(default)]
    tokens: Vec<TokenSummary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PositionsData {
    #[serde(default)]
    liquidity_positions: Vec<LiquidityPosition>,
}

#[derive(Deserialize)]
struct TransactionsData {
    #[serde(default)]
    transactions: Vec<TransactionRecord>,
}

/// HTTP GraphQL client for the protocol indexer and the block indexer.
#[derive(Clone)]
pub struct GraphqlIndexer {
    http: Client,
    url: Url,
    blocks_url: Url,
    factory_entity: String,
    day_data_entity: String,
}

impl GraphqlIndexer {
    pub fn new(settings: &IndexerSettings) -> Result<Self> {
        let url = Url::parse(&settings.url).context("Invalid indexer URL")?;
        let blocks_url = Url::parse(&settings.blocks_url).context("Invalid blocks indexer URL")?;

        queries::validate_name(&settings.factory_entity)?;
        queries::validate_name(&settings.day_data_entity)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            url,
            blocks_url,
            factory_entity: settings.factory_entity.clone(),
            day_data_entity: settings.day_data_entity.clone(),
        })
    }

    /// POST a GraphQL document and decode `data`.
    ///
    /// A non-empty `errors` array fails the call even when partial data is present.
    async fn query<T: DeserializeOwned>(&self, url: &Url, query: &str, variables: Value) -> Result<T> {
        let start = Instant::now();

        let response = self
            .http
            .post(url.clone())
            .json(&GraphqlRequest { query, variables })
            .send()
            .await
            .with_context(|| format!("GraphQL request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("GraphQL endpoint {} returned an error status", url))?;

        let body: GraphqlResponse<T> = response
            .json()
            .await
            .context("Failed to decode GraphQL response")?;

        debug!("GraphQL query to {} completed in {:?}", url, start.elapsed());

        if !body.errors.is_empty() {
            let messages: Vec<&str> = body.errors.iter().map(|e| e.message.as_str()).collect();
            bail!("GraphQL errors: {}", messages.join("; "));
        }

        body.data.ok_or_else(|| anyhow!("GraphQL response has no data"))
    }

    async fn blocks_chunk(&self, timestamps: &[i64]) -> Result<Vec<Option<u64>>> {
        let query = queries::blocks_query(timestamps);
        let data: HashMap<String, Vec<BlockRow>> =
            self.query(&self.blocks_url, &query, json!({})).await?;

        Ok((0..timestamps.len())
            .map(|i| {
                data.get(&format!("b{}", i))
                    .and_then(|rows| rows.first())
                    .and_then(|row| row.number)
            })
            .collect())
    }
}

#[async_trait]
impl Indexer for GraphqlIndexer {
    async fn blocks_at(&self, timestamps: &[i64]) -> Result<Vec<Option<u64>>> {
        let mut blocks = Vec::with_capacity(timestamps.len());

        for chunk in timestamps.chunks(BLOCKS_PER_QUERY) {
            blocks.extend(self.blocks_chunk(chunk).await?);
        }

        Ok(blocks)
    }

    async fn protocol_totals(&self, block: Option<u64>) -> Result<Option<ProtocolTotals>> {
        let query = queries::protocol_totals_query(&self.factory_entity, block);
        let data: FactoriesData = self.query(&self.url, &query, json!({})).await?;

        Ok(data.factories.into_iter().next())
    }

    async fn day_datas(&self, start_time: i64, skip: usize) -> Result<Vec<DayData>> {
        let query = queries::day_datas_query(&self.day_data_entity);
        let data: DayDatasData = self
            .query(&self.url, &query, json!({ "startTime": start_time, "skip": skip }))
            .await?;

        Ok(data.day_datas)
    }

    async fn bundle_price(&self, field: &str, block: Option<u64>) -> Result<Option<f64>> {
        queries::validate_name(field)?;

        let query = queries::bundle_price_query(field, block);
        let data: BundlesData = self.query(&self.url, &query, json!({})).await?;

        Ok(data
            .bundles
            .first()
            .and_then(|bundle| bundle.get(field))
            .and_then(value_to_f64))
    }

    async fn pairs(&self, skip: usize) -> Result<Vec<PairSummary>> {
        let query = queries::all_pairs_query();
        let data: PairsData = self.query(&self.url, &query, json!({ "skip": skip })).await?;

        Ok(data.pairs)
    }

    async fn tokens(&self, skip: usize) -> Result<Vec<TokenSummary>> {
        let query = queries::all_tokens_query();
        let data: TokensData = self.query(&self.url, &query, json!({ "skip": skip })).await?;

        Ok(data.tokens)
    }

    async fn liquidity_positions(&self, pair: &str) -> Result<Vec<LiquidityPosition>> {
        let query = queries::liquidity_positions_query();
        let data: PositionsData = self.query(&self.url, &query, json!({ "pair": pair })).await?;

        Ok(data.liquidity_positions)
    }

    async fn transactions(&self) -> Result<Vec<TransactionRecord>> {
        let query = queries::transactions_query();
        let data: TransactionsData = self.query(&self.url, &query, json!({})).await?;

        Ok(data.transactions)
    }
}
