//! GraphQL documents sent to the protocol and block indexers.
//!
//! Collections that forks commonly rename (factory, day datas) are spliced in
//! from configuration; everything else is a fixed document with variables.

use anyhow::{bail, Result};

/// Daily snapshots per page; a shorter page ends pagination.
pub const DAY_DATA_PAGE_SIZE: usize = 1_000;

/// Pairs/tokens per directory page.
pub const DIRECTORY_PAGE_SIZE: usize = 500;

/// Largest positions fetched per pair for the top LP ranking.
pub const POSITIONS_PER_PAIR: usize = 10;

/// Recent transactions fetched for the global feed.
pub const TRANSACTIONS_TO_FETCH: usize = 100;

/// Blocks are searched in `(timestamp, timestamp + window)`.
pub const BLOCK_SEARCH_WINDOW_SECS: i64 = 600;

/// Timestamps resolved per block query.
pub const BLOCKS_PER_QUERY: usize = 100;

const PAIR_FIELDS: &str = r#"
    id
    token0 { id symbol name }
    token1 { id symbol name }
    reserve0
    reserve1
    reserveUSD
    totalSupply
    trackedReserveETH
    volumeUSD"#;

const EVENT_PAIR_FIELDS: &str = r#"pair {
        id
        token0 { id symbol }
        token1 { id symbol }
      }"#;

/// `block: { number: N }` argument for time-travel queries, empty for latest.
fn block_arg(block: Option<u64>) -> String {
    match block {
        Some(number) => format!(", block: {{ number: {} }}", number),
        None => String::new(),
    }
}

/// GraphQL names are `[_A-Za-z][_0-9A-Za-z]*`; reject anything else before
/// splicing configured names into a document.
pub fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        },
        _ => false,
    };

    if !valid {
        bail!("Invalid GraphQL name: {:?}", name);
    }
    Ok(())
}

/// Aliased batch of block lookups; alias `b{i}` answers `timestamps[i]`.
pub fn blocks_query(timestamps: &[i64]) -> String {
    let mut query = String::from("query blocks {");
    for (i, ts) in timestamps.iter().enumerate() {
        query.push_str(&format!(
            r#"
  b{i}: blocks(first: 1, orderBy: timestamp, orderDirection: asc, where: {{ timestamp_gt: {gt}, timestamp_lt: {lt} }}) {{
    number
  }}"#,
            i = i,
            gt = ts,
            lt = ts + BLOCK_SEARCH_WINDOW_SECS,
        ));
    }
    query.push_str("\n}");
    query
}

/// Protocol totals, aliased to `factories`.
pub fn protocol_totals_query(factory_entity: &str, block: Option<u64>) -> String {
    format!(
        r#"query protocolTotals {{
  factories: {entity}(first: 1{block}) {{
    id
    totalVolumeUSD
    totalVolumeETH
    untrackedVolumeUSD
    totalLiquidityUSD
    totalLiquidityETH
    txCount
    pairCount
  }}
}}"#,
        entity = factory_entity,
        block = block_arg(block),
    )
}

/// Daily snapshots after `$startTime`, aliased to `dayDatas`.
pub fn day_datas_query(day_data_entity: &str) -> String {
    format!(
        r#"query dayDatas($startTime: Int!, $skip: Int!) {{
  dayDatas: {entity}(first: {page}, skip: $skip, where: {{ date_gt: $startTime }}, orderBy: date, orderDirection: asc) {{
    id
    date
    dailyVolumeUSD
    dailyVolumeETH
    totalLiquidityUSD
    totalLiquidityETH
    txCount
    mostLiquidTokens {{
      id
      totalLiquidityETH
      token {{ id symbol name }}
    }}
  }}
}}"#,
        entity = day_data_entity,
        page = DAY_DATA_PAGE_SIZE,
    )
}

/// A single price field of the global price bundle.
pub fn bundle_price_query(field: &str, block: Option<u64>) -> String {
    format!(
        r#"query bundlePrice {{
  bundles(where: {{ id: "1" }}{block}) {{
    id
    {field}
  }}
}}"#,
        field = field,
        block = block_arg(block),
    )
}

pub fn all_pairs_query() -> String {
    format!(
        r#"query allPairs($skip: Int!) {{
  pairs(first: {page}, skip: $skip, orderBy: trackedReserveETH, orderDirection: desc) {{{fields}
  }}
}}"#,
        page = DIRECTORY_PAGE_SIZE,
        fields = PAIR_FIELDS,
    )
}

pub fn all_tokens_query() -> String {
    format!(
        r#"query allTokens($skip: Int!) {{
  tokens(first: {page}, skip: $skip, orderBy: tradeVolumeUSD, orderDirection: desc) {{
    id
    symbol
    name
    derivedETH
    tradeVolumeUSD
    totalLiquidity
  }}
}}"#,
        page = DIRECTORY_PAGE_SIZE,
    )
}

pub fn liquidity_positions_query() -> String {
    format!(
        r#"query topLps($pair: String!) {{
  liquidityPositions(where: {{ pair: $pair }}, orderBy: liquidityTokenBalance, orderDirection: desc, first: {first}) {{
    user {{ id }}
    pair {{ id }}
    liquidityTokenBalance
  }}
}}"#,
        first = POSITIONS_PER_PAIR,
    )
}

pub fn transactions_query() -> String {
    format!(
        r#"query transactions {{
  transactions(first: {first}, orderBy: timestamp, orderDirection: desc) {{
    id
    mints(orderBy: timestamp, orderDirection: desc) {{
      transaction {{ id timestamp }}
      {pair}
      to
      liquidity
      amount0
      amount1
      amountUSD
    }}
    burns(orderBy: timestamp, orderDirection: desc) {{
      transaction {{ id timestamp }}
      {pair}
      sender
      liquidity
      amount0
      amount1
      amountUSD
    }}
    swaps(orderBy: timestamp, orderDirection: desc) {{
      transaction {{ id timestamp }}
      {pair}
      amount0In
      amount0Out
      amount1In
      amount1Out
      amountUSD
      to
    }}
  }}
}}"#,
        first = TRANSACTIONS_TO_FETCH,
        pair = EVENT_PAIR_FIELDS,
    )
}
