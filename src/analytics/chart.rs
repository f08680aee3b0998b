//! Protocol chart series.
//!
//! The indexer only writes a day snapshot when something happened that day,
//! so the raw series is sparse. This module turns it into a dense daily series
//! plus a weekly volume rollup:
//!
//! 1. Page through day snapshots (1000 per page) until a short page
//! 2. Deduplicate by day index
//! 3. Walk day by day up to `now - 1 day`, synthesizing quiet days
//! 4. Sort ascending by date
//! 5. Bucket daily volume by ISO week
//!
//! Liquidity is a stock and carries forward across quiet days; volume is a
//! flow and is zero on them.

use std::collections::BTreeMap;
use std::time::Duration;

use log::{error, info};
use serde::Serialize;
use serde_json::Value;

use super::{pagination::paginate, with_timeout};
use crate::{
    indexer::{queries::DAY_DATA_PAGE_SIZE, DayData, Indexer},
    utils::{day_index, iso_week, ONE_DAY_SECS},
};

/// One day of the dense chart series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySnapshot {
    pub date: i64,
    pub daily_volume_usd: f64,
    pub daily_volume_eth: f64,
    pub total_liquidity_usd: f64,
    pub total_liquidity_eth: f64,
    pub tx_count: u64,
    pub most_liquid_tokens: Value,
    /// True for days the indexer had no snapshot for.
    pub synthesized: bool,
}

impl DailySnapshot {
    /// Snapshot for an indexer record; `None` when the record has no date.
    fn observed(day: DayData) -> Option<Self> {
        Some(Self {
            date: day.date?,
            daily_volume_usd: day.daily_volume_usd.unwrap_or(0.0),
            daily_volume_eth: day.daily_volume_eth.unwrap_or(0.0),
            total_liquidity_usd: day.total_liquidity_usd.unwrap_or(0.0),
            total_liquidity_eth: day.total_liquidity_eth.unwrap_or(0.0),
            tx_count: day.tx_count.unwrap_or(0),
            most_liquid_tokens: day.most_liquid_tokens,
            synthesized: false,
        })
    }
}

/// Daily volume summed over one ISO week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyBucket {
    /// Date of the first day contributing to the bucket.
    pub date: i64,
    pub weekly_volume_usd: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub daily: Vec<DailySnapshot>,
    pub weekly: Vec<WeeklyBucket>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.daily.is_empty()
    }
}

/// Last known stock values, copied into synthesized days.
struct Carry {
    total_liquidity_usd: f64,
    total_liquidity_eth: f64,
    most_liquid_tokens: Value,
}

impl Carry {
    fn synthesize(&self, date: i64) -> DailySnapshot {
        DailySnapshot {
            date,
            daily_volume_usd: 0.0,
            daily_volume_eth: 0.0,
            total_liquidity_usd: self.total_liquidity_usd,
            total_liquidity_eth: self.total_liquidity_eth,
            tx_count: 0,
            most_liquid_tokens: self.most_liquid_tokens.clone(),
            synthesized: true,
        }
    }

    fn update(&mut self, day: &DailySnapshot) {
        self.total_liquidity_usd = day.total_liquidity_usd;
        self.total_liquidity_eth = day.total_liquidity_eth;
        self.most_liquid_tokens = day.most_liquid_tokens.clone();
    }
}

/// Dense, ascending daily series from sparse, unordered day snapshots.
///
/// The walk starts at the earliest record (or `oldest_date_to_fetch` when
/// there are none) and emits one entry per day until reaching `now - 1 day`.
/// Duplicate snapshots for the same day keep the first one seen. Records
/// dated after the walk (today's partial day) are kept as-is; undated
/// records are dropped.
pub fn fill_daily_series(
    records: Vec<DayData>,
    oldest_date_to_fetch: Option<i64>,
    now: i64,
) -> Vec<DailySnapshot> {
    let mut by_day: BTreeMap<i64, DailySnapshot> = BTreeMap::new();
    for observed in records.into_iter().filter_map(DailySnapshot::observed) {
        by_day.entry(day_index(observed.date)).or_insert(observed);
    }

    let start = match by_day.values().next() {
        Some(first) => first.date,
        None => match oldest_date_to_fetch {
            Some(oldest) => oldest,
            None => return Vec::new(),
        },
    };
    let end = now - ONE_DAY_SECS;

    let mut carry = Carry {
        total_liquidity_usd: 0.0,
        total_liquidity_eth: 0.0,
        most_liquid_tokens: Value::Null,
    };
    let mut daily = Vec::with_capacity(by_day.len());

    let mut timestamp = start;
    loop {
        match by_day.remove(&day_index(timestamp)) {
            Some(observed) => {
                carry.update(&observed);
                daily.push(observed);
            },
            None => daily.push(carry.synthesize(timestamp)),
        }

        if timestamp >= end {
            break;
        }
        timestamp += ONE_DAY_SECS;
    }

    daily.extend(by_day.into_values());
    daily.sort_by_key(|day| day.date);
    daily
}

/// Weekly volume rollup of an ascending daily series.
///
/// A new bucket starts whenever the ISO `(year, week)` differs from the
/// previous entry's.
pub fn weekly_buckets(daily: &[DailySnapshot]) -> Vec<WeeklyBucket> {
    let mut weekly: Vec<WeeklyBucket> = Vec::new();
    let mut current_week = None;

    for day in daily {
        let week = iso_week(day.date);
        if weekly.is_empty() || week != current_week {
            current_week = week;
            weekly.push(WeeklyBucket {
                date: day.date,
                weekly_volume_usd: 0.0,
            });
        }

        if let Some(bucket) = weekly.last_mut() {
            bucket.weekly_volume_usd += day.daily_volume_usd;
        }
    }

    weekly
}

/// Gap-fill and roll up raw records.
pub fn build_chart(records: Vec<DayData>, oldest_date_to_fetch: Option<i64>, now: i64) -> ChartData {
    let daily = fill_daily_series(records, oldest_date_to_fetch, now);
    let weekly = weekly_buckets(&daily);
    ChartData { daily, weekly }
}

/// Fetch every day snapshot after `oldest_date_to_fetch` and build the chart.
///
/// A failed page discards the whole fetch: a partial history would be
/// gap-filled into a misleading series. Returns an empty chart in that case.
pub async fn fetch_chart_data(
    indexer: &dyn Indexer,
    timeout: Duration,
    oldest_date_to_fetch: i64,
    now: i64,
) -> ChartData {
    let start = std::time::Instant::now();

    let records = paginate(DAY_DATA_PAGE_SIZE, None, move |skip| {
        with_timeout(
            timeout,
            "day data page",
            indexer.day_datas(oldest_date_to_fetch, skip),
        )
    })
    .await;

    let records = match records {
        Ok(records) => records,
        Err(e) => {
            error!("Failed to fetch chart data: {:#}", e);
            return ChartData::default();
        },
    };

    let fetched = records.len();
    let chart = build_chart(records, Some(oldest_date_to_fetch), now);

    info!(
        "Built chart from {} day snapshots: {} days, {} weeks in {:?}",
        fetched,
        chart.daily.len(),
        chart.weekly.len(),
        start.elapsed()
    );

    chart
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::mock::{day, MockIndexer};
    use std::sync::atomic::Ordering;
    use time::macros::datetime;

    const DAY: i64 = ONE_DAY_SECS;

    fn ts(dt: time::OffsetDateTime) -> i64 {
        dt.unix_timestamp()
    }

    #[test]
    fn test_liquidity_carries_forward() {
        let d = ts(datetime!(2021-06-01 00:00 UTC));
        let now = d + 4 * DAY;

        let daily = fill_daily_series(vec![day(d, 25.0, 100.0)], None, now);

        assert_eq!(daily.len(), 4);
        assert!(!daily[0].synthesized);
        assert_eq!(daily[0].daily_volume_usd, 25.0);
        for filled in &daily[1..] {
            assert!(filled.synthesized);
            assert_eq!(filled.total_liquidity_usd, 100.0);
            assert_eq!(filled.daily_volume_usd, 0.0);
        }
    }

    #[test]
    fn test_dense_series_from_sparse_unordered_input() {
        let d = ts(datetime!(2021-06-01 00:00 UTC));
        let records = vec![
            day(d + 5 * DAY, 7.0, 70.0),
            day(d, 1.0, 10.0),
            day(d + 2 * DAY, 3.0, 30.0),
        ];
        let now = d + 6 * DAY;

        let daily = fill_daily_series(records, None, now);
        let first = daily.first().unwrap().date;
        let last = daily.last().unwrap().date;

        assert_eq!(daily.len() as i64, (last - first) / DAY + 1);
        for pair in daily.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, DAY);
        }

        // quiet days between observations carry the previous liquidity
        assert_eq!(daily[1].total_liquidity_usd, 10.0);
        assert_eq!(daily[3].total_liquidity_usd, 30.0);
        assert_eq!(daily[4].total_liquidity_usd, 30.0);
        assert_eq!(daily[5].total_liquidity_usd, 70.0);
    }

    #[test]
    fn test_duplicate_days_keep_first() {
        let d = ts(datetime!(2021-06-01 00:00 UTC));
        let records = vec![day(d, 1.0, 10.0), day(d + 3600, 99.0, 990.0)];

        let daily = fill_daily_series(records, None, d + DAY);

        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].daily_volume_usd, 1.0);
    }

    #[test]
    fn test_empty_input_without_bound() {
        let chart = build_chart(Vec::new(), None, 1_700_000_000);
        assert!(chart.daily.is_empty());
        assert!(chart.weekly.is_empty());
    }

    #[test]
    fn test_empty_input_walks_from_bound() {
        let d = ts(datetime!(2021-06-01 00:00 UTC));

        let daily = fill_daily_series(Vec::new(), Some(d), d + 3 * DAY);

        assert_eq!(daily.len(), 3);
        assert!(daily.iter().all(|day| day.synthesized && day.total_liquidity_usd == 0.0));
    }

    #[test]
    fn test_walk_stops_at_yesterday() {
        let d = ts(datetime!(2021-06-01 00:00 UTC));
        let now = d + 2 * DAY + 3600;
        let records = vec![day(d, 1.0, 10.0), day(d + 2 * DAY, 2.0, 20.0)];

        let daily = fill_daily_series(records, None, now);

        assert_eq!(daily.len(), 3);
        assert_eq!(daily[2].date, d + 2 * DAY);
        assert!(!daily[2].synthesized);
    }

    #[test]
    fn test_weekly_buckets_split_on_week_boundary() {
        // Monday 2021-01-04 .. Wednesday 2021-01-13
        let monday = ts(datetime!(2021-01-04 00:00 UTC));
        let records: Vec<DayData> = (0..10)
            .map(|i| day(monday + i * DAY, (i + 1) as f64, 0.0))
            .collect();
        let now = monday + 10 * DAY;

        let chart = build_chart(records, None, now);
        assert_eq!(chart.daily.len(), 10);
        assert_eq!(chart.weekly.len(), 2);

        let total: f64 = chart.daily.iter().map(|d| d.daily_volume_usd).sum();
        let bucketed: f64 = chart.weekly.iter().map(|w| w.weekly_volume_usd).sum();
        assert_eq!(total, bucketed);

        assert_eq!(chart.weekly[0].date, monday);
        assert_eq!(chart.weekly[0].weekly_volume_usd, 28.0); // 1..=7
        assert_eq!(chart.weekly[1].date, monday + 7 * DAY);
    }

    #[tokio::test]
    async fn test_fetch_chart_pages_until_short_page() {
        let d = ts(datetime!(2021-06-01 00:00 UTC));
        let full: Vec<DayData> = (0..1000).map(|i| day(d + i * DAY, 1.0, 5.0)).collect();
        let short: Vec<DayData> = (1000..1010).map(|i| day(d + i * DAY, 1.0, 5.0)).collect();

        let mut mock = MockIndexer::new();
        mock.day_pages = vec![full, short];

        let now = d + 1010 * DAY;
        let chart = fetch_chart_data(&mock, Duration::from_secs(5), d - 1, now).await;

        assert_eq!(mock.day_calls.load(Ordering::SeqCst), 2);
        assert_eq!(chart.daily.len(), 1010);
        assert!(chart.daily.iter().all(|day| !day.synthesized));
    }

    #[tokio::test]
    async fn test_undated_records_do_not_empty_the_chart() {
        let d = ts(datetime!(2021-06-23 00:00 UTC));
        let page: Vec<DayData> = serde_json::from_value(serde_json::json!([
            {"id": "a", "date": d, "dailyVolumeUSD": "10", "totalLiquidityUSD": "100"},
            {"id": "b", "date": (d + DAY).to_string(), "dailyVolumeUSD": "20", "totalLiquidityUSD": "200"},
            {"id": "c", "date": null, "dailyVolumeUSD": "30"}
        ]))
        .unwrap();

        let mut mock = MockIndexer::new();
        mock.day_pages = vec![page];

        let chart = fetch_chart_data(&mock, Duration::from_secs(5), d - 1, d + 3 * DAY).await;

        let volumes: Vec<f64> = chart.daily.iter().map(|day| day.daily_volume_usd).collect();
        assert_eq!(volumes, vec![10.0, 20.0, 0.0]);
        assert_eq!(chart.daily[2].total_liquidity_usd, 200.0);
        assert!(chart.daily[2].synthesized);
    }
}
