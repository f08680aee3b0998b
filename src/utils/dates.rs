//! Day/week arithmetic on unix timestamps.

use std::str::FromStr;

use serde::Deserialize;
use time::{util::days_in_year_month, Date, Month, OffsetDateTime, Time};

use super::ONE_DAY_SECS;

/// Current unix timestamp (UTC, seconds).
pub fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Coarse day identifier: `floor(ts / 86400)`.
#[inline]
pub fn day_index(ts: i64) -> i64 {
    ts.div_euclid(ONE_DAY_SECS)
}

/// Truncate a timestamp to the start of its minute.
#[inline]
pub fn minute_floor(ts: i64) -> i64 {
    ts - ts.rem_euclid(60)
}

/// ISO-8601 `(year, week)` of a timestamp, or `None` if it is out of range.
///
/// The ISO year is returned alongside the week so buckets never merge across
/// years that happen to share a week number.
pub fn iso_week(ts: i64) -> Option<(i32, u8)> {
    let dt = OffsetDateTime::from_unix_timestamp(ts).ok()?;
    let (year, week, _) = dt.date().to_iso_week_date();
    Some((year, week))
}

/// Chart window selected by the caller. Deserializes from the same names
/// `FromStr` accepts (`week`, `month`, `all`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Timeframe {
    Week,
    Month,
    #[default]
    AllTime,
}

impl Timeframe {
    /// Oldest timestamp a chart for this window needs, relative to `now`.
    ///
    /// The boundary is one second before the end of the day that lies one
    /// window back (one year back for `AllTime`).
    pub fn start_time(&self, now: i64) -> i64 {
        let Ok(now_dt) = OffsetDateTime::from_unix_timestamp(now) else {
            return now - 365 * ONE_DAY_SECS;
        };
        let today = now_dt.date();

        let start_date = match self {
            Timeframe::Week => today - time::Duration::weeks(1),
            Timeframe::Month => shift_months(today, -1),
            Timeframe::AllTime => shift_months(today, -12),
        };

        end_of_day(start_date) - 1
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "week" | "1w" => Ok(Timeframe::Week),
            "month" | "1m" => Ok(Timeframe::Month),
            "all" | "all_time" | "alltime" => Ok(Timeframe::AllTime),
            other => Err(anyhow::anyhow!("Unknown timeframe: {}", other)),
        }
    }
}

impl TryFrom<String> for Timeframe {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

fn end_of_day(date: Date) -> i64 {
    date.with_time(Time::MIDNIGHT).assume_utc().unix_timestamp() + ONE_DAY_SECS - 1
}

/// Move a date by whole months, clamping the day to the target month's length.
fn shift_months(date: Date, months: i32) -> Date {
    let total = date.year() * 12 + (date.month() as i32 - 1) + months;
    let year = total.div_euclid(12);
    let month_index = total.rem_euclid(12) as u8 + 1;

    let Ok(month) = Month::try_from(month_index) else {
        return date;
    };
    let day = date.day().min(days_in_year_month(year, month));

    Date::from_calendar_date(year, month, day).unwrap_or(date)
}
