//! Percent-change arithmetic for day-over-day and week-over-week metrics.
//!
//! Indexer snapshots are regularly missing for a lag window (new pairs,
//! indexer catching up), so neither function panics or returns NaN/∞.

/// Percentage change from `previous` to `current`.
///
/// Returns `None` when the change is undefined: `previous` is zero or NaN,
/// or the result is otherwise not finite.
///
/// # Example
/// ```
/// use dexscope::utils::percent_change;
///
/// assert_eq!(percent_change(110.0, 100.0), Some(10.0));
/// assert_eq!(percent_change(5.0, 0.0), None);
/// ```
pub fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 || previous.is_nan() {
        return None;
    }

    let change = (current - previous) / previous * 100.0;
    change.is_finite().then_some(change)
}

/// Change over the latest window and its percent change versus the window before.
///
/// Inputs are cumulative totals sampled now, one window ago and two windows ago
/// (`total_volume_usd`, `tx_count`, ...). Returns
/// `(current - one_ago, percent change of that delta against one_ago - two_ago)`.
///
/// Missing samples count as zero, so with `one_ago` absent the first element
/// degrades to the cumulative `current` itself. When the previous window delta
/// is zero the percent change is reported as `0.0`.
pub fn two_point_percent_change(
    current: f64,
    one_ago: Option<f64>,
    two_ago: Option<f64>,
) -> (f64, f64) {
    let current = finite_or_zero(current);
    let one_ago = one_ago.map(finite_or_zero).unwrap_or(0.0);
    let two_ago = two_ago.map(finite_or_zero).unwrap_or(0.0);

    let current_change = current - one_ago;
    let previous_change = one_ago - two_ago;

    let adjusted = percent_change(current_change, previous_change).unwrap_or(0.0);

    (current_change, adjusted)
}

#[inline]
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
