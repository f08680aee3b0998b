//! Utility functions for dexscope.
//!
//! This module is organized into focused submodules:
//!
//! - [`conversion`] - Defensive parsing of indexer numerics (strings, numbers, nulls)
//! - [`percent`] - Percent-change arithmetic used by every derived metric
//! - [`dates`] - Day/week arithmetic and chart timeframes

mod conversion;
mod percent;
mod dates;

// ============================================
// Common Constants
// ============================================

/// Seconds in one day. Daily snapshots are aligned to this stride.
pub const ONE_DAY_SECS: i64 = 86_400;

// ============================================
// Re-exports
// ============================================

// Conversion utilities
pub use conversion::{de_f64_opt, de_i64_opt, de_u64_opt, str_to_f64, value_to_f64};

// Percent change utilities
pub use percent::{percent_change, two_point_percent_change};

// Time utilities
pub use dates::{day_index, iso_week, minute_floor, now_unix, Timeframe};
