//! Defensive numeric conversion for indexer payloads.
//!
//! GraphQL indexers serialize `BigDecimal`/`BigInt` fields as strings, some
//! deployments return plain JSON numbers, and fields are frequently `null`.
//! None of these helpers fail: anything unparseable becomes `None`.

use bigdecimal::BigDecimal;
use num_traits::ToPrimitive;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

// ============================================
// String / JSON to f64
// ============================================

/// Parse a decimal string to f64.
///
/// The string must be a valid BigDecimal (rejects `inf`, `NaN` and friends);
/// the float itself comes from the std parser, which rounds correctly.
/// Returns `None` for empty, malformed or non-finite values.
pub fn str_to_f64(value_str: &str) -> Option<f64> {
    let trimmed = value_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    let big_value = BigDecimal::from_str(trimmed).ok()?;
    let result = trimmed.parse::<f64>().ok().or_else(|| big_value.to_f64())?;

    if result.is_finite() {
        Some(result)
    } else {
        None
    }
}

/// Convert a JSON value (number or decimal string) to f64.
pub fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => str_to_f64(s),
        _ => None,
    }
}

/// Convert a JSON value (number or integer string) to u64.
///
/// Decimal strings are truncated; negative values are rejected.
fn value_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|v| *v >= 0.0).and_then(|v| v.to_u64())),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<u64>().ok().or_else(|| {
                BigDecimal::from_str(trimmed)
                    .ok()
                    .and_then(|d| d.with_scale(0).to_u64())
            })
        },
        _ => None,
    }
}

/// Convert a JSON value (number or integer string) to i64.
///
/// Decimal strings are truncated.
fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|v| v.is_finite()).and_then(|v| v.to_i64())),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<i64>().ok().or_else(|| {
                BigDecimal::from_str(trimmed)
                    .ok()
                    .and_then(|d| d.with_scale(0).to_i64())
            })
        },
        _ => None,
    }
}

// ============================================
// Serde helpers
// ============================================

/// `deserialize_with` helper for optional decimal fields.
///
/// Use together with `#[serde(default)]` so absent fields also map to `None`.
pub fn de_f64_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_f64))
}

/// `deserialize_with` helper for optional integer fields (counts, block numbers).
pub fn de_u64_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_u64))
}

/// `deserialize_with` helper for optional signed integer fields (timestamps).
pub fn de_i64_opt<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_i64))
}
