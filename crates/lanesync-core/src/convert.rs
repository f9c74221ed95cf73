// ── Snapshot field conversions ──
//
// The status endpoint is loosely typed: booleans arrive as numbers,
// counters as strings, names as null. These helpers normalize raw JSON
// values into the strong types of `crate::model`, with the same
// truthiness rules the printer host applies.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Truthiness of a raw value: `null`, `false`, `0`, `""`, `"false"`,
/// `"0"`, `"off"`, `"none"` and empty containers are false; everything
/// else is true.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => {
            let s = s.trim();
            !(s.is_empty()
                || s.eq_ignore_ascii_case("false")
                || s == "0"
                || s.eq_ignore_ascii_case("off")
                || s.eq_ignore_ascii_case("none"))
        }
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Scalar to string; `null` and containers are `None`.
pub(crate) fn opt_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Like [`opt_string`], but blank text is absent too.
pub(crate) fn opt_text(value: &Value) -> Option<String> {
    opt_string(value).filter(|s| !s.trim().is_empty())
}

/// Number or numeric string to `f64`.
pub(crate) fn opt_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Number or numeric string to `i64`, truncating fractional values.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
pub(crate) fn opt_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Spool weight in whole grams: rounded to nearest, clamped at zero.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
pub fn round_weight(raw: f64) -> u32 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    let rounded = raw.round();
    if rounded >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        rounded as u32
    }
}

/// List of strings; scalars are wrapped, non-string items are dropped.
pub(crate) fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(opt_string).collect(),
        Value::Null | Value::Object(_) => Vec::new(),
        other => opt_string(other).into_iter().collect(),
    }
}

// ── serde adapters for the loosely typed system section ──────────────

pub(crate) fn de_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(truthy(&Value::deserialize(d)?))
}

pub(crate) fn de_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(opt_text(&Value::deserialize(d)?))
}

pub(crate) fn de_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(opt_f64(&Value::deserialize(d)?).unwrap_or_default())
}

pub(crate) fn de_string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(string_list(&Value::deserialize(d)?))
}
