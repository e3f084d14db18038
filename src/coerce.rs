//! Best-effort conversion of loosely typed JSON values
//!
//! Upstream payloads encode the same facts in several ways: MMSIs as integers,
//! strings or floats, timestamps in seconds, milliseconds, microseconds or as
//! RFC 3339 strings. Conversion failures are never errors, the field is just
//! treated as absent.

use chrono::DateTime;
use serde_json::{Map, Value};

use crate::models::Mmsi;

const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;
const MICROS_THRESHOLD: i64 = 1_000_000_000_000_000;

/// Convert a scalar into an MMSI.
///
/// Float encodings such as `230124000.0` or `"230124000.0"` are truncated to
/// their integer digits.
pub fn to_identity(value: &Value) -> Option<Mmsi> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if s.contains('.') {
                return s.parse::<f64>().ok().and_then(float_identity);
            }
            Mmsi::try_from(s).ok()
        }
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return Mmsi::try_from(u.to_string()).ok();
            }
            if n.is_i64() {
                return None;
            }
            n.as_f64().and_then(float_identity)
        }
        _ => None,
    }
}

fn float_identity(value: f64) -> Option<Mmsi> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Mmsi::try_from((value.trunc() as u64).to_string()).ok()
}

/// Convert a number or numeric string into a float
pub fn to_real(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Convert a timestamp into seconds from Unix epoch.
///
/// Returns 0 when the value cannot be interpreted as a timestamp.
pub fn to_unix_seconds(value: &Value) -> i64 {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                normalize_timestamp(i)
            } else if let Some(f) = n.as_f64() {
                normalize_timestamp(f as i64)
            } else {
                0
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return 0;
            }
            if let Ok(i) = s.parse::<i64>() {
                return normalize_timestamp(i);
            }
            if let Ok(f) = s.parse::<f64>() {
                return if f.is_finite() {
                    normalize_timestamp(f as i64)
                } else {
                    0
                };
            }
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.timestamp())
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Scale millisecond and microsecond timestamps down to seconds
pub fn normalize_timestamp(ts: i64) -> i64 {
    if ts > MICROS_THRESHOLD {
        ts / 1_000_000
    } else if ts > MILLIS_THRESHOLD {
        ts / 1_000
    } else {
        ts
    }
}

/// First non-blank string among `keys`, trimmed
pub fn string_field<'a>(item: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| item.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// First field among `keys` that converts into a float
pub fn number_field(item: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| item.get(*key))
        .find_map(to_real)
}

/// First field among `keys` that converts into an MMSI
pub fn identity_field(item: &Map<String, Value>, keys: &[&str]) -> Option<Mmsi> {
    keys.iter()
        .filter_map(|key| item.get(*key))
        .find_map(to_identity)
}

/// First positive timestamp among `keys`, 0 if none
pub fn timestamp_field(item: &Map<String, Value>, keys: &[&str]) -> i64 {
    keys.iter()
        .filter_map(|key| item.get(*key))
        .map(to_unix_seconds)
        .find(|ts| *ts > 0)
        .unwrap_or(0)
}
