//! Portable-output normalization.
//!
//! Upstream components hand back arbitrarily nested JSON values; callers
//! get numbers rounded to two decimal places with every map and sequence
//! recursed. Reapplying the pass is a no-op.

use serde_json::Value;

pub fn normalize(value: Value) -> Value {
    match value {
        Value::Number(number) => {
            if let Some(float) = number.as_f64() {
                if number.is_f64() {
                    return round2(float);
                }
            }
            Value::Number(number)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, normalize(value)))
                .collect(),
        ),
        other => other,
    }
}

fn round2(value: f64) -> Value {
    // Half-away-from-zero: 0.125 becomes 0.13, where half-to-even
    // (numpy/pandas style) would give 0.12.
    let rounded = (value * 100.0).round() / 100.0;
    serde_json::Number::from_f64(rounded)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
