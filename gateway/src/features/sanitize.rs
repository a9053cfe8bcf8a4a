//! Recursive scrub of loosely-typed input: NaN, null and blank values become 0.

use serde_json::{Number, Value};

/// Strings (case-insensitive) treated as missing values.
const MISSING_MARKERS: [&str; 2] = ["nan", "null"];

/// Return a copy of `value` with every leaf normalized.
///
/// Non-finite numbers, `null`, blank strings and the markers `"nan"` / `"null"`
/// become `0`. Numeric-looking strings become numbers. Anything else is kept.
pub fn sanitize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), sanitize(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        Value::Null => Value::from(0),
        Value::String(s) => sanitize_str(s),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !f.is_finite() => Value::from(0),
            _ => value.clone(),
        },
        Value::Bool(_) => value.clone(),
    }
}

fn sanitize_str(s: &str) -> Value {
    let trimmed = s.trim();
    if trimmed.is_empty()
        || MISSING_MARKERS
            .iter()
            .any(|m| trimmed.eq_ignore_ascii_case(m))
    {
        return Value::from(0);
    }
    parse_number(trimmed).unwrap_or_else(|| Value::String(s.to_string()))
}

/// Parse a numeric-looking string, keeping integers integral.
fn parse_number(s: &str) -> Option<Value> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }
    // f64 parsing accepts words like "inf"; only digit-bearing input counts as numeric.
    if !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    let f = s.parse::<f64>().ok()?;
    Some(finite_number(f))
}

/// JSON number for `f`, or 0 when `f` is NaN or infinite.
pub fn finite_number(f: f64) -> Value {
    Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or_else(|| Value::from(0))
}

/// Numeric reading of a sanitized leaf; non-numeric values read as 0.
pub fn as_number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).unwrap_or(0.0),
        _ => 0.0,
    }
}
