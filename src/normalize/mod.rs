//! Field normalizers.
//!
//! Every value that originates from the AI services passes through one of
//! these functions before it is stored in a snapshot. Each normalizer is pure
//! and total: it never fails and never panics, and for input it cannot make
//! sense of it returns a documented default (logged at `debug`).
//!
//! Code downstream of this module only sees canonical values and never looks
//! at raw upstream shapes again.

mod content;
mod labels;
mod parties;

pub use content::*;
pub use labels::*;
pub use parties::*;

use serde_json::Value;

/// Keys consulted, in order, when a text field arrives as an object.
const TEXT_KEYS: &[&str] = &["text", "content", "summary", "description", "value"];

/// Bring a confidence score into `[0, 1]`.
///
/// Values in `(1, 100]` are read as percentages. Anything else is clamped.
/// Non-finite input yields `0.0`.
pub fn normalize_confidence(x: f64) -> f64 {
    if !x.is_finite() {
        tracing::debug!("Non-finite confidence {}, using 0.0", x);
        return 0.0;
    }
    let scaled = if x > 1.0 && x <= 100.0 { x / 100.0 } else { x };
    scaled.clamp(0.0, 1.0)
}

/// [`normalize_confidence`] for an untyped value. Numeric strings such as
/// `"85"` or `"85%"` are accepted; anything else yields `0.0`.
pub fn normalize_confidence_value(value: &Value) -> f64 {
    match as_number(value) {
        Some(x) => normalize_confidence(x),
        None => {
            if !value.is_null() {
                tracing::debug!("Unreadable confidence {}, using 0.0", value);
            }
            0.0
        }
    }
}

/// Processing time in whole milliseconds. Negative or unreadable input yields `0`.
pub fn normalize_processing_time(value: &Value) -> u64 {
    match as_number(value) {
        Some(ms) if ms.is_finite() && ms >= 0.0 => ms.round() as u64,
        _ => {
            if !value.is_null() {
                tracing::debug!("Unreadable processing time {}, using 0", value);
            }
            0
        }
    }
}

/// Reduce an arbitrary value to trimmed text.
///
/// Strings are trimmed, numbers and booleans are printed, objects are searched
/// for a text-like key, arrays are joined line by line. Defaults to `""`.
pub fn normalize_text(value: &Value) -> String {
    text_at_depth(value, 0)
}

fn text_at_depth(value: &Value, depth: usize) -> String {
    if depth > 4 {
        return String::new();
    }
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Object(map) => TEXT_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .map(|v| text_at_depth(v, depth + 1))
            .find(|s| !s.is_empty())
            .unwrap_or_default(),
        Value::Array(items) => items
            .iter()
            .map(|v| text_at_depth(v, depth + 1))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null => String::new(),
    }
}

/// A list of non-empty strings. A bare string becomes a one-element list.
pub fn normalize_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(normalize_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::Null => Vec::new(),
        other => {
            let text = normalize_text(other);
            if text.is_empty() {
                Vec::new()
            } else {
                vec![text]
            }
        }
    }
}

/// Optional text: `None` when the value reduces to an empty string.
pub fn normalize_optional_text(value: Option<&Value>) -> Option<String> {
    value.map(normalize_text).filter(|s| !s.is_empty())
}

/// Read a number from a JSON number or a numeric string (a trailing `%` is
/// ignored).
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }
}
