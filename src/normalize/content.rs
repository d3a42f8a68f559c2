//! Normalizers for structured content: timelines, chapters, turning points and
//! the dialogue level.

use serde_json::{Map, Value};

use super::{as_number, normalize_impact_level, normalize_text};
use crate::models::{Act3Snapshot, Chapter, TimelineEvent, TurningPoint};

const DATE_KEYS: &[&str] = &["date", "time", "when", "timestamp"];
const EVENT_KEYS: &[&str] = &["event", "description", "title", "content", "summary"];
const IMPACT_KEYS: &[&str] = &["impact", "significance", "importance", "weight"];

/// Remove and return the first non-empty text found under any of `keys`.
fn take_text(map: &mut Map<String, Value>, keys: &[&str]) -> String {
    for key in keys {
        if let Some(value) = map.get(*key) {
            let text = normalize_text(value);
            if !text.is_empty() {
                map.remove(*key);
                return text;
            }
        }
    }
    String::new()
}

/// Drop keys that name a typed field, so a leftover alias never shadows the
/// normalized value once `extra` is flattened back in.
fn strip_fields(map: &mut Map<String, Value>, fields: &[&str]) {
    for field in fields {
        map.remove(*field);
    }
}

/// Normalize a case timeline. Entries may be objects using any of several
/// key names, or bare strings. Entries with neither a date nor an event are
/// dropped; unrecognised keys are kept.
pub fn normalize_timeline(value: &Value) -> Vec<TimelineEvent> {
    let Value::Array(items) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(TimelineEvent {
                date: String::new(),
                event: s.trim().to_string(),
                extra: Map::new(),
            }),
            Value::Object(map) => {
                let mut extra = map.clone();
                let date = take_text(&mut extra, DATE_KEYS);
                let event = take_text(&mut extra, EVENT_KEYS);
                strip_fields(&mut extra, &["date", "event"]);
                if date.is_empty() && event.is_empty() {
                    tracing::debug!("Dropping timeline entry without date or event");
                    return None;
                }
                Some(TimelineEvent { date, event, extra })
            }
            _ => None,
        })
        .collect()
}

/// Normalize narrative chapters, keeping their content verbatim.
///
/// A chapter without a usable `order` gets `index + 1`, where `index` is its
/// position in the original sequence. Bare strings become `{ content }`
/// chapters; other entries are skipped.
pub fn normalize_chapters(items: &[Value]) -> Vec<Chapter> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let fallback_order = index as u32 + 1;
            match item {
                Value::Object(map) => {
                    let mut content = map.clone();
                    let order = content
                        .remove("order")
                        .as_ref()
                        .and_then(as_number)
                        .filter(|n| n.is_finite() && *n >= 1.0)
                        .map(|n| n as u32)
                        .unwrap_or(fallback_order);
                    Some(Chapter { order, content })
                }
                Value::String(text) => {
                    let mut content = Map::new();
                    content.insert("content".to_string(), Value::String(text.clone()));
                    Some(Chapter {
                        order: fallback_order,
                        content,
                    })
                }
                _ => {
                    tracing::debug!("Skipping chapter {} with unusable shape", fallback_order);
                    None
                }
            }
        })
        .collect()
}

/// Normalize timeline turning points. The impact is derived from whichever
/// impact-like key is present; other keys are kept.
pub fn normalize_turning_points(value: &Value) -> Vec<TurningPoint> {
    let Value::Array(items) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let Value::Object(map) = item else {
                return None;
            };
            let mut extra = map.clone();
            let date = take_text(&mut extra, DATE_KEYS);
            let description = take_text(&mut extra, EVENT_KEYS);
            let impact = IMPACT_KEYS
                .iter()
                .find_map(|key| extra.remove(*key))
                .map(|signal| normalize_impact_level(&signal))
                .unwrap_or_default();
            strip_fields(&mut extra, &["date", "description", "impact"]);
            Some(TurningPoint {
                date,
                description,
                impact,
                extra,
            })
        })
        .collect()
}

/// Dialogue difficulty in `1..=3`. Accepts numbers, numeric strings and level
/// names; defaults to `1`.
pub fn normalize_level(value: &Value) -> u8 {
    if let Some(n) = as_number(value) {
        if n.is_finite() {
            return n.round().clamp(1.0, 3.0) as u8;
        }
    }
    if let Value::String(label) = value {
        let label = label.trim().to_lowercase();
        if ["advanced", "hard", "expert", "高级"].iter().any(|l| label.contains(l)) {
            return 3;
        }
        if ["intermediate", "medium", "中级"].iter().any(|l| label.contains(l)) {
            return 2;
        }
        if ["basic", "beginner", "easy", "初级"].iter().any(|l| label.contains(l)) {
            return 1;
        }
    }
    if !value.is_null() {
        tracing::debug!("Unreadable dialogue level {}, using 1", value);
    }
    Act3Snapshot::MIN_LEVEL
}
