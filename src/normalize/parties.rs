//! Party-list flattening.
//!
//! The extractor reports parties in whatever shape it likes: a bare string, a
//! `{ name }` object, an array of either, arrays of arrays, or objects whose
//! `name` is itself an array. [`normalize_party_list`] reduces all of them to a
//! flat list of names.

use serde_json::Value;

/// Placeholder for an entry that cannot be read as a name.
pub const UNKNOWN_PARTY: &str = "unknown";

/// Nesting deeper than this is treated as unreadable.
pub const MAX_PARTY_DEPTH: usize = 8;

/// Flatten an arbitrary party value into a list of names.
///
/// - `null` (the field is absent) yields an empty list
/// - a string yields itself, unchanged; a blank top-level string yields nothing
///   and a blank nested one becomes [`UNKNOWN_PARTY`]
/// - an object yields its `name`, flattened again if `name` is an array or object
/// - an array yields the concatenation of its flattened entries
///
/// Anything else, including entries nested deeper than [`MAX_PARTY_DEPTH`],
/// becomes [`UNKNOWN_PARTY`]. Already-flat string lists come back unchanged.
pub fn normalize_party_list(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) if s.trim().is_empty() => Vec::new(),
        other => {
            let mut names = Vec::new();
            flatten_into(other, 0, &mut names);
            names
        }
    }
}

fn flatten_into(value: &Value, depth: usize, out: &mut Vec<String>) {
    if depth > MAX_PARTY_DEPTH {
        tracing::debug!("Party entry nested deeper than {}, using placeholder", MAX_PARTY_DEPTH);
        out.push(UNKNOWN_PARTY.to_string());
        return;
    }

    match value {
        Value::String(name) if name.trim().is_empty() => {
            tracing::debug!("Blank party name, using placeholder");
            out.push(UNKNOWN_PARTY.to_string());
        }
        Value::String(name) => out.push(name.clone()),
        Value::Array(items) => {
            for item in items {
                flatten_into(item, depth + 1, out);
            }
        }
        Value::Object(map) => match map.get("name") {
            Some(name @ Value::String(_)) => flatten_into(name, depth, out),
            Some(nested @ (Value::Array(_) | Value::Object(_))) => {
                flatten_into(nested, depth + 1, out)
            }
            _ => {
                tracing::debug!("Party object without a usable name, using placeholder");
                out.push(UNKNOWN_PARTY.to_string());
            }
        },
        Value::Null | Value::Bool(_) | Value::Number(_) => {
            tracing::debug!("Unreadable party entry {}, using placeholder", value);
            out.push(UNKNOWN_PARTY.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_lists_are_unchanged() {
        let parties = json!(["Alice", "Bob"]);
        assert_eq!(normalize_party_list(&parties), vec!["Alice", "Bob"]);
    }

    #[test]
    fn bare_string_becomes_single_entry() {
        assert_eq!(normalize_party_list(&json!("Alice")), vec!["Alice"]);
        assert!(normalize_party_list(&json!("   ")).is_empty());
        assert!(normalize_party_list(&json!(null)).is_empty());
    }

    #[test]
    fn name_objects_and_nested_arrays_flatten() {
        let parties = json!([
            {"name": "Alice"},
            [["Bob"], {"name": ["Carol", {"name": "Dan"}]}],
        ]);
        assert_eq!(
            normalize_party_list(&parties),
            vec!["Alice", "Bob", "Carol", "Dan"]
        );
    }

    #[test]
    fn unreadable_entries_become_placeholders() {
        let parties = json!([{"role": "lender"}, 42, null, "Eve"]);
        assert_eq!(
            normalize_party_list(&parties),
            vec![UNKNOWN_PARTY, UNKNOWN_PARTY, UNKNOWN_PARTY, "Eve"]
        );
    }

    #[test]
    fn blank_nested_names_become_placeholders() {
        let parties = json!([{"name": ""}, "  ", "Alice"]);
        assert_eq!(
            normalize_party_list(&parties),
            vec![UNKNOWN_PARTY, UNKNOWN_PARTY, "Alice"]
        );
    }

    #[test]
    fn excessive_nesting_is_bounded() {
        let mut value = json!("deep");
        for _ in 0..(MAX_PARTY_DEPTH + 3) {
            value = json!([value]);
        }
        assert_eq!(normalize_party_list(&value), vec![UNKNOWN_PARTY]);
    }
}
