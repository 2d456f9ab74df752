//! Raw input records and the shared presence test.
//!
//! A [`RawRecord`] is whatever one row of input looked like: CSV headers,
//! JSON API field names, or any mix of aliases. Keys are untrusted and the
//! values may be strings, numbers, booleans or `null`.
//!
//! Every "is this field there?" decision in the crate goes through
//! [`has_value`] / [`present_str`], so blank strings, `null`, falsy scalars
//! and the `"N/A"` sentinel are treated identically everywhere.

use serde_json::Value;

/// One input row: string keys mapped to JSON scalars.
pub type RawRecord = serde_json::Map<String, Value>;

/// Sentinel some exporters write for a missing value.
pub const NOT_AVAILABLE: &str = "N/A";

/// The string form of a raw value, or `None` when the value is falsy.
///
/// `null`, `false`, `0` and `""` are falsy. Arrays join their elements with
/// `", "`; objects fall back to their JSON text.
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(n) => {
            if n.as_f64() == Some(0.0) {
                None
            } else {
                Some(n.to_string())
            }
        }
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(value_to_string)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

/// The trimmed string when the value counts as present.
pub fn present_value(value: &Value) -> Option<String> {
    value_to_string(value).and_then(|s| present_str(&s).map(str::to_string))
}

/// Presence test on a raw value.
pub fn has_value(value: &Value) -> bool {
    present_value(value).is_some()
}

/// The trimmed slice when `s` is neither blank nor the `"N/A"` sentinel.
pub fn present_str(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == NOT_AVAILABLE {
        None
    } else {
        Some(trimmed)
    }
}

/// Presence test on an already-normalised string field.
pub fn is_present(s: &str) -> bool {
    present_str(s).is_some()
}

/// Logical OR of [`is_present`] across a set of fields.
pub fn any_present(fields: &[&str]) -> bool {
    fields.iter().any(|f| is_present(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_values() {
        for v in [json!(""), json!(null), json!("N/A"), json!("   "), json!(false), json!(0)] {
            assert!(!has_value(&v), "{v} should be absent");
        }
    }

    #[test]
    fn present_values() {
        for v in [json!("Jane"), json!(42), json!(-1.5), json!(true), json!(" x ")] {
            assert!(has_value(&v), "{v} should be present");
        }
    }

    #[test]
    fn padded_sentinel_is_absent() {
        assert!(!has_value(&json!("  N/A  ")));
        assert!(has_value(&json!("N/A/B")));
    }

    #[test]
    fn present_value_is_trimmed() {
        assert_eq!(present_value(&json!("  CEO  ")).as_deref(), Some("CEO"));
        assert_eq!(present_value(&json!(5551234)).as_deref(), Some("5551234"));
    }

    #[test]
    fn arrays_join_their_elements() {
        assert_eq!(
            present_value(&json!(["Acme", "Globex"])).as_deref(),
            Some("Acme, Globex")
        );
        assert!(!has_value(&json!([])));
    }

    #[test]
    fn any_present_is_a_logical_or() {
        assert!(!any_present(&["", "N/A", "  "]));
        assert!(any_present(&["", "N/A", "Acme"]));
        assert!(!any_present(&[]));
    }
}
