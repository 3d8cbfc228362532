//! Deep merge of configuration documents.
//!
//! `deep_merge(base, overlay)` is right-biased:
//! - scalars in `overlay` replace `base`
//! - arrays concatenate, `base` first, unless `overlay` starts with
//!   [`REPLACE_SENTINEL`], in which case `overlay` (minus the sentinel) wins
//! - objects merge key by key with the same rules
//! - a `null` or empty string in `overlay` means "no override" and keeps `base`

use serde_json::{Map, Value};

/// First element of an override list that replaces instead of appending.
pub const REPLACE_SENTINEL: &str = "!replace";

/// Merge `overlay` on top of `base`.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (base, overlay) if is_unset(&overlay) => base,
        (Value::Object(base), Value::Object(overlay)) => Value::Object(merge_objects(base, overlay)),
        (Value::Array(base), Value::Array(overlay)) => Value::Array(merge_arrays(base, overlay)),
        (_, overlay) => strip_sentinel(overlay),
    }
}

fn merge_objects(mut base: Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in overlay {
        if is_unset(&value) {
            continue;
        }
        let merged = match base.remove(&key) {
            Some(existing) => deep_merge(existing, value),
            None => strip_sentinel(value),
        };
        base.insert(key, merged);
    }
    base
}

fn merge_arrays(mut base: Vec<Value>, overlay: Vec<Value>) -> Vec<Value> {
    if starts_with_sentinel(&overlay) {
        return overlay.into_iter().skip(1).collect();
    }
    base.extend(overlay);
    base
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn starts_with_sentinel(list: &[Value]) -> bool {
    matches!(list.first(), Some(Value::String(s)) if s == REPLACE_SENTINEL)
}

/// A sentinel-led list with nothing to replace still must not leak the sentinel.
fn strip_sentinel(value: Value) -> Value {
    match value {
        Value::Array(list) if starts_with_sentinel(&list) => {
            Value::Array(list.into_iter().skip(1).collect())
        }
        other => other,
    }
}
