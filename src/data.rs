//! Template data model merging.
//!
//! Each pipeline component contributes a nested data mapping. The data handed
//! to the template engine is the deep merge of every enabled component's
//! mapping, in component order.

use serde_json::{Map, Value};

/// Recursively merges `source` into `target`.
///
/// Objects merge key by key; any other value in `source` replaces the
/// corresponding value in `target`, arrays included.
pub fn merge_data(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_data(existing, value);
                    }
                    _ => {
                        target_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

/// Deep-merges every value of `sources` in order into an empty object.
pub fn merge_all<'a>(sources: impl IntoIterator<Item = &'a Value>) -> Value {
    let mut merged = Value::Object(Map::new());
    for source in sources {
        merge_data(&mut merged, source);
    }
    merged
}
