//! Deterministic serialization of validator configuration.
//!
//! Two configurations that are structurally equal produce the same key no
//! matter how their objects were built: object keys are sorted and nested
//! values are serialized recursively. Arrays keep their order.

use serde_json::{Map, Value};

/// Serialize a configuration object into its cache key.
pub fn stable_key(options: &Map<String, Value>) -> String {
    let mut out = String::new();
    write_object(options, &mut out);
    out
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_object(map, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        // Scalars already serialize canonically.
        other => out.push_str(&other.to_string()),
    }
}

fn write_object(map: &Map<String, Value>, out: &mut String) {
    // `Map` iterates sorted unless serde_json's `preserve_order` feature is
    // enabled somewhere in the build graph; sort so keys hold either way.
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_value(value, out);
    }
    out.push('}');
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn key_order_does_not_matter() {
        let a = obj(json!({ "threshold": 3, "message": { "id": "x", "defaultMessage": "y" } }));
        let mut b = Map::new();
        b.insert(
            "message".into(),
            json!({ "defaultMessage": "y", "id": "x" }),
        );
        b.insert("threshold".into(), json!(3));
        assert_eq!(stable_key(&a), stable_key(&b));
    }

    #[test]
    fn array_order_matters() {
        let a = obj(json!({ "v": [1, 2] }));
        let b = obj(json!({ "v": [2, 1] }));
        assert_ne!(stable_key(&a), stable_key(&b));
    }

    #[test]
    fn strings_and_numbers_stay_distinct() {
        let a = obj(json!({ "v": 1 }));
        let b = obj(json!({ "v": "1" }));
        assert_ne!(stable_key(&a), stable_key(&b));
        assert_eq!(stable_key(&a), r#"{"v":1}"#);
    }

    proptest! {
        #[test]
        fn distinct_configurations_get_distinct_keys(
            a in prop::collection::btree_map("[a-z]{1,3}", any::<i8>(), 0..4),
            b in prop::collection::btree_map("[a-z]{1,3}", any::<i8>(), 0..4),
        ) {
            let to_map = |entries: &std::collections::BTreeMap<String, i8>| {
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), json!(v)))
                    .collect::<Map<String, Value>>()
            };
            prop_assert_eq!(stable_key(&to_map(&a)) == stable_key(&to_map(&b)), a == b);
        }

        #[test]
        fn key_is_valid_json(entries in prop::collection::btree_map("[a-z\"]{1,5}", ".{0,6}", 0..6)) {
            let mut map = Map::new();
            for (k, v) in entries {
                map.insert(k, json!(v));
            }
            let key = stable_key(&map);
            let parsed: Value = serde_json::from_str(&key).unwrap();
            prop_assert_eq!(parsed, Value::Object(map));
        }
    }
}
