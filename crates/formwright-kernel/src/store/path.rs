//! Field paths and nested value access.
//!
//! Paths use the dot/bracket notation of field names: `user.emails[0]`,
//! `foo[0]nested`. Any run of `.`, `[` and `]` separates segments, and a
//! segment made only of digits addresses an array index.

use serde_json::{Map, Value};

/// Largest array index a write may create.
pub const MAX_INDEX: usize = 1 << 16;

/// A segment in a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object key.
    Field(String),
    /// Array index.
    Index(usize),
}

/// Split a field path into segments.
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    path.split(['.', '[', ']'])
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.bytes().all(|b| b.is_ascii_digit()) {
                match s.parse::<usize>() {
                    Ok(idx) => PathSegment::Index(idx),
                    Err(_) => PathSegment::Field(s.to_string()),
                }
            } else {
                PathSegment::Field(s.to_string())
            }
        })
        .collect()
}

/// Read the value at `path`.
pub fn get_in<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in parse_path(path) {
        current = match (current, segment) {
            (Value::Object(map), PathSegment::Field(key)) => map.get(&key)?,
            (Value::Object(map), PathSegment::Index(idx)) => map.get(&idx.to_string())?,
            (Value::Array(items), PathSegment::Index(idx)) => items.get(idx)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Write `value` at `path`, creating intermediate objects and arrays.
///
/// `None` removes an object key. For an array slot it leaves `null` so the
/// indices of later items do not shift; removing items is the job of the
/// array primitives. Clearing a path that does not exist changes nothing.
pub fn set_in(root: &mut Value, path: &str, value: Option<Value>) {
    let segments = parse_path(path);
    if segments.is_empty() {
        return;
    }
    match value {
        Some(value) => {
            let out_of_range = segments
                .iter()
                .any(|segment| matches!(segment, PathSegment::Index(idx) if *idx > MAX_INDEX));
            if out_of_range {
                tracing::warn!(path = %path, max = MAX_INDEX, "array index out of range, write skipped");
                return;
            }
            write(root, &segments, value)
        }
        None => clear(root, &segments),
    }
}

fn write(current: &mut Value, segments: &[PathSegment], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *current = value;
        return;
    };

    match head {
        PathSegment::Index(idx) => {
            if !current.is_array() {
                *current = Value::Array(Vec::new());
            }
            if let Value::Array(items) = current {
                if items.len() <= *idx {
                    items.resize(*idx + 1, Value::Null);
                }
                if let Some(slot) = items.get_mut(*idx) {
                    write(slot, rest, value);
                }
            }
        }
        PathSegment::Field(key) => {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            if let Value::Object(map) = current {
                let slot = map.entry(key.clone()).or_insert(Value::Null);
                write(slot, rest, value);
            }
        }
    }
}

fn clear(current: &mut Value, segments: &[PathSegment]) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };

    match (current, head) {
        (Value::Object(map), PathSegment::Field(key)) => {
            if rest.is_empty() {
                map.remove(key);
            } else if let Some(next) = map.get_mut(key) {
                clear(next, rest);
            }
        }
        (Value::Array(items), PathSegment::Index(idx)) => {
            if let Some(next) = items.get_mut(*idx) {
                if rest.is_empty() {
                    *next = Value::Null;
                } else {
                    clear(next, rest);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn parses_bracket_and_dot_notation() {
        assert_eq!(
            parse_path("foo[0]nested-component"),
            vec![
                PathSegment::Field("foo".into()),
                PathSegment::Index(0),
                PathSegment::Field("nested-component".into()),
            ]
        );
        assert_eq!(
            parse_path("a.b[12].c"),
            vec![
                PathSegment::Field("a".into()),
                PathSegment::Field("b".into()),
                PathSegment::Index(12),
                PathSegment::Field("c".into()),
            ]
        );
    }

    #[test]
    fn write_creates_containers() {
        let mut root = json!({});
        set_in(&mut root, "foo[1]name", Some(json!("x")));
        assert_eq!(root, json!({ "foo": [null, { "name": "x" }] }));
        assert_eq!(get_in(&root, "foo[1].name"), Some(&json!("x")));
    }

    #[test]
    fn huge_index_is_not_written() {
        let mut root = json!({ "foo": ["a"] });
        set_in(&mut root, &format!("foo[{}]", usize::MAX), Some(json!(1)));
        set_in(&mut root, "foo[10000000000]", Some(json!(1)));
        set_in(&mut root, &format!("bar[{}]x", MAX_INDEX + 1), Some(json!(1)));
        assert_eq!(root, json!({ "foo": ["a"] }));

        set_in(&mut root, &format!("foo[{}]", usize::MAX), None);
        assert_eq!(root, json!({ "foo": ["a"] }));
    }

    #[test]
    fn clear_removes_object_keys() {
        let mut root = json!({ "a": { "b": 1, "c": 2 } });
        set_in(&mut root, "a.b", None);
        assert_eq!(root, json!({ "a": { "c": 2 } }));
    }

    #[test]
    fn clear_does_not_shift_arrays() {
        let mut root = json!({ "a": [1, 2, 3] });
        set_in(&mut root, "a[1]", None);
        assert_eq!(root, json!({ "a": [1, null, 3] }));
    }

    #[test]
    fn clear_of_missing_path_is_a_noop() {
        let mut root = json!({ "a": [1] });
        set_in(&mut root, "a[4].name", None);
        set_in(&mut root, "b.c", None);
        assert_eq!(root, json!({ "a": [1] }));
    }

    #[test]
    fn get_through_scalar_is_none() {
        let root = json!({ "a": 1 });
        assert_eq!(get_in(&root, "a.b"), None);
    }

    proptest! {
        #[test]
        fn written_values_read_back(
            keys in prop::collection::vec("[a-z]{1,6}", 1..4),
            index in 0usize..5,
            value in any::<i64>(),
        ) {
            let path = format!("{}[{}]", keys.join("."), index);
            let mut root = json!({});
            set_in(&mut root, &path, Some(json!(value)));
            prop_assert_eq!(get_in(&root, &path), Some(&json!(value)));
        }

        #[test]
        fn separators_never_survive_parsing(path in "[a-z0-9.\\[\\]]{0,20}") {
            for segment in parse_path(&path) {
                if let PathSegment::Field(name) = segment {
                    prop_assert!(!name.is_empty());
                    prop_assert!(!name.contains(['.', '[', ']']));
                }
            }
        }
    }
}
