//! The open value domain wires carry: `{scalar | array | object | null}`, aliased directly to
//! `serde_json::Value` (spec §9 "Dynamic typing"). Path get/set helpers treat a pure-digit
//! path segment as an array index, matching NodeRef's `path` semantics (spec §3).

use serde_json::{Map, Value};

use crate::ast::PathSegment;

/// Descends `path` into `value`, returning `None` the moment a segment is missing or the
/// current value isn't indexable the way the segment requires.
pub fn get_path<'a>(value: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    let mut cur = value;
    for seg in path {
        cur = match (seg, cur) {
            (PathSegment::Name(n), Value::Object(map)) => map.get(n)?,
            (PathSegment::Index(i), Value::Array(arr)) => arr.get(*i)?,
            _ => return None,
        };
    }
    Some(cur)
}

/// Writes `new` at `path` inside `target`, creating intermediate objects/arrays as needed.
/// Used to merge parallel wire results into a tool's nested input object (spec §4.5 "Tool
/// input construction").
pub fn set_path(target: &mut Value, path: &[PathSegment], new: Value) {
    if path.is_empty() {
        *target = new;
        return;
    }
    let (head, rest) = (&path[0], &path[1..]);
    match head {
        PathSegment::Name(name) => {
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            let map = target.as_object_mut().expect("just ensured object");
            let slot = map.entry(name.clone()).or_insert(Value::Null);
            set_path(slot, rest, new);
        }
        PathSegment::Index(idx) => {
            if !target.is_array() {
                *target = Value::Array(Vec::new());
            }
            let arr = target.as_array_mut().expect("just ensured array");
            if arr.len() <= *idx {
                arr.resize(*idx + 1, Value::Null);
            }
            set_path(&mut arr[*idx], rest, new);
        }
    }
}

/// Null-coalesce semantics for `||`: substitutes only for `null`/missing. `0`, `false`, and
/// `""` are left alone (spec §4.5 / §8 "Fallback operators").
pub fn is_nullish(value: &Value) -> bool {
    value.is_null()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_path_descends_object_and_array() {
        let v = json!({"a": {"b": [10, 20, 30]}});
        let path = vec![PathSegment::name("a"), PathSegment::name("b"), PathSegment::Index(1)];
        assert_eq!(get_path(&v, &path), Some(&json!(20)));
    }

    #[test]
    fn get_path_missing_segment_is_none() {
        let v = json!({"a": 1});
        let path = vec![PathSegment::name("a"), PathSegment::name("b")];
        assert_eq!(get_path(&v, &path), None);
    }

    #[test]
    fn set_path_builds_nested_object() {
        let mut v = Value::Null;
        set_path(&mut v, &[PathSegment::name("headers"), PathSegment::name("Authorization")], json!("token"));
        assert_eq!(v, json!({"headers": {"Authorization": "token"}}));
    }

    #[test]
    fn set_path_builds_array_with_index() {
        let mut v = Value::Null;
        set_path(&mut v, &[PathSegment::Index(2)], json!("x"));
        assert_eq!(v, json!([null, null, "x"]));
    }

    #[test]
    fn nullish_coalesce_skips_falsy_non_null() {
        assert!(!is_nullish(&json!(0)));
        assert!(!is_nullish(&json!(false)));
        assert!(!is_nullish(&json!("")));
        assert!(is_nullish(&Value::Null));
    }
}
