//! Semantic equality for JSON documents.
//!
//! Compares two parsed documents by kind: arrays element-wise in order,
//! objects by key set, booleans distinct from numbers, numbers by value
//! across integer and float representations.

use serde_json::{Map, Number, Value};

pub(crate) fn semantic_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::Number(l), Value::Number(r)) => number_eq(l, r),
        (Value::String(l), Value::String(r)) => l == r,
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| semantic_eq(a, b))
        }
        (Value::Object(l), Value::Object(r)) => object_eq(l, r),
        _ => false,
    }
}

fn object_eq(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .all(|(key, value)| right.get(key).is_some_and(|other| semantic_eq(value, other)))
}

/// `1` and `1.0` are the same number even though they deserialize to
/// different internal representations.
fn number_eq(left: &Number, right: &Number) -> bool {
    if left == right {
        return true;
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_key_order_irrelevant() {
        assert!(semantic_eq(
            &json!({"a": 1, "b": [1, 2]}),
            &json!({"b": [1, 2], "a": 1})
        ));
    }

    #[test]
    fn test_object_key_set_must_match() {
        assert!(!semantic_eq(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!semantic_eq(&json!({"a": 1}), &json!({"b": 1})));
    }

    #[test]
    fn test_array_order_and_length_matter() {
        assert!(semantic_eq(&json!([1, 2]), &json!([1, 2])));
        assert!(!semantic_eq(&json!([1, 2]), &json!([2, 1])));
        assert!(!semantic_eq(&json!([1, 2]), &json!([1, 2, 3])));
    }

    #[test]
    fn test_booleans_never_equal_numbers() {
        assert!(!semantic_eq(&json!(true), &json!(1)));
        assert!(!semantic_eq(&json!(false), &json!(0)));
    }

    #[test]
    fn test_numbers_compared_by_value() {
        assert!(semantic_eq(&json!(1), &json!(1.0)));
        assert!(!semantic_eq(&json!(1), &json!(2)));
        assert!(!semantic_eq(&json!("1"), &json!(1)));
    }

    #[test]
    fn test_nested_documents() {
        assert!(semantic_eq(
            &json!({"user": {"name": "a", "tags": ["x", "y"]}}),
            &json!({"user": {"tags": ["x", "y"], "name": "a"}})
        ));
        assert!(!semantic_eq(
            &json!({"user": {"tags": ["x", "y"]}}),
            &json!({"user": {"tags": ["y", "x"]}})
        ));
    }

    #[test]
    fn test_null_only_equals_null() {
        assert!(semantic_eq(&json!(null), &json!(null)));
        assert!(!semantic_eq(&json!(null), &json!(0)));
        assert!(!semantic_eq(&json!(null), &json!("")));
    }
}
