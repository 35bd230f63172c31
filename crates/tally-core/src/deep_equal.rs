//! Structural equality over serialized values
//!
//! `Test::deep_equal` serializes both sides with serde and compares the
//! resulting `serde_json::Value` trees, so values of different Rust types
//! compare equal when their shapes match (a `Vec` against an array, a struct
//! against a map with the same keys).

use serde::Serialize;
use serde_json::{Number, Value};

/// Deep equality for serialized values.
///
/// Numbers compare by numeric value (`1` equals `1.0`); arrays element by
/// element; objects by key set and recursively equal values.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys.iter()).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| deep_equal(x, y)))
        }
        _ => false,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Serialize any value into the tree `deep_equal` compares
pub fn to_value<T>(value: &T) -> Result<Value, serde_json::Error>
where
    T: Serialize + ?Sized,
{
    serde_json::to_value(value)
}

/// Compact rendering used in failure details
pub(crate) fn render(value: &Value) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(null), json!(null))]
    #[case(json!(1), json!(1.0))]
    #[case(json!(-3), json!(-3))]
    #[case(json!("a"), json!("a"))]
    #[case(json!([1, [2, 3]]), json!([1, [2, 3]]))]
    #[case(json!({"a": 1, "b": [true]}), json!({"b": [true], "a": 1}))]
    fn test_equal_values(#[case] a: Value, #[case] b: Value) {
        assert!(deep_equal(&a, &b));
        assert!(deep_equal(&b, &a));
    }

    #[rstest]
    #[case(json!(null), json!(false))]
    #[case(json!(0), json!("0"))]
    #[case(json!(1), json!(2))]
    #[case(json!([1, 2]), json!([1, 2, 3]))]
    #[case(json!([1, 2]), json!([2, 1]))]
    #[case(json!({"a": 1}), json!({"a": 1, "b": 2}))]
    #[case(json!({"a": 1}), json!({"b": 1}))]
    #[case(json!({"a": {"b": 1}}), json!({"a": {"b": 2}}))]
    fn test_unequal_values(#[case] a: Value, #[case] b: Value) {
        assert!(!deep_equal(&a, &b));
        assert!(!deep_equal(&b, &a));
    }

    #[test]
    fn test_large_unsigned_numbers() {
        assert!(deep_equal(&json!(u64::MAX), &json!(u64::MAX)));
        assert!(!deep_equal(&json!(u64::MAX), &json!(u64::MAX - 1)));
    }

    #[test]
    fn test_different_types_same_shape() {
        #[derive(Serialize)]
        struct Point {
            x: i32,
            y: i32,
        }

        let point = to_value(&Point { x: 1, y: 2 }).unwrap();
        assert!(deep_equal(&point, &json!({"x": 1, "y": 2})));

        let list = to_value(&vec![1u8, 2, 3]).unwrap();
        let array = to_value(&[1i64, 2, 3]).unwrap();
        assert!(deep_equal(&list, &array));
    }
}
