//! Numeric equality and ordering across `serde_json::Number`'s internal
//! u64/i64/f64 representations, and deep structural equality for `const`/
//! `enum`. Grounded on the teacher's `keywords/helpers.rs`: comparing
//! through `f64` alone loses precision for integers above 2^53, so each
//! side is dispatched to its native representation before comparing.
use num_cmp::NumCmp;
use serde_json::{Map, Number, Value};

fn as_f64(n: &Number) -> f64 {
    n.as_f64().expect("serde_json::Number is always representable as f64")
}

macro_rules! dispatch {
    ($op:ident, $left:expr, $right:expr) => {
        if let Some(a) = $left.as_u64() {
            if let Some(b) = $right.as_u64() {
                NumCmp::$op(a, b)
            } else if let Some(b) = $right.as_i64() {
                NumCmp::$op(a, b)
            } else {
                NumCmp::$op(a, as_f64($right))
            }
        } else if let Some(a) = $left.as_i64() {
            if let Some(b) = $right.as_u64() {
                NumCmp::$op(a, b)
            } else if let Some(b) = $right.as_i64() {
                NumCmp::$op(a, b)
            } else {
                NumCmp::$op(a, as_f64($right))
            }
        } else {
            let a = as_f64($left);
            if let Some(b) = $right.as_u64() {
                NumCmp::$op(a, b)
            } else if let Some(b) = $right.as_i64() {
                NumCmp::$op(a, b)
            } else {
                NumCmp::$op(a, as_f64($right))
            }
        }
    };
}

pub(crate) fn number_ge(value: &Number, limit: &Number) -> bool {
    dispatch!(num_ge, value, limit)
}

pub(crate) fn number_le(value: &Number, limit: &Number) -> bool {
    dispatch!(num_le, value, limit)
}

pub(crate) fn number_gt(value: &Number, limit: &Number) -> bool {
    dispatch!(num_gt, value, limit)
}

pub(crate) fn number_lt(value: &Number, limit: &Number) -> bool {
    dispatch!(num_lt, value, limit)
}

pub(crate) fn number_eq(value: &Number, limit: &Number) -> bool {
    dispatch!(num_eq, value, limit)
}

/// Deep JSON equality per §3/§4.5's `const`/`enum` semantics: numbers
/// compare by mathematical value (`1` equals `1.0`), not by which
/// `serde_json::Number` variant holds them.
pub(crate) fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Null, Value::Null) => true,
        (Value::Number(a), Value::Number(b)) => number_eq(a, b),
        (Value::Array(a), Value::Array(b)) => equal_arrays(a, b),
        (Value::Object(a), Value::Object(b)) => equal_objects(a, b),
        _ => false,
    }
}

fn equal_arrays(left: &[Value], right: &[Value]) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(a, b)| equal(a, b))
}

fn equal_objects(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .all(|(key, a)| right.get(key).is_some_and(|b| equal(a, b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integers_and_floats_with_the_same_value_are_equal() {
        assert!(equal(&json!(1), &json!(1.0)));
        assert!(equal(&json!([2]), &json!([2.0])));
        assert!(!equal(&json!(1), &json!(2.0)));
    }

    #[test]
    fn objects_compare_by_key_regardless_of_insertion_order() {
        assert!(equal(
            &json!({"a": 1, "b": 2}),
            &json!({"b": 2.0, "a": 1.0})
        ));
    }

    #[test]
    fn large_integers_compare_exactly_despite_float_limb() {
        let huge = 1_u64 << 54;
        assert!(number_lt(&Number::from(huge - 1), &Number::from(huge)));
        assert!(!number_ge(&Number::from(huge - 1), &Number::from(huge)));
    }
}
