//! The seven JSON Schema primitive types, and a compact bitmap set of them.
//!
//! Grounded on the teacher's `primitive_type.rs`: a plain enum plus a
//! bit-packed set so that `"type": [...]` with several alternatives can be
//! tested with one comparison instead of a `Vec` scan.
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum PrimitiveType {
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
}

impl PrimitiveType {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::Array => "array",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Null => "null",
            PrimitiveType::Number => "number",
            PrimitiveType::Object => "object",
            PrimitiveType::String => "string",
        }
    }

    pub(crate) fn try_from_str(value: &str) -> Option<Self> {
        Some(match value {
            "array" => PrimitiveType::Array,
            "boolean" => PrimitiveType::Boolean,
            "integer" => PrimitiveType::Integer,
            "null" => PrimitiveType::Null,
            "number" => PrimitiveType::Number,
            "object" => PrimitiveType::Object,
            "string" => PrimitiveType::String,
            _ => return None,
        })
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The JSON Schema type of a value. Unlike `PrimitiveType`, this never
/// yields `Integer` on its own — use [`matches_named_type`] for the
/// `"integer"` special case, since a single value can satisfy either
/// `"number"` or `"integer"` depending on which the schema asks for.
pub(crate) fn value_type(value: &Value) -> PrimitiveType {
    match value {
        Value::Null => PrimitiveType::Null,
        Value::Bool(_) => PrimitiveType::Boolean,
        Value::Number(_) => PrimitiveType::Number,
        Value::String(_) => PrimitiveType::String,
        Value::Array(_) => PrimitiveType::Array,
        Value::Object(_) => PrimitiveType::Object,
    }
}

/// Whether `value` satisfies the named JSON Schema type, including the
/// `"integer"` special case (any number with a zero fractional part).
pub(crate) fn matches_named_type(value: &Value, name: PrimitiveType) -> bool {
    match name {
        PrimitiveType::Integer => match value.as_f64() {
            Some(n) => n.fract() == 0.0 && n.is_finite(),
            None => false,
        },
        PrimitiveType::Number => matches!(value, Value::Number(_)),
        other => value_type(value) == other,
    }
}

/// A compact set of [`PrimitiveType`], stored as a bitmap so that
/// `"type": [...]` with multiple alternatives tests in O(1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct PrimitiveTypesBitMap(u8);

impl PrimitiveTypesBitMap {
    const fn bit(kind: PrimitiveType) -> u8 {
        match kind {
            PrimitiveType::Array => 1 << 0,
            PrimitiveType::Boolean => 1 << 1,
            PrimitiveType::Integer => 1 << 2,
            PrimitiveType::Null => 1 << 3,
            PrimitiveType::Number => 1 << 4,
            PrimitiveType::Object => 1 << 5,
            PrimitiveType::String => 1 << 6,
        }
    }

    pub(crate) fn new() -> Self {
        PrimitiveTypesBitMap(0)
    }

    pub(crate) fn add_type(&mut self, kind: PrimitiveType) {
        self.0 |= Self::bit(kind);
    }

    pub(crate) fn contains_type(self, kind: PrimitiveType) -> bool {
        self.0 & Self::bit(kind) != 0
    }

    /// Whether `value` satisfies any type in the set, honoring the
    /// `"integer"`/`"number"` overlap (an integer-valued number satisfies
    /// `{"type": "integer"}` even though its runtime tag is `Number`).
    pub(crate) fn matches(self, value: &Value) -> bool {
        if self.contains_type(PrimitiveType::Integer)
            && matches_named_type(value, PrimitiveType::Integer)
        {
            return true;
        }
        self.contains_type(value_type(value))
    }
}

impl fmt::Display for PrimitiveTypesBitMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            PrimitiveType::Array,
            PrimitiveType::Boolean,
            PrimitiveType::Integer,
            PrimitiveType::Null,
            PrimitiveType::Number,
            PrimitiveType::Object,
            PrimitiveType::String,
        ]
        .into_iter()
        .filter(|&kind| self.contains_type(kind))
        .map(PrimitiveType::as_str)
        .collect();
        write!(f, "{}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_matches_zero_fraction_numbers() {
        assert!(matches_named_type(&json!(1), PrimitiveType::Integer));
        assert!(matches_named_type(&json!(1.0), PrimitiveType::Integer));
        assert!(!matches_named_type(&json!(1.5), PrimitiveType::Integer));
    }

    #[test]
    fn bitmap_matches_any_member() {
        let mut set = PrimitiveTypesBitMap::new();
        set.add_type(PrimitiveType::String);
        set.add_type(PrimitiveType::Integer);
        assert!(set.matches(&json!("x")));
        assert!(set.matches(&json!(3)));
        assert!(!set.matches(&json!(3.5)));
        assert!(!set.matches(&json!(true)));
    }
}
