//! A JSON Schema (draft 2020-12) compiler and validator.
//!
//! ```
//! use serde_json::json;
//!
//! let schema = schemato::compile(json!({"type": "string", "minLength": 3})).unwrap();
//! assert!(schema.is_valid(&json!("abc")));
//! assert!(!schema.is_valid(&json!("ab")));
//! ```
//!
//! Compilation (§4.2-§4.4) resolves `$ref`/`$dynamicRef`, indexes `$id`/
//! `$anchor`/`$dynamicAnchor`, and builds a cycle-safe tree of
//! [`Instruction`](crate::instruction::Instruction)s once; validation
//! (§4.5) walks that tree per instance and never mutates it, so a
//! [`CompiledSchema`] is cheap to validate many instances against and safe
//! to share across threads.
mod compiler;
mod error;
mod evaluation;
mod format;
mod helpers;
mod index;
mod instruction;
mod options;
mod pointer;
mod primitive_type;
mod regex_ext;
mod resolver;
mod retriever;
mod uri;
mod validator;

pub use error::CompileError;
pub use options::ValidationOptions;
pub use retriever::{DefaultRetriever, Retrieve, RetrieveError};
pub use uri::Uri;
pub use validator::{CompiledSchema, ValidationOutcome};

use serde_json::Value;

/// Compile `schema` with default options: see [`ValidationOptions::default`].
pub fn compile(schema: Value) -> Result<CompiledSchema, CompileError> {
    CompiledSchema::compile(schema)
}

/// Compile `schema` with caller-supplied options (custom retriever, format
/// validation toggle, pre-registered offline resources, custom formats).
pub fn compile_with(schema: Value, options: &ValidationOptions) -> Result<CompiledSchema, CompileError> {
    CompiledSchema::compile_with(schema, options)
}

/// Compile `schema` and check `instance` against it in one call.
///
/// Returns `Ok(false)` for a schema that fails to compile, same as the
/// teacher's `jsonschema::is_valid` treats an unresolved reference as "not
/// valid" rather than propagating the compile error — callers that need to
/// distinguish the two should use [`compile`] and inspect the [`CompileError`].
pub fn is_valid(schema: Value, instance: &Value) -> bool {
    match compile(schema) {
        Ok(compiled) => compiled.is_valid(instance),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compile_and_validate_round_trip() {
        let schema = compile(json!({"type": "integer", "minimum": 0})).unwrap();
        assert!(schema.is_valid(&json!(5)));
        assert!(!schema.is_valid(&json!(-1)));
    }

    #[test]
    fn is_valid_convenience_function() {
        assert!(is_valid(json!({"type": "boolean"}), &json!(true)));
        assert!(!is_valid(json!({"type": "boolean"}), &json!(1)));
    }

    #[test]
    fn is_valid_returns_false_for_uncompilable_schema() {
        assert!(!is_valid(json!({"$ref": "#/does/not/exist"}), &json!(1)));
    }
}
