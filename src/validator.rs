//! The public compiled-schema handle and the validation entry point (§5-6).
//!
//! Grounded on the teacher's `validator.rs` (`Validator::validate`/
//! `is_valid` pair), minus the teacher's iterator-of-errors streaming API:
//! SPEC_FULL.md asks for a single collected [`ValidationOutcome`] per call.
use crate::compiler::{self, CompiledSchemaData};
use crate::error::CompileError;
use crate::evaluation::ValidationRun;
use crate::instruction::EvalContext;
use crate::options::ValidationOptions;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A schema compiled once and safe to validate many instances against,
/// from many threads at once (§5): compilation is the only phase that
/// mutates the instruction tree, and it has already happened by the time
/// a `CompiledSchema` exists.
pub struct CompiledSchema {
    data: CompiledSchemaData,
}

/// The result of validating one instance: either `{"ok": true}` or
/// `{"ok": false, "errors": [...]}` (§6), with each keyword violation
/// rendered to its display string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Ok,
    Invalid { errors: Vec<String> },
}

impl Serialize for ValidationOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ValidationOutcome::Ok => {
                let mut state = serializer.serialize_struct("ValidationOutcome", 1)?;
                state.serialize_field("ok", &true)?;
                state.end()
            }
            ValidationOutcome::Invalid { errors } => {
                let mut state = serializer.serialize_struct("ValidationOutcome", 2)?;
                state.serialize_field("ok", &false)?;
                state.serialize_field("errors", errors)?;
                state.end()
            }
        }
    }
}

impl ValidationOutcome {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, ValidationOutcome::Ok)
    }

    #[must_use]
    pub fn errors(&self) -> &[String] {
        match self {
            ValidationOutcome::Ok => &[],
            ValidationOutcome::Invalid { errors } => errors,
        }
    }
}

impl CompiledSchema {
    /// Compile `schema` with default options (remote `$ref` resolution
    /// over HTTP/file, format assertions enabled).
    pub fn compile(schema: Value) -> Result<Self, CompileError> {
        CompiledSchema::compile_with(schema, &ValidationOptions::default())
    }

    /// Compile `schema` with caller-supplied [`ValidationOptions`].
    pub fn compile_with(schema: Value, options: &ValidationOptions) -> Result<Self, CompileError> {
        let data = compiler::compile_schema(schema, options)?;
        Ok(CompiledSchema { data })
    }

    /// Validate `instance`, collecting every violation rather than
    /// stopping at the first one.
    #[must_use]
    pub fn validate(&self, instance: &Value) -> ValidationOutcome {
        let ctx = EvalContext {
            index: &self.data.index,
            memo: &self.data.memo,
            custom_formats: &self.data.custom_formats,
        };
        let mut run = ValidationRun::new();
        let violations = self
            .data
            .root
            .read()
            .unwrap()
            .eval(&ctx, &mut run, instance);
        if violations.is_empty() {
            ValidationOutcome::Ok
        } else {
            ValidationOutcome::Invalid {
                errors: violations.into_iter().map(|v| v.to_string()).collect(),
            }
        }
    }

    /// Shortcut for `validate(instance).is_ok()` that skips collecting
    /// violation messages once the first branch in each combinator fails,
    /// since the `bool` result doesn't need them rendered.
    #[must_use]
    pub fn is_valid(&self, instance: &Value) -> bool {
        let ctx = EvalContext {
            index: &self.data.index,
            memo: &self.data.memo,
            custom_formats: &self.data.custom_formats,
        };
        let mut run = ValidationRun::new();
        self.data
            .root
            .read()
            .unwrap()
            .eval(&ctx, &mut run, instance)
            .is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validate_reports_ok_for_matching_instance() {
        let schema = CompiledSchema::compile(json!({"type": "string", "minLength": 3})).unwrap();
        let outcome = schema.validate(&json!("hello"));
        assert!(outcome.is_ok());
        assert!(outcome.errors().is_empty());
    }

    #[test]
    fn validate_collects_every_violation() {
        let schema = CompiledSchema::compile(json!({
            "type": "string",
            "minLength": 10
        }))
        .unwrap();
        let outcome = schema.validate(&json!(5));
        assert!(!outcome.is_ok());
        // Type mismatch short-circuits minLength (it only applies to
        // strings), so exactly one violation is expected here.
        assert_eq!(outcome.errors().len(), 1);
    }

    #[test]
    fn is_valid_matches_validate() {
        let schema = CompiledSchema::compile(json!({"type": "number"})).unwrap();
        assert!(schema.is_valid(&json!(1)));
        assert!(!schema.is_valid(&json!("x")));
        assert_eq!(
            schema.is_valid(&json!("x")),
            schema.validate(&json!("x")).is_ok()
        );
    }

    #[test]
    fn outcome_serializes_per_spec_shape() {
        let schema = CompiledSchema::compile(json!({"type": "string"})).unwrap();
        let ok = serde_json::to_value(schema.validate(&json!("x"))).unwrap();
        assert_eq!(ok, json!({"ok": true}));
        let bad = serde_json::to_value(schema.validate(&json!(1))).unwrap();
        assert_eq!(bad["ok"], json!(false));
        assert!(bad["errors"].as_array().unwrap().len() == 1);
    }

    #[test]
    fn compiled_schema_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledSchema>();
    }
}
