//! Error types.
//!
//! Two taxonomies, matching the split in the teacher lineage's `error.rs`:
//! fatal [`CompileError`] for problems discovered while building a
//! [`crate::validator::CompiledSchema`], and non-fatal [`Violation`] for
//! individual keyword failures collected during validation.
use crate::pointer::Pointer;
use serde_json::Value;
use std::fmt;

const MAX_INSTANCE_REPR: usize = 200;

/// Render a JSON value for inclusion in an error message, truncated to
/// roughly [`MAX_INSTANCE_REPR`] characters.
pub(crate) fn truncated_repr(value: &Value) -> String {
    let full = value.to_string();
    if full.chars().count() <= MAX_INSTANCE_REPR {
        full
    } else {
        let mut truncated: String = full.chars().take(MAX_INSTANCE_REPR).collect();
        truncated.push('…');
        truncated
    }
}

/// A fatal error raised while compiling a schema.
///
/// Unresolved `$ref`/`$dynamicRef`, malformed regular expressions, remote
/// fetch failures, and structurally invalid schemas (not an object, array,
/// or boolean where one is required) all surface here.
#[derive(Debug)]
pub struct CompileError {
    message: String,
    path: Pointer,
}

impl CompileError {
    pub(crate) fn new(path: Pointer, message: impl Into<String>) -> Self {
        CompileError {
            message: message.into(),
            path,
        }
    }

    pub(crate) fn unresolved_reference(path: Pointer, reference: &str) -> Self {
        CompileError::new(
            path,
            format!("Unresolved reference '{reference}'"),
        )
    }

    pub(crate) fn invalid_regex(path: Pointer, pattern: &str, cause: &regex::Error) -> Self {
        CompileError::new(path, format!("Invalid regex '{pattern}': {cause}"))
    }

    pub(crate) fn invalid_schema(path: Pointer, value: &Value) -> Self {
        CompileError::new(
            path,
            format!(
                "{} is not a valid schema: expected an object or a boolean",
                truncated_repr(value)
            ),
        )
    }

    pub(crate) fn fetch_failed(path: Pointer, uri: &str, cause: &dyn std::error::Error) -> Self {
        CompileError::new(path, format!("Failed to fetch schema '{uri}': {cause}"))
    }

    pub(crate) fn invalid_percent_encoding(
        path: Pointer,
        fragment: &str,
        cause: &std::str::Utf8Error,
    ) -> Self {
        CompileError::new(
            path,
            format!(
                "Invalid percent encoding in fragment '#{fragment}': the decoded bytes do not represent valid UTF-8 ({cause})"
            ),
        )
    }

    /// JSON Pointer to the schema node that caused the failure, when known.
    #[must_use]
    pub fn path(&self) -> &Pointer {
        &self.path
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} (at {})", self.message, self.path)
        }
    }
}

impl std::error::Error for CompileError {}

/// A single keyword violation discovered during validation.
///
/// This is kept as a structured value internally (rather than a bare
/// `String`) so that keyword implementations can build messages out of
/// their own typed limits without formatting twice; [`Violation::to_string`]
/// (via `Display`) is what the public API exposes.
#[derive(Debug, Clone)]
pub(crate) struct Violation {
    message: String,
}

impl Violation {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Violation {
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Convenience alias used throughout `keywords/*` and `instruction.rs`.
pub(crate) type CompileResult<T> = Result<T, CompileError>;
