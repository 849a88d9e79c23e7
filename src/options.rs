//! `ValidationOptions`: the configuration surface for compiling a schema.
//!
//! Grounded on the teacher's `options.rs` / `compilation/options.rs`
//! builder, trimmed to what SPEC_FULL.md asks for: a pluggable
//! [`Retrieve`], a format-validation toggle, pre-registered offline
//! resources for `$ref`, and custom format functions — without the
//! multi-draft selection knobs the teacher carries (draft selection is a
//! Non-goal here).
use crate::retriever::{DefaultRetriever, Retrieve};
use crate::uri::Uri;
use ahash::AHashMap;
use serde_json::Value;
use std::sync::Arc;

pub(crate) type CustomFormats = AHashMap<String, Arc<dyn Fn(&str) -> bool + Send + Sync>>;

/// Builder for [`crate::compile_with`]. Construct with [`ValidationOptions::new`]
/// (or `Default::default()`), chain the `with_*` methods, then pass to
/// `compile_with`.
pub struct ValidationOptions {
    pub(crate) retriever: Arc<dyn Retrieve>,
    pub(crate) validate_formats: bool,
    pub(crate) resources: Vec<(Uri, Value)>,
    pub(crate) custom_formats: CustomFormats,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationOptions {
            retriever: Arc::new(DefaultRetriever),
            validate_formats: true,
            resources: Vec::new(),
            custom_formats: AHashMap::new(),
        }
    }
}

impl ValidationOptions {
    pub fn new() -> Self {
        ValidationOptions::default()
    }

    /// Replace the default HTTP/file retriever with a custom one (e.g. an
    /// in-memory map for tests, or a retriever backed by a private schema
    /// store).
    #[must_use]
    pub fn with_retriever(mut self, retriever: impl Retrieve + 'static) -> Self {
        self.retriever = Arc::new(retriever);
        self
    }

    /// Enable or disable `format` assertions (default: enabled). Disabling
    /// keeps `format` as an accepted-but-unchecked keyword, matching the
    /// "format is an annotation, not an assertion" mode some JSON Schema
    /// consumers opt into.
    #[must_use]
    pub fn with_format_validation(mut self, enabled: bool) -> Self {
        self.validate_formats = enabled;
        self
    }

    /// Pre-register a schema document under `uri` so `$ref`/`$dynamicRef`
    /// to it resolve without a network or filesystem fetch.
    #[must_use]
    pub fn with_resource(mut self, uri: impl Into<Uri>, schema: Value) -> Self {
        self.resources.push((uri.into(), schema));
        self
    }

    /// Register a custom `format` checker, consulted before the built-in
    /// table; lets callers add or override format names.
    #[must_use]
    pub fn with_format(mut self, name: impl Into<String>, check: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.custom_formats.insert(name.into(), Arc::new(check));
        self
    }
}
