//! Remote schema retrieval.
//!
//! Grounded on the teacher's `retriever.rs`: a small `Retrieve` trait so
//! callers can plug in their own fetcher (tests use an in-memory map), with
//! a `DefaultRetriever` that handles `http(s)://` and `file://` URIs behind
//! the `resolve-http` / `resolve-file` features.
use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub struct RetrieveError(String);

impl RetrieveError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        RetrieveError(message.into())
    }
}

impl fmt::Display for RetrieveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for RetrieveError {}

/// Fetches the JSON document at `uri` (fragment already stripped by the
/// caller, per the spec's "always fetch with fragment stripped" rule).
pub trait Retrieve: Send + Sync {
    fn retrieve(&self, uri: &str) -> Result<Value, RetrieveError>;
}

/// The retriever used when a caller does not supply their own: resolves
/// `http(s)://` via `reqwest` (feature `resolve-http`) and `file://` via
/// the filesystem (feature `resolve-file`). Any other scheme, or a disabled
/// feature, is a retrieval error — never a silent pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRetriever;

impl Retrieve for DefaultRetriever {
    fn retrieve(&self, uri: &str) -> Result<Value, RetrieveError> {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return retrieve_http(uri);
        }
        if let Some(path) = uri.strip_prefix("file://") {
            return retrieve_file(path);
        }
        Err(RetrieveError::new(format!(
            "Unsupported scheme for remote reference '{uri}'"
        )))
    }
}

#[cfg(feature = "resolve-http")]
fn retrieve_http(uri: &str) -> Result<Value, RetrieveError> {
    let response = reqwest::blocking::get(uri)
        .map_err(|err| RetrieveError::new(format!("Failed to fetch '{uri}': {err}")))?;
    response
        .json()
        .map_err(|err| RetrieveError::new(format!("Invalid JSON from '{uri}': {err}")))
}

#[cfg(not(feature = "resolve-http"))]
fn retrieve_http(uri: &str) -> Result<Value, RetrieveError> {
    Err(RetrieveError::new(format!(
        "HTTP retrieval is disabled (enable the 'resolve-http' feature) for '{uri}'"
    )))
}

#[cfg(feature = "resolve-file")]
fn retrieve_file(path: &str) -> Result<Value, RetrieveError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| RetrieveError::new(format!("Failed to read '{path}': {err}")))?;
    serde_json::from_str(&content)
        .map_err(|err| RetrieveError::new(format!("Invalid JSON in '{path}': {err}")))
}

#[cfg(not(feature = "resolve-file"))]
fn retrieve_file(path: &str) -> Result<Value, RetrieveError> {
    Err(RetrieveError::new(format!(
        "File retrieval is disabled (enable the 'resolve-file' feature) for '{path}'"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticRetriever;

    impl Retrieve for StaticRetriever {
        fn retrieve(&self, uri: &str) -> Result<Value, RetrieveError> {
            if uri == "https://example.com/schema.json" {
                Ok(serde_json::json!({"type": "string"}))
            } else {
                Err(RetrieveError::new("not found"))
            }
        }
    }

    #[test]
    fn custom_retriever_is_used_directly() {
        let retriever = StaticRetriever;
        let doc = retriever
            .retrieve("https://example.com/schema.json")
            .unwrap();
        assert_eq!(doc, serde_json::json!({"type": "string"}));
    }

    #[test]
    fn default_retriever_rejects_unknown_scheme() {
        let retriever = DefaultRetriever;
        assert!(retriever.retrieve("urn:uuid:abc").is_err());
    }
}
