//! The Reference resolver (§4.3): turns a `$ref`/`$dynamicRef` string into a
//! direct [`Location`] in the [`SchemaIndex`], fetching and indexing remote
//! documents on demand.
//!
//! Grounded on the teacher's split between `Registry`/`Resolver` lookup
//! (`jsonschema-referencing/src/resolver.rs`) and the eager-fetch retriever
//! (`retriever.rs`). Unlike the teacher, `schemato` does not mutate the
//! schema JSON to rewrite `$ref` in place — [`Location`] already gives the
//! compiler a direct handle, so the document stays untouched and shareable
//! via `Arc`.
use crate::error::{CompileError, CompileResult};
use crate::index::{Location, SchemaIndex};
use crate::pointer::Pointer;
use crate::retriever::Retrieve;
use crate::uri::{is_pointer_fragment, Uri};
use serde_json::Value;
use std::sync::Arc;

/// Normalize a boolean schema to its object-schema equivalent (§3):
/// `true` -> `{}`, `false` -> `{"not": {}}`. Non-boolean nodes pass through
/// unchanged (and are not cloned).
pub(crate) fn normalize_boolean(node: &Value) -> Option<Value> {
    match node {
        Value::Bool(true) => Some(Value::Object(serde_json::Map::new())),
        Value::Bool(false) => {
            let mut not_clause = serde_json::Map::new();
            not_clause.insert("not".to_string(), Value::Object(serde_json::Map::new()));
            Some(Value::Object(not_clause))
        }
        _ => None,
    }
}

/// Resolve a `$ref`/`$dynamicRef` string against `base`, returning the
/// [`Location`] of its target. Fetches and indexes the remote document the
/// reference belongs to when it is not already known, fetching always with
/// the fragment stripped and then applying the fragment locally (per §9's
/// resolution of the source's inconsistent fetch semantics).
pub(crate) fn resolve_reference(
    index: &mut SchemaIndex,
    retriever: &dyn Retrieve,
    base: &Uri,
    reference: &str,
    path: &Pointer,
) -> CompileResult<Location> {
    let full = base.resolve(reference);
    let doc_uri = full.without_fragment();
    let fragment = full.fragment().unwrap_or("").to_string();

    if is_pointer_fragment(&fragment) {
        if index.lookup_plain(&doc_uri).is_none() {
            fetch_and_index(index, retriever, &doc_uri, path)?;
        }
        let base_location = index
            .lookup_plain(&doc_uri)
            .cloned()
            .ok_or_else(|| CompileError::unresolved_reference(path.clone(), reference))?;
        let decoded_fragment = Pointer::from_fragment(&fragment).map_err(|err| {
            CompileError::invalid_percent_encoding(path.clone(), &fragment, &err)
        })?;
        let extended = base_location.pointer.join(&decoded_fragment);
        let location = Location {
            doc: base_location.doc,
            pointer: extended,
        };
        if index.node_at(&location).is_none() {
            return Err(CompileError::unresolved_reference(path.clone(), reference));
        }
        Ok(location)
    } else {
        if index.lookup_plain(&full).is_none() && !index.has_document(&doc_uri) {
            fetch_and_index(index, retriever, &doc_uri, path)?;
        }
        index
            .lookup_plain(&full)
            .cloned()
            .ok_or_else(|| CompileError::unresolved_reference(path.clone(), reference))
    }
}

/// Resolve a `$dynamicRef` dynamically: try the dynamic index first (the
/// spec's "first scope whose resolved URI is present in the dynamic
/// index"), falling back to the plain index. Does not fetch remotely —
/// by the time a `$dynamicRef` target can resolve dynamically, the
/// document it lives in was already indexed during compilation.
pub(crate) fn resolve_dynamic(index: &SchemaIndex, scope: &Uri, reference: &str) -> Option<Location> {
    let full = scope.resolve(reference);
    index
        .lookup_dynamic(&full)
        .or_else(|| index.lookup_plain(&full))
        .cloned()
}

fn fetch_and_index(
    index: &mut SchemaIndex,
    retriever: &dyn Retrieve,
    doc_uri: &Uri,
    path: &Pointer,
) -> CompileResult<()> {
    if index.has_document(doc_uri) {
        return Ok(());
    }
    let fetched = retriever
        .retrieve(doc_uri.as_str())
        .map_err(|err| CompileError::fetch_failed(path.clone(), doc_uri.as_str(), &err))?;
    index.index_document(doc_uri.clone(), Arc::new(fetched))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::RetrieveError;
    use serde_json::json;

    struct NullRetriever;
    impl Retrieve for NullRetriever {
        fn retrieve(&self, uri: &str) -> Result<Value, RetrieveError> {
            Err(RetrieveError::new(format!("no network in tests: {uri}")))
        }
    }

    #[test]
    fn resolves_local_pointer_fragment() {
        let schema = json!({
            "$id": "https://example.com/root.json",
            "$defs": { "pos": { "type": "integer" } }
        });
        let mut index = SchemaIndex::new();
        index
            .index_document("https://example.com/root.json".into(), Arc::new(schema))
            .unwrap();
        let base: Uri = "https://example.com/root.json".into();
        let location = resolve_reference(
            &mut index,
            &NullRetriever,
            &base,
            "#/$defs/pos",
            &Pointer::root(),
        )
        .unwrap();
        assert_eq!(index.node_at(&location), Some(&json!({"type": "integer"})));
    }

    #[test]
    fn resolves_anchor_fragment() {
        let schema = json!({
            "$id": "https://example.com/root.json",
            "$defs": { "pos": { "$anchor": "positive", "type": "integer", "minimum": 0 } }
        });
        let mut index = SchemaIndex::new();
        index
            .index_document("https://example.com/root.json".into(), Arc::new(schema))
            .unwrap();
        let base: Uri = "https://example.com/root.json".into();
        let location = resolve_reference(
            &mut index,
            &NullRetriever,
            &base,
            "#positive",
            &Pointer::root(),
        )
        .unwrap();
        assert_eq!(
            index.node_at(&location),
            Some(&json!({"$anchor": "positive", "type": "integer", "minimum": 0}))
        );
    }

    #[test]
    fn unresolved_reference_is_a_compile_error() {
        let mut index = SchemaIndex::new();
        index
            .index_document("https://example.com/root.json".into(), Arc::new(json!({})))
            .unwrap();
        let base: Uri = "https://example.com/root.json".into();
        let result = resolve_reference(
            &mut index,
            &NullRetriever,
            &base,
            "#/$defs/missing",
            &Pointer::root(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn resolves_pointer_fragment_with_percent_encoded_key() {
        let schema = json!({
            "$id": "https://example.com/root.json",
            "$defs": { "foo bar": { "type": "integer" } }
        });
        let mut index = SchemaIndex::new();
        index
            .index_document("https://example.com/root.json".into(), Arc::new(schema))
            .unwrap();
        let base: Uri = "https://example.com/root.json".into();
        let location = resolve_reference(
            &mut index,
            &NullRetriever,
            &base,
            "#/$defs/foo%20bar",
            &Pointer::root(),
        )
        .unwrap();
        assert_eq!(index.node_at(&location), Some(&json!({"type": "integer"})));
    }

    #[test]
    fn boolean_normalization() {
        assert_eq!(normalize_boolean(&json!(true)), Some(json!({})));
        assert_eq!(normalize_boolean(&json!(false)), Some(json!({"not": {}})));
        assert_eq!(normalize_boolean(&json!({"type": "string"})), None);
    }
}
