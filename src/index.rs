//! The Indexer: a single depth-first walk collecting every embedded
//! sub-schema by absolute URI and by its anchors (§4.2).
//!
//! Grounded on the teacher lineage's anchor-collection pass
//! (`jsonschema-referencing/src/anchors/mod.rs`), adapted to a plain/dynamic
//! map pair instead of a `Resource`-per-document registry, since `schemato`
//! keeps one flat index shared across the whole compile.
use crate::error::{CompileError, CompileResult};
use crate::pointer::Pointer;
use crate::uri::Uri;
use ahash::AHashMap;
use serde_json::Value;
use std::sync::Arc;

/// Where an indexed schema node lives: which document, and the JSON
/// Pointer path to it from that document's root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Location {
    pub(crate) doc: Uri,
    pub(crate) pointer: Pointer,
}

#[derive(Debug, Default)]
pub(crate) struct SchemaIndex {
    documents: AHashMap<Uri, Arc<Value>>,
    plain: AHashMap<Uri, Location>,
    dynamic: AHashMap<Uri, Location>,
}

impl SchemaIndex {
    pub(crate) fn new() -> Self {
        SchemaIndex::default()
    }

    pub(crate) fn has_document(&self, doc_uri: &Uri) -> bool {
        self.documents.contains_key(doc_uri)
    }

    pub(crate) fn document(&self, doc_uri: &Uri) -> Option<&Arc<Value>> {
        self.documents.get(doc_uri)
    }

    pub(crate) fn lookup_plain(&self, uri: &Uri) -> Option<&Location> {
        self.plain.get(uri)
    }

    pub(crate) fn lookup_dynamic(&self, uri: &Uri) -> Option<&Location> {
        self.dynamic.get(uri)
    }

    /// Resolve a [`Location`] to the actual JSON value it names.
    pub(crate) fn node_at(&self, location: &Location) -> Option<&Value> {
        let root = self.documents.get(&location.doc)?;
        if location.pointer.is_root() {
            Some(root)
        } else {
            crate::pointer::resolve(root, &location.pointer.to_string())
        }
    }

    /// Index `root` as the document identified by `doc_uri`, which also
    /// serves as the initial base URI for `$id` resolution within it.
    /// Safe to call repeatedly with newly fetched remote documents: each
    /// call only adds entries, so this doubles as the "merge" step in
    /// §4.2's "merges the resulting index into the existing one".
    pub(crate) fn index_document(&mut self, doc_uri: Uri, root: Arc<Value>) -> CompileResult<()> {
        self.documents.insert(doc_uri.clone(), Arc::clone(&root));
        self.plain.insert(
            doc_uri.clone(),
            Location {
                doc: doc_uri.clone(),
                pointer: Pointer::root(),
            },
        );
        let value = Arc::clone(&root);
        self.walk(&value, &doc_uri, doc_uri.clone(), Pointer::root())
    }

    fn walk(&mut self, node: &Value, doc_uri: &Uri, base: Uri, pointer: Pointer) -> CompileResult<()> {
        let Value::Object(map) = node else {
            return Ok(());
        };

        let mut base = base;

        if let Some(id_value) = map.get("$id") {
            let id = id_value.as_str().ok_or_else(|| {
                CompileError::new(pointer.clone(), "$id must be a string")
            })?;
            base = base.resolve(id);
            self.plain.insert(
                base.clone(),
                Location {
                    doc: doc_uri.clone(),
                    pointer: pointer.clone(),
                },
            );
        }

        if let Some(anchor_value) = map.get("$anchor") {
            let anchor = anchor_value.as_str().ok_or_else(|| {
                CompileError::new(pointer.clone(), "$anchor must be a string")
            })?;
            let uri = base.resolve(&format!("#{anchor}"));
            self.plain.insert(
                uri,
                Location {
                    doc: doc_uri.clone(),
                    pointer: pointer.clone(),
                },
            );
        }

        if let Some(anchor_value) = map.get("$dynamicAnchor") {
            let anchor = anchor_value.as_str().ok_or_else(|| {
                CompileError::new(pointer.clone(), "$dynamicAnchor must be a string")
            })?;
            let uri = base.resolve(&format!("#{anchor}"));
            let location = Location {
                doc: doc_uri.clone(),
                pointer: pointer.clone(),
            };
            self.plain.insert(uri.clone(), location.clone());
            self.dynamic.insert(uri, location);
        }

        for (key, value) in map {
            if key == "properties" {
                // Nested keys here are user property names, not schema
                // keywords: do not index $id/anchors found inside them.
                continue;
            }
            match value {
                Value::Object(_) => {
                    self.walk(value, doc_uri, base.clone(), pointer.push(key.as_str()))?;
                }
                Value::Array(items) => {
                    for (i, item) in items.iter().enumerate() {
                        if item.is_object() {
                            self.walk(
                                item,
                                doc_uri,
                                base.clone(),
                                pointer.push(key.as_str()).push(i),
                            )?;
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }
}
