//! RFC 6901 JSON Pointers.
//!
//! `serde_json::Value` ships a `.pointer()` method, but we still need our
//! own pointer type to *build* paths incrementally while compiling (one
//! segment per keyword/array-index/object-key) and to print them the way
//! error messages expect. Grounded on the teacher lineage's `paths.rs`.
use serde_json::Value;
use std::fmt;

/// One segment of a JSON Pointer: either a property name or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Segment {
    Key(String),
    Index(usize),
}

impl From<&str> for Segment {
    fn from(value: &str) -> Self {
        Segment::Key(value.to_string())
    }
}

impl From<String> for Segment {
    fn from(value: String) -> Self {
        Segment::Key(value)
    }
}

impl From<usize> for Segment {
    fn from(value: usize) -> Self {
        Segment::Index(value)
    }
}

/// An absolute JSON Pointer, e.g. `/properties/foo/items/0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Pointer(pub(crate) Vec<Segment>);

impl Pointer {
    pub(crate) fn root() -> Self {
        Pointer(Vec::new())
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn push(&self, segment: impl Into<Segment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Pointer(segments)
    }

    /// Build a pointer from a raw URI fragment (e.g. `/definitions/x`, or a
    /// percent-encoded `/definitions/x%20y`). The fragment is percent-decoded
    /// before being split into RFC 6901 tokens, matching the teacher
    /// lineage's `jsonschema-referencing::Resource::pointer`. Fails if the
    /// decoded bytes are not valid UTF-8.
    pub(crate) fn from_fragment(fragment: &str) -> Result<Self, std::str::Utf8Error> {
        let decoded = percent_encoding::percent_decode_str(fragment).decode_utf8()?;
        Ok(Pointer(
            tokens(&decoded).into_iter().map(Segment::Key).collect(),
        ))
    }

    /// Append another pointer's segments after this one's.
    pub(crate) fn join(&self, other: &Pointer) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Pointer(segments)
    }

    /// Escape a single token per RFC 6901: `~` -> `~0`, `/` -> `~1`.
    pub(crate) fn escape_token(token: &str) -> String {
        if token.contains('~') || token.contains('/') {
            token.replace('~', "~0").replace('/', "~1")
        } else {
            token.to_string()
        }
    }

    /// Unescape a single RFC 6901 token: `~1` -> `/`, then `~0` -> `~`.
    pub(crate) fn unescape_token(token: &str) -> String {
        if token.contains('~') {
            token.replace("~1", "/").replace("~0", "~")
        } else {
            token.to_string()
        }
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            f.write_str("/")?;
            match segment {
                Segment::Key(key) => f.write_str(&Pointer::escape_token(key))?,
                Segment::Index(index) => f.write_str(itoa::Buffer::new().format(*index))?,
            }
        }
        Ok(())
    }
}

/// Split a JSON Pointer string (without the leading `#`) into its raw,
/// unescaped tokens. An empty string denotes the root (no tokens).
pub(crate) fn tokens(pointer: &str) -> Vec<String> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer
        .split('/')
        .skip(1)
        .map(Pointer::unescape_token)
        .collect()
}

/// Resolve a JSON Pointer against a root value, traversing object keys or
/// decimal array indices per RFC 6901.
pub(crate) fn resolve<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    let mut current = root;
    for token in tokens(pointer) {
        current = match current {
            Value::Object(map) => map.get(&token)?,
            Value::Array(items) => {
                if token == "-" {
                    return None;
                }
                let index: usize = token.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_nested_object_and_array() {
        let root = json!({"a": {"b": [1, 2, {"c": "x"}]}});
        assert_eq!(resolve(&root, "/a/b/2/c"), Some(&json!("x")));
    }

    #[test]
    fn unescapes_tilde_and_slash() {
        let root = json!({"a/b": {"c~d": 1}});
        assert_eq!(resolve(&root, "/a~1b/c~0d"), Some(&json!(1)));
    }

    #[test]
    fn root_pointer_returns_whole_document() {
        let root = json!({"a": 1});
        assert_eq!(resolve(&root, ""), Some(&root));
    }

    #[test]
    fn display_escapes_segments() {
        let p = Pointer::root()
            .push("a/b")
            .push("c~d")
            .push(3usize);
        assert_eq!(p.to_string(), "/a~1b/c~0d/3");
    }

    #[test]
    fn from_fragment_percent_decodes_before_tokenizing() {
        let p = Pointer::from_fragment("/foo%20bar/baz").unwrap();
        assert_eq!(p, Pointer::root().push("foo bar").push("baz"));
    }

    #[test]
    fn from_fragment_rejects_invalid_utf8_after_decoding() {
        assert!(Pointer::from_fragment("/%FF").is_err());
    }
}
