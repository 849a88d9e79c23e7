//! RFC 3986 URI resolution.
//!
//! Built on the `url` crate rather than a hand-rolled parser, matching the
//! teacher lineage's early `SchemaResolver`/compiler code. One special case
//! on top of `Url::join`: `urn:` references treat a `#anchor` suffix as a
//! literal string, not a fragment replacement — `url` itself handles `urn:`
//! as an opaque scheme without special-casing this, so we do it ourselves.
use std::fmt;
use url::Url;

pub(crate) const DEFAULT_BASE: &str = "http://__default__/";

/// Split a reference string into its URI portion and fragment (without the
/// leading `#`), if any.
pub(crate) fn split_fragment(reference: &str) -> (&str, Option<&str>) {
    match reference.split_once('#') {
        Some((uri, fragment)) => (uri, Some(fragment)),
        None => (reference, None),
    }
}

/// True when a fragment looks like a JSON Pointer (empty, or starts with
/// `/`) as opposed to a plain-identifier anchor name.
pub(crate) fn is_pointer_fragment(fragment: &str) -> bool {
    fragment.is_empty() || fragment.starts_with('/')
}

/// An absolute-or-relative URI reference, resolved per RFC 3986. Public
/// only so [`crate::ValidationOptions::with_resource`] can name it in a
/// bound (`impl Into<Uri>`); construct one via `Uri::from`/`.into()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uri(String);

impl Uri {
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn default_base() -> Self {
        Uri(DEFAULT_BASE.to_string())
    }

    /// Resolve `reference` against `self` as a base URI, per RFC 3986,
    /// except that a `urn:`-scheme base with a `#fragment` reference is
    /// concatenated literally rather than having its fragment replaced.
    pub(crate) fn resolve(&self, reference: &str) -> Uri {
        if self.0.starts_with("urn:") {
            let (head, _) = split_fragment(&self.0);
            if reference.starts_with('#') {
                return Uri(format!("{head}{reference}"));
            }
        }
        match Url::parse(&self.0) {
            Ok(base) => match base.join(reference) {
                Ok(joined) => Uri(joined.into()),
                Err(_) => Uri(reference.to_string()),
            },
            Err(_) => Uri(reference.to_string()),
        }
    }

    /// The URI with any fragment stripped — used as the cache/index key for
    /// "which document", since fragments address nodes *within* a document.
    pub(crate) fn without_fragment(&self) -> Uri {
        let (head, _) = split_fragment(&self.0);
        Uri(head.to_string())
    }

    pub(crate) fn fragment(&self) -> Option<&str> {
        split_fragment(&self.0).1
    }
}

impl From<&str> for Uri {
    fn from(value: &str) -> Self {
        Uri(value.to_string())
    }
}

impl From<String> for Uri {
    fn from(value: String) -> Self {
        Uri(value)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_relative_reference_against_base() {
        let base: Uri = "http://example.com/schemas/root.json".into();
        let resolved = base.resolve("other.json");
        assert_eq!(resolved.as_str(), "http://example.com/schemas/other.json");
    }

    #[test]
    fn urn_fragment_is_literal_concatenation() {
        let base: Uri = "urn:uuid:deadbeef-0000-0000-0000-000000000000".into();
        let resolved = base.resolve("#/definitions/x");
        assert_eq!(
            resolved.as_str(),
            "urn:uuid:deadbeef-0000-0000-0000-000000000000#/definitions/x"
        );
    }

    #[test]
    fn pointer_vs_anchor_fragment() {
        assert!(is_pointer_fragment(""));
        assert!(is_pointer_fragment("/definitions/x"));
        assert!(!is_pointer_fragment("myAnchor"));
    }

    #[test]
    fn without_fragment_strips_suffix() {
        let uri: Uri = "http://example.com/a#b".into();
        assert_eq!(uri.without_fragment().as_str(), "http://example.com/a");
    }
}
