//! Portability pre-pass between ECMA-262 regex syntax and the `regex` crate.
//!
//! Grounded on the teacher's `ecma.rs`: JSON Schema patterns are written
//! against ECMA-262 semantics, which spells Unicode categories differently
//! than Rust's `regex` crate. We only need the two classes the spec names.
use std::borrow::Cow;

/// Rewrite `\p{Letter}` -> `\p{L}` and `\p{digit}` -> `\p{N}` so the pattern
/// compiles under the `regex` crate's Unicode class names. Case-sensitive,
/// matching the exact spellings used in ECMA-262 `u`-mode patterns.
pub(crate) fn to_rust_regex(pattern: &str) -> Cow<'_, str> {
    if !pattern.contains("\\p{Letter}") && !pattern.contains("\\p{digit}") {
        return Cow::Borrowed(pattern);
    }
    Cow::Owned(
        pattern
            .replace("\\p{Letter}", "\\p{L}")
            .replace("\\p{digit}", "\\p{N}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_known_classes() {
        assert_eq!(to_rust_regex(r"^\p{Letter}+$"), r"^\p{L}+$");
        assert_eq!(to_rust_regex(r"\p{digit}{3}"), r"\p{N}{3}");
    }

    #[test]
    fn leaves_unrelated_patterns_untouched() {
        assert_eq!(to_rust_regex(r"^[a-z]+$"), r"^[a-z]+$");
    }
}
