//! Tag injection passes.
//!
//! Each pass converts one directive namespace (`store`, `wire`,
//! `validate`) into the canonical `@attr:` output form inside field
//! comment blocks. The [`merge`] pass then folds every `@attr:` line of
//! a block into a single line keyed by namespace, which is what makes
//! repeated runs idempotent.

pub mod merge;
pub mod store;
pub mod validate;
pub mod wire;

use crate::directive::{self, Key, IGNORE};

/// Result of scanning one comment block for a tag namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// First matching directive carried a concrete value; it was
    /// rewritten in place.
    Explicit(String),
    /// First matching directive carried the `ignore` sentinel; the
    /// block is left untouched.
    Ignored,
    /// No directive of this namespace exists in the block.
    Absent,
}

/// Rewrite the first directive of `key` in `lines` into the canonical
/// `@attr:` form, wrapping its value as `namespace:"value"`. Later
/// duplicates of the same namespace are preserved verbatim and not
/// reprocessed.
pub(crate) fn rewrite_first(
    lines: &[String],
    key: Key,
    namespace: &str,
    honors_ignore: bool,
) -> (Vec<String>, Outcome) {
    let marker = format!("@{namespace}");
    let mut result = Vec::with_capacity(lines.len());
    let mut outcome = Outcome::Absent;

    for line in lines {
        if outcome == Outcome::Absent {
            if let Some(value) = directive::match_value(line, key) {
                if honors_ignore && value.eq_ignore_ascii_case(IGNORE) {
                    // leave the whole block untouched
                    return (lines.to_vec(), Outcome::Ignored);
                }
                let rewritten = line
                    .replacen(&marker, "@attr", 1)
                    .replacen(&value, &format!("{namespace}:\"{value}\""), 1);
                result.push(rewritten);
                outcome = Outcome::Explicit(value);
                continue;
            }
        }
        result.push(line.clone());
    }

    (result, outcome)
}

/// Canonical default line appended when a namespace is absent.
pub(crate) fn default_line(namespace: &str, value: &str) -> String {
    format!(" @attr: {namespace}:\"{value}\"")
}
