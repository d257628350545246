//! Canonical tag merge.
//!
//! Folds every `@attr:` line of a comment block into a single line,
//! keyed by tag namespace with the first occurrence winning. Because a
//! merged line re-parses to the same namespace keys, running the pass
//! again is a no-op: this is the idempotence guarantee for repeated
//! runs over the same schema.

use std::collections::HashSet;

use crate::directive::{self, Key};
use crate::schema::{Document, NodeId};

/// Merge tag lines across a message's fields and nested messages.
pub fn merge_message(doc: &mut Document, msg: NodeId) {
    for child in doc.node(msg).children.clone() {
        let node = doc.node(child);
        if node.field().is_some() {
            if node.comment.is_empty() {
                continue;
            }
            let merged = merge_block(&node.comment);
            doc.node_mut(child).comment = merged;
        } else if node.is_message() {
            merge_message(doc, child);
        }
    }
}

/// Fold all `@attr:` lines of one block into a single trailing line.
/// Non-tag lines pass through in order.
pub fn merge_block(lines: &[String]) -> Vec<String> {
    let mut result = Vec::with_capacity(lines.len());
    let mut seen: HashSet<String> = HashSet::new();
    let mut parts: Vec<String> = Vec::new();
    let mut has_tag = false;

    for line in lines {
        match directive::match_value(line, Key::Attr) {
            Some(payload) => {
                has_tag = true;
                let key = payload.split(':').next().unwrap_or_default().to_string();
                if seen.insert(key) {
                    parts.push(payload);
                }
            }
            None => result.push(line.clone()),
        }
    }

    if has_tag {
        result.push(format!(" @attr: {}", parts.join(" ")));
    }
    result
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn tag_lines_fold_into_one_keyed_by_namespace() {
        let block = lines(&[
            " prose stays first",
            " @attr: store:\"nick\"",
            " @attr: wire:\"nick\"",
            " @attr: validate:\"required\"",
        ]);
        assert_eq!(
            merge_block(&block),
            lines(&[
                " prose stays first",
                " @attr: store:\"nick\" wire:\"nick\" validate:\"required\"",
            ])
        );
    }

    #[test]
    fn duplicate_namespaces_keep_the_first_occurrence() {
        let block = lines(&[" @attr: store:\"first\"", " @attr: store:\"second\""]);
        assert_eq!(merge_block(&block), lines(&[" @attr: store:\"first\""]));
    }

    #[test]
    fn merging_twice_is_byte_identical() {
        let block = lines(&[
            " field description",
            " @attr: store:\"uid\"",
            " @attr: wire:\"uid\"",
        ]);
        let once = merge_block(&block);
        let twice = merge_block(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn blocks_without_tags_are_untouched() {
        let block = lines(&[" only prose", " more prose"]);
        assert_eq!(merge_block(&block), block);
    }
}
