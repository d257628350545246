//! Validation tag injection.
//!
//! `@validate:` rules are rewritten into the canonical `@attr:` form.
//! No defaults are ever synthesized; validation is always explicit.

use crate::directive::Key;
use crate::inject::rewrite_first;
use crate::schema::{Document, NodeId};

/// Rewrite validation directives across a message and its nested
/// messages.
pub fn inject_message(doc: &mut Document, msg: NodeId) {
    for child in doc.node(msg).children.clone() {
        let node = doc.node(child);
        if node.field().is_some() {
            if node.comment.is_empty() {
                continue;
            }
            let (lines, _) = rewrite_first(&node.comment, Key::Validate, "validate", false);
            doc.node_mut(child).comment = lines;
        } else if node.is_message() {
            inject_message(doc, child);
        }
    }
}
