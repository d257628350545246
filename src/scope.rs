//! Scope-sensitive type resolution.
//!
//! Nested message names are disambiguated with composite keys joining
//! the ancestor chain with `_` (`ModelUser_Profile_Tag`). Resolution of
//! a field's non-primitive type probes the enclosing scopes deepest
//! first, then falls back to the bare name; an unresolved type is an
//! opaque embedded type, skipped from propagation and only logged.

use tracing::debug;

use crate::context::{Context, MODEL_PREFIX};
use crate::schema::{Document, NodeId};

/// Built-in scalar type names that never resolve to a message.
pub fn is_builtin_type(type_name: &str) -> bool {
    matches!(
        type_name,
        "string"
            | "uint32"
            | "uint64"
            | "int32"
            | "int64"
            | "sint32"
            | "sint64"
            | "fixed32"
            | "fixed64"
            | "sfixed32"
            | "sfixed64"
            | "bool"
            | "bytes"
            | "float"
            | "double"
    )
}

/// Ancestor-name chain from the document root down to `id`, inclusive.
pub fn outer_scope_path(doc: &Document, id: NodeId) -> Vec<String> {
    let mut path: Vec<String> = doc
        .ancestors(id)
        .into_iter()
        .map(|a| doc.node(a).name.clone())
        .collect();
    path.push(doc.node(id).name.clone());
    path
}

/// Ancestor-name chain from the nearest model root down to `id`,
/// inclusive. A chain with no model root resolves from the innermost
/// message only.
pub fn model_scope_path(doc: &Document, id: NodeId) -> Vec<String> {
    let node = doc.node(id);
    if node.name.starts_with(MODEL_PREFIX) {
        return vec![node.name.clone()];
    }
    match node.parent {
        Some(parent) if doc.node(parent).is_message() => {
            let mut path = model_scope_path(doc, parent);
            path.push(node.name.clone());
            path
        }
        _ => Vec::new(),
    }
}

/// Composite registry key for a node (`A_B_C`).
pub fn registry_key(doc: &Document, id: NodeId) -> String {
    outer_scope_path(doc, id).join("_")
}

/// Populate the global type registry with every message in the tree,
/// keyed by its composite path.
pub fn register_types(doc: &Document, ctx: &mut Context) {
    doc.walk(&mut |id, node| {
        if node.is_message() {
            ctx.register_type(registry_key(doc, id), id);
        }
    });
}

/// Resolve `type_name` declared on a field of `enclosing`, preferring
/// the nearest enclosing scope. Returns `None` for opaque types.
pub fn resolve_type(
    doc: &Document,
    ctx: &Context,
    enclosing: NodeId,
    type_name: &str,
    model_rooted: bool,
) -> Option<NodeId> {
    let path = if model_rooted {
        model_scope_path(doc, enclosing)
    } else {
        outer_scope_path(doc, enclosing)
    };

    let mut prefix = String::new();
    let mut candidates = Vec::with_capacity(path.len());
    for name in &path {
        if !prefix.is_empty() {
            prefix.push('_');
        }
        prefix.push_str(name);
        candidates.push(format!("{prefix}_{type_name}"));
    }

    for candidate in candidates.iter().rev() {
        if let Some(&id) = ctx.type_registry.get(candidate) {
            return Some(id);
        }
    }

    if let Some(&id) = ctx.type_registry.get(type_name) {
        return Some(id);
    }

    debug!(
        enclosing = %doc.node(enclosing).name,
        type_name,
        "unresolved embedded type, skipping propagation"
    );
    None
}
