//! Storage tag injection.
//!
//! Model messages (and messages that opt in with `@store: true`) get a
//! storage tag on every field: an explicit `@store:` directive is
//! rewritten in place, the `ignore` sentinel suppresses injection, and
//! absent directives synthesize a snake_case default honoring the
//! `Id`/`ID` -> `_id` identity rule. Embedded message types are recursed
//! into via nearest-enclosing scope resolution.

use std::collections::HashSet;

use crate::context::{Context, FieldRecord};
use crate::directive::{self, Key};
use crate::inject::{default_line, rewrite_first, Outcome};
use crate::naming;
use crate::schema::{Document, NodeId};
use crate::scope;

/// Run storage injection over every registered model message.
pub fn inject_models(doc: &mut Document, ctx: &mut Context) {
    let mut visited = HashSet::new();
    for (_, id) in ctx.models.clone() {
        inject_message(doc, ctx, id, true, true, &mut visited);
    }
}

/// Run storage injection over top-level messages that opted in with
/// `@store: true`. These contribute tags but no model metadata.
pub fn inject_open_messages(doc: &mut Document, ctx: &mut Context) {
    let mut visited = HashSet::new();
    for id in doc.roots_where(|n| n.is_message()) {
        inject_if_open(doc, ctx, id, &mut visited);
    }
}

fn inject_if_open(
    doc: &mut Document,
    ctx: &mut Context,
    msg: NodeId,
    visited: &mut HashSet<NodeId>,
) {
    let opted_in = doc
        .node(msg)
        .comment
        .iter()
        .any(|line| directive::match_value(line, Key::Store).as_deref() == Some("true"));
    if opted_in {
        inject_message(doc, ctx, msg, false, false, visited);
    } else {
        for child in doc.node(msg).children.clone() {
            if doc.node(child).is_message() {
                inject_if_open(doc, ctx, child, visited);
            }
        }
    }
}

fn inject_message(
    doc: &mut Document,
    ctx: &mut Context,
    msg: NodeId,
    record: bool,
    model_rooted: bool,
    visited: &mut HashSet<NodeId>,
) {
    if !visited.insert(msg) {
        return;
    }

    for child in doc.node(msg).children.clone() {
        let node = doc.node(child);
        if let Some(data) = node.field() {
            let type_name = data.type_name.clone();
            inject_field(doc, ctx, msg, child, record);

            if !scope::is_builtin_type(&type_name) {
                if let Some(resolved) = scope::resolve_type(doc, ctx, msg, &type_name, model_rooted)
                {
                    inject_message(doc, ctx, resolved, record, model_rooted, visited);
                }
            }
        } else if node.is_message() {
            inject_message(doc, ctx, child, record, model_rooted, visited);
        }
    }
}

fn inject_field(doc: &mut Document, ctx: &mut Context, msg: NodeId, field: NodeId, record: bool) {
    let field_name = naming::to_title(&doc.node(field).name);
    let raw_name = doc.node(field).name.clone();
    let inline = doc
        .node(field)
        .inline_comment
        .clone()
        .unwrap_or_default();

    let mut path: Vec<String> = scope::outer_scope_path(doc, msg)
        .iter()
        .map(|n| naming::to_upper_camel(n))
        .collect();
    path.push(naming::to_upper_camel(&field_name));
    let prefix = path.join("_");
    let model = model_name(doc, msg);

    let lines = doc.node(field).comment.clone();
    let (mut lines, outcome) = rewrite_first(&lines, Key::Store, "store", true);

    let value = match outcome {
        Outcome::Explicit(value) => value,
        Outcome::Ignored => raw_name,
        Outcome::Absent => {
            let default = naming::storage_snake(&field_name);
            lines.push(default_line("store", &default));
            default
        }
    };
    doc.node_mut(field).comment = lines;

    if record {
        ctx.add_storage_tag(prefix.clone(), value.clone());
        ctx.add_model_field(
            &model,
            &prefix,
            FieldRecord {
                struct_field: naming::to_upper_camel(&field_name),
                storage_field: value,
                comment: inline.trim().to_string(),
            },
        );
    }
}

/// Name of the outermost message enclosing `id` (the model owner).
fn model_name(doc: &Document, id: NodeId) -> String {
    match doc.node(id).parent {
        Some(parent) if doc.node(parent).is_message() => model_name(doc, parent),
        _ => doc.node(id).name.clone(),
    }
}
