//! Error-code catalog and label resolution.
//!
//! The enum named `ErrCode` defines the document's error taxonomy. Each
//! value contributes a catalog entry whose message falls back to the
//! value name when no inline comment exists. `@error:` blocks on rpc
//! comments carry bare labels that resolve against the catalog; labels
//! that stay unresolved are kept as foreign entries assumed to be fully
//! qualified already.

use serde::Serialize;

use crate::context::{Context, ErrCodeInfo, ERR_CODE_ENUM};
use crate::schema::{Document, NodeId, NodeKind};

/// Collect the error-code catalog from an enum node, if it is the
/// dedicated `ErrCode` definition.
pub fn collect_enum(doc: &Document, ctx: &mut Context, id: NodeId) {
    let node = doc.node(id);
    if node.name != ERR_CODE_ENUM {
        return;
    }
    let package = ctx.package_name.clone();
    for &child in &node.children {
        let value = doc.node(child);
        let NodeKind::EnumValue(code) = &value.kind else {
            continue;
        };
        let code = *code;
        let message = value
            .inline_comment
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| value.name.clone());
        ctx.add_err_code(code, &value.name, &message);
        ctx.add_catalog_entry(
            format!("{package}.{}", value.name),
            ErrCodeInfo {
                code,
                name: value.name.clone(),
                message,
            },
        );
    }
}

/// Bare labels of the first `@error:` block in a comment. The block
/// runs from the label line to the next directive marker or block end.
pub fn pending_labels(lines: &[String]) -> Vec<String> {
    let Some(start) = lines.iter().position(|l| l.contains("@error")) else {
        return Vec::new();
    };
    let mut labels = Vec::new();
    for line in &lines[start + 1..] {
        if line.contains('@') {
            break;
        }
        let label = line.trim();
        if !label.is_empty() {
            labels.push(label.to_string());
        }
    }
    labels
}

/// A label resolved against the catalog, or retained as foreign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLabel {
    pub label: String,
    pub code: i64,
    pub message: String,
    pub foreign: bool,
}

/// Resolve pending labels. Bare labels are qualified with the schema
/// package before the catalog lookup.
pub fn resolve_labels(ctx: &Context, labels: &[String]) -> Vec<ResolvedLabel> {
    labels
        .iter()
        .map(|label| {
            if label.contains('.') {
                return ResolvedLabel {
                    label: label.clone(),
                    code: 0,
                    message: String::new(),
                    foreign: true,
                };
            }
            let qualified = format!("{}.{label}", ctx.package_name);
            match ctx.err_catalog.get(&qualified) {
                Some(entry) => ResolvedLabel {
                    label: label.clone(),
                    code: entry.code,
                    message: entry.message.clone(),
                    foreign: false,
                },
                None => ResolvedLabel {
                    label: label.clone(),
                    code: 0,
                    message: String::new(),
                    foreign: true,
                },
            }
        })
        .collect()
}
