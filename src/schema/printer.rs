//! Schema serialization.
//!
//! Produces the canonical textual form of a [`Document`]: four-space
//! indentation, one blank line between top-level declarations. Parsing
//! the printed output yields a structurally identical tree, so print →
//! parse → print is a fixed point even after comment mutation.

use super::ast::{Document, Node, NodeId, NodeKind};

const INDENT: &str = "    ";

/// Render a document back to schema source text.
pub fn print(doc: &Document) -> String {
    let mut out = String::new();

    for line in &doc.head_comments {
        out.push_str("//");
        out.push_str(line);
        out.push('\n');
    }
    if !doc.head_comments.is_empty() {
        out.push('\n');
    }

    if let Some(syntax) = &doc.syntax {
        out.push_str(&format!("syntax = \"{syntax}\";\n\n"));
    }
    if let Some(package) = &doc.package {
        out.push_str(&format!("package {package};\n\n"));
    }
    if !doc.imports.is_empty() {
        for import in &doc.imports {
            out.push_str(&format!("import \"{import}\";\n"));
        }
        out.push('\n');
    }
    if !doc.options.is_empty() {
        for (name, value) in &doc.options {
            out.push_str(&format!("option {name} = \"{value}\";\n"));
        }
        out.push('\n');
    }

    for (i, &root) in doc.roots.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        print_node(doc, root, 0, &mut out);
    }

    out
}

fn push_comment(node: &Node, depth: usize, out: &mut String) {
    for line in &node.comment {
        out.push_str(&INDENT.repeat(depth));
        out.push_str("//");
        out.push_str(line);
        out.push('\n');
    }
}

fn push_inline(node: &Node, out: &mut String) {
    if let Some(inline) = &node.inline_comment {
        out.push_str(" // ");
        out.push_str(inline);
    }
    out.push('\n');
}

fn print_node(doc: &Document, id: NodeId, depth: usize, out: &mut String) {
    let node = doc.node(id);
    let pad = INDENT.repeat(depth);
    push_comment(node, depth, out);

    match &node.kind {
        NodeKind::Message => {
            out.push_str(&format!("{pad}message {} {{\n", node.name));
            for &child in &node.children {
                print_node(doc, child, depth + 1, out);
            }
            out.push_str(&format!("{pad}}}\n"));
        }
        NodeKind::Field(data) => {
            let mut modifier = String::new();
            if data.repeated {
                modifier.push_str("repeated ");
            }
            if data.optional {
                modifier.push_str("optional ");
            }
            out.push_str(&format!(
                "{pad}{modifier}{} {} = {};",
                data.type_name, node.name, data.number
            ));
            push_inline(node, out);
        }
        NodeKind::Enum => {
            out.push_str(&format!("{pad}enum {} {{\n", node.name));
            for &child in &node.children {
                print_node(doc, child, depth + 1, out);
            }
            out.push_str(&format!("{pad}}}\n"));
        }
        NodeKind::EnumValue(number) => {
            out.push_str(&format!("{pad}{} = {number};", node.name));
            push_inline(node, out);
        }
        NodeKind::Service => {
            out.push_str(&format!("{pad}service {} {{\n", node.name));
            for &child in &node.children {
                print_node(doc, child, depth + 1, out);
            }
            out.push_str(&format!("{pad}}}\n"));
        }
        NodeKind::Rpc(data) => {
            out.push_str(&format!(
                "{pad}rpc {} ({}) returns ({});",
                node.name, data.request, data.response
            ));
            push_inline(node, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::parser::parse;
    use super::*;

    const SAMPLE: &str = r#"// banner

syntax = "proto3";

package member.api;

option crate_path = "crate::pb";

// profile model
// @model: true
message ModelProfile {
    // @store: ignore
    string nickname = 1; // display name
    repeated Tag tags = 2;
    message Tag {
        string label = 1;
    }
}

service MemberAPI {
    // @desc: fetch one member
    rpc Find (FindReq) returns (FindResp);
}
"#;

    #[test]
    fn print_parse_print_is_a_fixed_point() {
        let doc = parse(SAMPLE).unwrap();
        let once = print(&doc);
        let again = print(&parse(&once).unwrap());
        assert_eq!(once, again);
    }

    #[test]
    fn canonical_form_matches_input_layout() {
        let doc = parse(SAMPLE).unwrap();
        assert_eq!(print(&doc), SAMPLE);
    }

    #[test]
    fn structural_round_trip_survives_comment_mutation() {
        let mut doc = parse(SAMPLE).unwrap();
        let service = doc.roots[1];
        let rpc = doc.node(service).children[0];
        doc.node_mut(rpc).comment.push(" @error:".to_string());
        doc.node_mut(rpc).comment.push(" \tNOT_FOUND".to_string());

        let reparsed = parse(&print(&doc)).unwrap();
        let rpc_again = reparsed.node(reparsed.node(reparsed.roots[1]).children[0]);
        assert_eq!(
            rpc_again.comment,
            vec![
                " @desc: fetch one member".to_string(),
                " @error:".to_string(),
                " \tNOT_FOUND".to_string(),
            ]
        );
    }
}
