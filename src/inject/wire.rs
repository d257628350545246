//! Wire tag injection.
//!
//! The wire naming style is chosen per message with `@wire_style:`;
//! the default is `raw`, which only rewrites explicit `@wire:`
//! directives and never synthesizes a value. Non-raw styles synthesize
//! a style-converted default for fields without an explicit directive.
//! Nested messages inherit the enclosing message's style.

use crate::directive::{self, Key};
use crate::inject::{default_line, rewrite_first, Outcome};
use crate::naming::Style;
use crate::schema::{Document, NodeId};

/// Inject wire tags over a top-level message and its nested messages.
pub fn inject_message(doc: &mut Document, msg: NodeId) {
    let style = message_style(doc, msg);
    inject_by_style(doc, msg, style);
}

fn message_style(doc: &Document, msg: NodeId) -> Style {
    for line in &doc.node(msg).comment {
        if let Some(value) = directive::match_value(line, Key::WireStyle) {
            return Style::parse(&value);
        }
    }
    Style::Raw
}

fn inject_by_style(doc: &mut Document, msg: NodeId, style: Style) {
    for child in doc.node(msg).children.clone() {
        let node = doc.node(child);
        if node.field().is_some() {
            inject_field(doc, child, style);
        } else if node.is_message() {
            inject_by_style(doc, child, style);
        }
    }
}

fn inject_field(doc: &mut Document, field: NodeId, style: Style) {
    let lines = doc.node(field).comment.clone();
    if style == Style::Raw && lines.is_empty() {
        return;
    }

    let (mut lines, outcome) = rewrite_first(&lines, Key::Wire, "wire", false);
    if outcome == Outcome::Absent {
        let name = doc.node(field).name.clone();
        if let Some(default) = style.convert(&name) {
            lines.push(default_line("wire", &default));
        }
    }
    doc.node_mut(field).comment = lines;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse;

    #[test]
    fn raw_style_only_rewrites_explicit_directives() {
        let src = r#"
message FindReq {
    // @wire: uid
    string user_id = 1;
    string untouched = 2;
}
"#;
        let mut doc = parse(src).unwrap();
        let msg = doc.roots[0];
        inject_message(&mut doc, msg);

        let explicit = doc.node(doc.node(msg).children[0]);
        assert_eq!(explicit.comment, vec![" @attr: wire:\"uid\"".to_string()]);
        let untouched = doc.node(doc.node(msg).children[1]);
        assert!(untouched.comment.is_empty());
    }

    #[test]
    fn styled_messages_synthesize_defaults() {
        let src = r#"
// @wire_style: lower_camel
message FindResp {
    string user_name = 1;
    // @wire: explicit_name
    string renamed = 2;
}
"#;
        let mut doc = parse(src).unwrap();
        let msg = doc.roots[0];
        inject_message(&mut doc, msg);

        let defaulted = doc.node(doc.node(msg).children[0]);
        assert_eq!(
            defaulted.comment,
            vec![" @attr: wire:\"userName\"".to_string()]
        );
        let explicit = doc.node(doc.node(msg).children[1]);
        assert_eq!(
            explicit.comment,
            vec![" @attr: wire:\"explicit_name\"".to_string()]
        );
    }

    #[test]
    fn nested_messages_inherit_the_style() {
        let src = r#"
// @wire_style: snake_case
message Outer {
    message Inner {
        string FieldName = 1;
    }
}
"#;
        let mut doc = parse(src).unwrap();
        let root = doc.roots[0];
        inject_message(&mut doc, root);
        let outer = doc.roots[0];
        let inner = doc.node(outer).children[0];
        let field = doc.node(doc.node(inner).children[0]);
        assert_eq!(
            field.comment,
            vec![" @attr: wire:\"field_name\"".to_string()]
        );
    }
}
