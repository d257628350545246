//! Error-label synchronization.
//!
//! Writes extracted error facts back into an rpc's schema comment. The
//! first `@error:` block (label line plus following non-directive
//! lines) is removed, comment lines before the label and any later
//! directives are preserved, and a fresh block is appended at the end.
//! Re-running against an unchanged target file reproduces the block
//! byte for byte.

use crate::directive::{self, Key};
use crate::schema::{Document, NodeId};

/// Replace the rpc's `@error:` block with `codes`, one line per fact.
pub fn sync_method_errors(doc: &mut Document, rpc: NodeId, codes: &[String]) {
    let mut lines = doc.node(rpc).comment.clone();

    if let Some(start) = lines
        .iter()
        .position(|line| directive::mentions(line, Key::Error))
    {
        let mut rebuilt: Vec<String> = lines[..start].to_vec();
        let mut rest = start + 1;
        while rest < lines.len() && !lines[rest].contains('@') {
            rest += 1;
        }
        rebuilt.extend_from_slice(&lines[rest..]);
        lines = rebuilt;
    }

    lines.push(" @error:".to_string());
    for code in codes {
        lines.push(format!(" \t{code}"));
    }
    doc.node_mut(rpc).comment = lines;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::schema::parse;

    fn doc_with_rpc(comment: &[&str]) -> (Document, NodeId) {
        let mut doc = parse(
            r#"
service MemberAPI {
    rpc Find (FindReq) returns (FindResp);
}
"#,
        )
        .unwrap();
        let rpc = doc.node(doc.roots[0]).children[0];
        doc.node_mut(rpc).comment = comment.iter().map(|s| s.to_string()).collect();
        (doc, rpc)
    }

    #[test]
    fn fresh_block_is_appended_when_no_label_exists() {
        let (mut doc, rpc) = doc_with_rpc(&[" @desc: find a member"]);
        sync_method_errors(&mut doc, rpc, &["NOT_FOUND".to_string()]);
        assert_eq!(
            doc.node(rpc).comment,
            vec![
                " @desc: find a member".to_string(),
                " @error:".to_string(),
                " \tNOT_FOUND".to_string(),
            ]
        );
    }

    #[test]
    fn stale_entries_are_replaced_not_accumulated() {
        let (mut doc, rpc) = doc_with_rpc(&[
            " @desc: find a member",
            " @error:",
            " \tSTALE_CODE",
            " \tother.OLD",
            " @author: sam",
        ]);
        sync_method_errors(
            &mut doc,
            rpc,
            &["BAD_INPUT".to_string(), "errpkg.NOT_FOUND".to_string()],
        );
        assert_eq!(
            doc.node(rpc).comment,
            vec![
                " @desc: find a member".to_string(),
                " @author: sam".to_string(),
                " @error:".to_string(),
                " \tBAD_INPUT".to_string(),
                " \terrpkg.NOT_FOUND".to_string(),
            ]
        );
    }

    #[test]
    fn syncing_twice_with_the_same_facts_is_stable() {
        let (mut doc, rpc) = doc_with_rpc(&[" @desc: find"]);
        let codes = vec!["BAD_INPUT".to_string(), "errpkg.NOT_FOUND".to_string()];
        sync_method_errors(&mut doc, rpc, &codes);
        let once = doc.node(rpc).comment.clone();
        sync_method_errors(&mut doc, rpc, &codes);
        assert_eq!(doc.node(rpc).comment, once);
    }

    #[test]
    fn empty_comment_gains_only_the_block() {
        let (mut doc, rpc) = doc_with_rpc(&[]);
        sync_method_errors(&mut doc, rpc, &["X".to_string()]);
        assert_eq!(
            doc.node(rpc).comment,
            vec![" @error:".to_string(), " \tX".to_string()]
        );
    }
}
