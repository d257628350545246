//! Rate rule collection.
//!
//! `@rate: minute hour day` on an rpc contributes a rule keyed by the
//! service route prefix plus the method path. Malformed rate lines are
//! soft failures: logged and skipped.

use tracing::warn;

use crate::context::{Context, RateRule};
use crate::directive::{self, Key};
use crate::schema::{Document, NodeId};

/// Collect rate rules from one service's rpcs.
pub fn collect_service(doc: &Document, ctx: &mut Context, service: NodeId) {
    let node = doc.node(service);
    if node.children.is_empty() || node.comment.is_empty() {
        return;
    }

    let prefix = directive::find(&node.comment, Key::RoutePrefix)
        .map(|d| d.value)
        .unwrap_or_default();

    for &child in &node.children {
        let rpc = doc.node(child);
        if rpc.rpc().is_none() || rpc.comment.is_empty() {
            continue;
        }
        let suffix = rpc_path(&rpc.comment);
        for line in &rpc.comment {
            if !directive::mentions(line, Key::Rate) {
                continue;
            }
            let Some(value) = directive::match_value(line, Key::Rate) else {
                warn!(line = %line, "malformed rate rule, skipping");
                continue;
            };
            let mut parts = value.split_whitespace();
            let rule = RateRule {
                minute: parts.next().and_then(|p| p.parse().ok()).unwrap_or_default(),
                hour: parts.next().and_then(|p| p.parse().ok()).unwrap_or_default(),
                day: parts.next().and_then(|p| p.parse().ok()).unwrap_or_default(),
            };
            ctx.add_rate_rule(format!("{prefix}{suffix}"), rule);
        }
    }
}

fn rpc_path(lines: &[String]) -> String {
    for line in lines {
        if let Some(value) = directive::match_value(line, Key::Api) {
            if value.is_empty() {
                continue;
            }
            return if value.starts_with('/') {
                value
            } else {
                format!("/{value}")
            };
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse;

    #[test]
    fn rule_keys_compose_prefix_and_path() {
        let src = r#"
// @route_prefix: /api/member
service MemberAPI {
    // @api: /find
    // @rate: 10 100 1000
    rpc Find (FindReq) returns (FindResp);
}
"#;
        let doc = parse(src).unwrap();
        let mut ctx = Context::new("pkg");
        collect_service(&doc, &mut ctx, doc.roots[0]);

        let rule = &ctx.rate_rules["/api/member/find"];
        assert_eq!(rule.minute, 10);
        assert_eq!(rule.hour, 100);
        assert_eq!(rule.day, 1000);
    }

    #[test]
    fn malformed_rate_lines_are_skipped() {
        let src = r#"
// @route_prefix: /api
service MemberAPI {
    // @rate: 10 100
    rpc Find (FindReq) returns (FindResp);
}
"#;
        let doc = parse(src).unwrap();
        let mut ctx = Context::new("pkg");
        collect_service(&doc, &mut ctx, doc.roots[0]);
        assert!(ctx.rate_rules.is_empty());
    }
}
