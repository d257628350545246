//! Scheduled task collection.
//!
//! A service marked `@task: true` defines one task per rpc. Per-rpc
//! directives `@schedule:`, `@times:`, `@range: start end` and
//! `@kind:` fill in the task node; missing directives leave zero
//! values, matching a perpetual task.

use crate::context::{Context, TaskNode};
use crate::directive::{self, Key};
use crate::schema::{Document, NodeId};

/// Collect the task table of a `@task: true` service.
pub fn collect_service(doc: &Document, ctx: &mut Context, service: NodeId) {
    let node = doc.node(service);
    if node.comment.is_empty() || !directive::flag(&node.comment, Key::Task) {
        return;
    }

    let emit_to = directive::find(&node.comment, Key::EmitTo)
        .map(|d| d.value)
        .unwrap_or_default();

    for &child in &node.children {
        let rpc = doc.node(child);
        if rpc.rpc().is_none() || rpc.comment.is_empty() {
            continue;
        }
        let task = parse_task(&rpc.comment);
        ctx.add_task(&node.name, &rpc.name, &emit_to, task);
    }
}

fn parse_task(lines: &[String]) -> TaskNode {
    let mut task = TaskNode::default();
    for line in lines {
        if let Some(value) = directive::match_value(line, Key::Desc) {
            task.describe = value;
            continue;
        }
        if let Some(value) = directive::match_value(line, Key::Schedule) {
            task.spec = value;
            continue;
        }
        if let Some(value) = directive::match_value(line, Key::Times) {
            task.times = value.parse().unwrap_or_default();
            continue;
        }
        if let Some(value) = directive::match_value(line, Key::Range) {
            let mut parts = value.split_whitespace();
            task.range_start = parts.next().and_then(|p| p.parse().ok()).unwrap_or_default();
            task.range_end = parts.next().and_then(|p| p.parse().ok()).unwrap_or_default();
            continue;
        }
        if let Some(value) = directive::match_value(line, Key::Kind) {
            task.kind = value.parse().unwrap_or_default();
        }
    }
    task
}
