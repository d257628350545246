//! Schema mutation commands.
//!
//! `add route`, `add svc`, `add api`, `add rpc` and `add task` append
//! new declarations (with their directive scaffolds) to an existing
//! schema document and serialize it back in canonical form. Duplicate
//! names abort before anything is written.

use std::path::PathBuf;

use console::style;

use crate::collect::router;
use crate::context::{REQ_SUFFIX, RESP_SUFFIX};
use crate::error::{Result, SyncError};
use crate::naming;
use crate::schema::{self, Document, Node, NodeId, NodeKind, RpcData};

#[derive(Debug)]
pub struct AddRouteOptions {
    pub file: PathBuf,
    pub name: String,
    pub prefix: String,
    pub emit_to: String,
}

#[derive(Debug)]
pub struct AddSvcOptions {
    pub file: PathBuf,
    pub name: String,
    pub emit_to: String,
}

#[derive(Debug)]
pub struct AddApiOptions {
    pub file: PathBuf,
    pub group: String,
    pub name: String,
    pub method: Option<String>,
}

#[derive(Debug)]
pub struct AddRpcOptions {
    pub file: PathBuf,
    pub service: String,
    pub name: String,
}

#[derive(Debug)]
pub struct AddTaskOptions {
    pub file: PathBuf,
    pub service: String,
    pub name: String,
    pub emit_to: String,
}

fn find_service(doc: &Document, name: &str) -> Option<NodeId> {
    doc.roots
        .iter()
        .copied()
        .find(|&id| doc.node(id).kind == NodeKind::Service && doc.node(id).name == name)
}

fn find_rpc(doc: &Document, service: NodeId, name: &str) -> Option<NodeId> {
    doc.node(service)
        .children
        .iter()
        .copied()
        .find(|&id| doc.node(id).rpc().is_some() && doc.node(id).name == name)
}

/// Append `<base>Req` / `<base>Resp` message declarations.
fn push_req_resp(doc: &mut Document, base: &str) {
    let req = doc.alloc(Node::new(format!("{base}{REQ_SUFFIX}"), NodeKind::Message));
    doc.add_root(req);
    let resp = doc.alloc(Node::new(format!("{base}{RESP_SUFFIX}"), NodeKind::Message));
    doc.add_root(resp);
}

fn push_rpc(doc: &mut Document, service: NodeId, name: &str, comment: Vec<String>) {
    let mut node = Node::new(
        name,
        NodeKind::Rpc(RpcData {
            request: format!("{name}{REQ_SUFFIX}"),
            response: format!("{name}{RESP_SUFFIX}"),
        }),
    );
    node.comment = comment;
    let id = doc.alloc(node);
    doc.add_child(service, id);
}

/// Append a route-group service with its marker directives.
pub fn execute_add_route(options: AddRouteOptions) -> Result<()> {
    let mut doc = schema::parse_file(&options.file)?;
    if find_service(&doc, &options.name).is_some() {
        return Err(SyncError::ServiceExists(options.name));
    }

    let mut node = Node::new(&options.name, NodeKind::Service);
    node.comment = vec![
        " @route_group: true".to_string(),
        format!(" @route_prefix: {}", options.prefix),
        format!(" @emit_to: {}", options.emit_to),
        " @middleware: ".to_string(),
    ];
    let id = doc.alloc(node);
    doc.add_root(id);

    schema::write_file(&options.file, &doc)?;
    println!("{} route group {}", style("added").green().bold(), options.name);
    Ok(())
}

/// Append a plain service marked for rpc generation.
pub fn execute_add_svc(options: AddSvcOptions) -> Result<()> {
    let mut doc = schema::parse_file(&options.file)?;
    if find_service(&doc, &options.name).is_some() {
        return Err(SyncError::ServiceExists(options.name));
    }

    let mut node = Node::new(&options.name, NodeKind::Service);
    node.comment = vec![
        " @desc: ".to_string(),
        " @service_gen: true".to_string(),
        format!(" @emit_to: {}", options.emit_to),
    ];
    let id = doc.alloc(node);
    doc.add_root(id);

    schema::write_file(&options.file, &doc)?;
    println!("{} service {}", style("added").green().bold(), options.name);
    Ok(())
}

/// Append an rpc (plus request/response messages) to a route group,
/// with default verb/path directives filled in.
pub fn execute_add_api(options: AddApiOptions) -> Result<()> {
    let mut doc = schema::parse_file(&options.file)?;
    let service = find_service(&doc, &options.group)
        .filter(|&id| router::is_route_group(&doc, id))
        .ok_or_else(|| SyncError::ServiceNotFound(options.group.clone()))?;
    if find_rpc(&doc, service, &options.name).is_some() {
        return Err(SyncError::RpcExists(options.name));
    }

    let method = options
        .method
        .filter(|m| !m.is_empty())
        .map(|m| m.to_uppercase())
        .unwrap_or_else(|| "POST".to_string());
    let comment = vec![
        " @desc: ".to_string(),
        " @author: ".to_string(),
        format!(" @method: {method}"),
        format!(" @api: /{}", naming::to_snake(&options.name)),
        " @middleware: ".to_string(),
    ];
    push_rpc(&mut doc, service, &options.name, comment);
    push_req_resp(&mut doc, &options.name);

    schema::write_file(&options.file, &doc)?;
    println!("{} api {}", style("added").green().bold(), options.name);
    Ok(())
}

/// Append an rpc (plus request/response messages) to any service.
pub fn execute_add_rpc(options: AddRpcOptions) -> Result<()> {
    let mut doc = schema::parse_file(&options.file)?;
    let service = find_service(&doc, &options.service)
        .ok_or_else(|| SyncError::ServiceNotFound(options.service.clone()))?;
    if find_rpc(&doc, service, &options.name).is_some() {
        return Err(SyncError::RpcExists(options.name));
    }

    let comment = vec![" @desc:".to_string(), " @author:".to_string()];
    push_rpc(&mut doc, service, &options.name, comment);
    push_req_resp(&mut doc, &options.name);

    schema::write_file(&options.file, &doc)?;
    println!("{} rpc {}", style("added").green().bold(), options.name);
    Ok(())
}

/// Append a task rpc with a commented directive scaffold, creating the
/// task service first when it does not exist yet.
pub fn execute_add_task(options: AddTaskOptions) -> Result<()> {
    let mut doc = schema::parse_file(&options.file)?;

    let service = match find_service(&doc, &options.service) {
        Some(id) => id,
        None => {
            let mut node = Node::new(&options.service, NodeKind::Service);
            node.comment = vec![
                " @task: true".to_string(),
                format!(" @emit_to: {}", options.emit_to),
            ];
            let id = doc.alloc(node);
            doc.add_root(id);
            id
        }
    };

    if find_rpc(&doc, service, &options.name).is_some() {
        return Err(SyncError::TaskExists(options.name));
    }

    let comment = vec![
        " @desc: ".to_string(),
        " \tschedule spec: minute hour day".to_string(),
        " @schedule: 1 * *".to_string(),
        " \texecution count".to_string(),
        " @times: 10".to_string(),
        " \texecution window as epoch seconds: start end".to_string(),
        " @range: 1640966400 1956499200".to_string(),
        " \ttask kind: 0 perpetual, 1 time-ranged, 2 counted".to_string(),
        " @kind: 0".to_string(),
    ];
    push_rpc(&mut doc, service, &options.name, comment);
    push_req_resp(&mut doc, &options.name);

    schema::write_file(&options.file, &doc)?;
    println!("{} task {}", style("added").green().bold(), options.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::schema::parse;

    fn write_schema(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("member.proto");
        std::fs::write(&path, content).unwrap();
        path
    }

    const BASE: &str = "syntax = \"proto3\";\n\npackage member.api;\n";

    #[test]
    fn add_route_appends_marker_directives() {
        let dir = TempDir::new().unwrap();
        let file = write_schema(&dir, BASE);
        execute_add_route(AddRouteOptions {
            file: file.clone(),
            name: "MemberAPI".to_string(),
            prefix: "/api/member".to_string(),
            emit_to: "src/handler/member.rs".to_string(),
        })
        .unwrap();

        let doc = parse(&std::fs::read_to_string(&file).unwrap()).unwrap();
        let service = find_service(&doc, "MemberAPI").unwrap();
        assert!(doc
            .node(service)
            .comment
            .contains(&" @route_group: true".to_string()));
        assert!(doc
            .node(service)
            .comment
            .contains(&" @route_prefix: /api/member".to_string()));
    }

    #[test]
    fn add_route_rejects_duplicates() {
        let dir = TempDir::new().unwrap();
        let file = write_schema(&dir, "service MemberAPI {\n}\n");
        let err = execute_add_route(AddRouteOptions {
            file,
            name: "MemberAPI".to_string(),
            prefix: "/api".to_string(),
            emit_to: "src/handler.rs".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, SyncError::ServiceExists(_)));
    }

    #[test]
    fn add_api_fills_default_method_and_path() {
        let dir = TempDir::new().unwrap();
        let file = write_schema(&dir, "// @route_group: true\nservice Member {\n}\n");
        execute_add_api(AddApiOptions {
            file: file.clone(),
            group: "Member".to_string(),
            name: "FetchDetail".to_string(),
            method: None,
        })
        .unwrap();

        let content = std::fs::read_to_string(&file).unwrap();
        assert!(content.contains("rpc FetchDetail (FetchDetailReq) returns (FetchDetailResp);"));
        assert!(content.contains("// @method: POST"));
        assert!(content.contains("// @api: /fetch_detail"));
        assert!(content.contains("message FetchDetailReq {"));
        assert!(content.contains("message FetchDetailResp {"));
    }

    #[test]
    fn add_api_requires_a_route_group() {
        let dir = TempDir::new().unwrap();
        let file = write_schema(&dir, "service Plain {\n}\n");
        let err = execute_add_api(AddApiOptions {
            file,
            group: "Plain".to_string(),
            name: "Find".to_string(),
            method: None,
        })
        .unwrap_err();
        assert!(matches!(err, SyncError::ServiceNotFound(_)));
    }

    #[test]
    fn add_task_creates_the_service_then_rejects_duplicates() {
        let dir = TempDir::new().unwrap();
        let file = write_schema(&dir, BASE);
        let options = || AddTaskOptions {
            file: file.clone(),
            service: "CleanupTask".to_string(),
            name: "PurgeSessions".to_string(),
            emit_to: "src/tasks/cleanup.rs".to_string(),
        };
        execute_add_task(options()).unwrap();

        let content = std::fs::read_to_string(&file).unwrap();
        assert!(content.contains("// @task: true"));
        assert!(content.contains("// @schedule: 1 * *"));
        assert!(content.contains("rpc PurgeSessions (PurgeSessionsReq) returns (PurgeSessionsResp);"));

        let err = execute_add_task(options()).unwrap_err();
        assert!(matches!(err, SyncError::TaskExists(_)));
        // the duplicate attempt left the document unchanged
        assert_eq!(content, std::fs::read_to_string(&file).unwrap());
    }
}
