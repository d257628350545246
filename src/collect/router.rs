//! Route group collection.
//!
//! A service is a route group when its name ends in `API` or its
//! comment block carries `@route_group: true`. Each rpc becomes a
//! [`RouterMethod`]; a method lacking explicit `@method:`/`@api:`
//! directives receives the defaults POST and `/` + snake_case name.

use crate::context::{Context, RouterMethod, RouterRecord, API_GROUP_SUFFIX, DEFAULT_EMIT_TO};
use crate::directive::{self, Key};
use crate::naming;
use crate::schema::{Document, NodeId};

const DEFAULT_AUTHOR: &str = "anonymous";
const DEFAULT_DESCRIBE: &str = "no description";

/// Recognized HTTP methods; anything else keeps the default.
const HTTP_METHODS: [&str; 7] = ["GET", "POST", "DELETE", "PATCH", "OPTIONS", "PUT", "ANY"];

/// True when the service's declarations mark it as a route group.
pub fn is_route_group(doc: &Document, service: NodeId) -> bool {
    let node = doc.node(service);
    if node.name.ends_with(API_GROUP_SUFFIX) {
        return true;
    }
    for line in &node.comment {
        if let Some(value) = directive::match_value(line, Key::RouteGroup) {
            return value == "true";
        }
    }
    false
}

/// Collect a service into the router table when it is a route group.
pub fn collect_service(doc: &Document, ctx: &mut Context, service: NodeId) {
    if !is_route_group(doc, service) {
        return;
    }
    let record = build_record(doc, ctx, service);
    ctx.add_router_group(&doc.node(service).name, record);
}

fn build_record(doc: &Document, ctx: &mut Context, service: NodeId) -> RouterRecord {
    let node = doc.node(service);
    let mut prefix = String::new();
    let mut emit_to = DEFAULT_EMIT_TO.to_string();
    let mut middlewares = Vec::new();

    for line in &node.comment {
        if let Some(value) = directive::match_value(line, Key::RoutePrefix) {
            prefix = value;
            continue;
        }
        if let Some(value) = directive::match_value(line, Key::EmitTo) {
            emit_to = value;
            continue;
        }
        if directive::mentions(line, Key::Middleware) {
            let spec = directive::middleware_spec(line);
            ctx.add_router_imports(&spec);
            middlewares = spec.entries;
        }
    }

    let mut methods = Vec::new();
    for &child in &node.children {
        let rpc = doc.node(child);
        if let Some(data) = rpc.rpc() {
            methods.push(build_method(ctx, child, rpc, data));
        }
    }

    RouterRecord {
        prefix,
        emit_to,
        middlewares,
        methods,
    }
}

fn build_method(
    ctx: &mut Context,
    rpc_id: NodeId,
    rpc: &crate::schema::Node,
    data: &crate::schema::RpcData,
) -> RouterMethod {
    let mut method = RouterMethod {
        func_name: rpc.name.clone(),
        fn_name: naming::to_snake(&rpc.name),
        path: format!("/{}", naming::to_snake(&rpc.name)),
        http_method: "POST".to_string(),
        author: DEFAULT_AUTHOR.to_string(),
        describe: DEFAULT_DESCRIBE.to_string(),
        request: data.request.clone(),
        response: data.response.clone(),
        middlewares: Vec::new(),
        rpc: rpc_id,
    };

    for line in &rpc.comment {
        if let Some(value) = directive::match_value(line, Key::Author) {
            if !value.is_empty() {
                method.author = value;
            }
            continue;
        }
        if let Some(value) = directive::match_value(line, Key::Desc) {
            if !value.is_empty() {
                method.describe = value;
            }
            continue;
        }
        if let Some(value) = directive::match_value(line, Key::Method) {
            let upper = value.to_uppercase();
            if HTTP_METHODS.contains(&upper.as_str()) {
                method.http_method = upper;
            }
            continue;
        }
        if let Some(value) = directive::match_value(line, Key::Api) {
            if !value.is_empty() {
                method.path = if value.starts_with('/') {
                    value
                } else {
                    format!("/{value}")
                };
            }
            continue;
        }
        if directive::mentions(line, Key::Middleware) {
            let spec = directive::middleware_spec(line);
            ctx.add_router_imports(&spec);
            method.middlewares = spec.entries;
        }
    }

    method
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse;

    fn collect(src: &str) -> Context {
        let doc = parse(src).unwrap();
        let mut ctx = Context::new("pkg");
        for &root in &doc.roots {
            if doc.node(root).kind == crate::schema::NodeKind::Service {
                collect_service(&doc, &mut ctx, root);
            }
        }
        ctx
    }

    #[test]
    fn method_without_directives_gets_post_and_snake_path() {
        let ctx = collect(
            r#"
service MemberAPI {
    rpc Find (FindReq) returns (FindResp);
}
"#,
        );
        let record = &ctx.routers["MemberAPI"];
        let method = &record.methods[0];
        assert_eq!(method.http_method, "POST");
        assert_eq!(method.path, "/find");
        assert_eq!(method.fn_name, "find");
        assert_eq!(method.author, "anonymous");
    }

    #[test]
    fn explicit_directives_override_defaults() {
        let ctx = collect(
            r#"
// @route_group: true
// @route_prefix: /api/member
// @emit_to: src/handler/member.rs
// @middleware: crate::middleware::auth[check]
service Member {
    // @desc: fetch one member
    // @author: sam
    // @method: get
    // @api: detail
    rpc FetchDetail (FetchReq) returns (FetchResp);
}
"#,
        );
        let record = &ctx.routers["Member"];
        assert_eq!(record.prefix, "/api/member");
        assert_eq!(record.emit_to, "src/handler/member.rs");
        assert_eq!(record.middlewares, vec!["auth::check".to_string()]);

        let method = &record.methods[0];
        assert_eq!(method.http_method, "GET");
        assert_eq!(method.path, "/detail");
        assert_eq!(method.describe, "fetch one member");
        assert_eq!(method.author, "sam");
    }

    #[test]
    fn non_route_services_are_skipped() {
        let ctx = collect(
            r#"
service Worker {
    rpc Run (RunReq) returns (RunResp);
}
"#,
        );
        assert!(ctx.routers.is_empty());
    }

    #[test]
    fn unknown_http_method_keeps_the_default() {
        let ctx = collect(
            r#"
service MemberAPI {
    // @method: FETCH
    rpc Find (FindReq) returns (FindResp);
}
"#,
        );
        assert_eq!(ctx.routers["MemberAPI"].methods[0].http_method, "POST");
    }
}
