//! Implementation reconciliation.
//!
//! Compares a route group's required handler set against the target
//! file's declarations and appends only what is missing. Existing
//! declarations are never touched; all emission is append-at-end in
//! required-method order. Methods already present are registered with
//! the context so the error extractor can harvest their bodies.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde_json::json;
use tracing::{debug, info};

use crate::context::{Context, RouterMethod, RouterRecord};
use crate::error::Result;
use crate::reconcile::inspect::{classify, index_source, ImplState};
use crate::templates::{Renderer, BIND_IMPL, HANDLER_FILE, HANDLER_IMPL};

/// Reconcile one route group against its target file.
pub fn reconcile_target(
    ctx: &mut Context,
    renderer: &Renderer,
    base: &Path,
    service: &str,
    record: &RouterRecord,
    crate_path: Option<&str>,
) -> Result<()> {
    let path = base.join(&record.emit_to);
    let type_name = format!("{service}Impl");

    if !path.exists() {
        let rendered = renderer.render(
            HANDLER_FILE,
            &json!({
                "service": service,
                "type_name": type_name,
                "crate_path": crate_path,
                "imports": ctx.router_imports,
                "methods": record.methods,
            }),
        )?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        append(&path, &rendered)?;
        info!(target_file = %path.display(), service, "created handler scaffold");
        return Ok(());
    }

    let source = std::fs::read_to_string(&path)?;
    let index = index_source(&path, &source)?;

    for method in &record.methods {
        if index.has_method(&type_name, &method.fn_name) {
            ctx.add_implemented_rpc(service, &record.emit_to, &method.fn_name, method.rpc);
        }
    }

    let required: Vec<String> = record.methods.iter().map(|m| m.fn_name.clone()).collect();
    let state = classify(&index, &type_name, &required);
    let has_hook = index.has_lifecycle_hook(&type_name);

    match state {
        ImplState::Absent => {
            let rendered = renderer.render(
                HANDLER_IMPL,
                &json!({
                    "service": service,
                    "type_name": type_name,
                    "declare_type": true,
                    "include_bind": true,
                    "methods": record.methods,
                }),
            )?;
            append(&path, &rendered)?;
            info!(target_file = %path.display(), service, "declared handler type with all methods");
        }
        ImplState::PartialTypeOnly => {
            let rendered = renderer.render(
                HANDLER_IMPL,
                &json!({
                    "service": service,
                    "type_name": type_name,
                    "declare_type": false,
                    "include_bind": !has_hook,
                    "methods": record.methods,
                }),
            )?;
            append(&path, &rendered)?;
            info!(target_file = %path.display(), service, "emitted all missing methods");
        }
        ImplState::PartialMethods(missing) => {
            let stubs: Vec<&RouterMethod> = record
                .methods
                .iter()
                .filter(|m| missing.contains(&m.fn_name))
                .collect();
            let rendered = renderer.render(
                HANDLER_IMPL,
                &json!({
                    "service": service,
                    "type_name": type_name,
                    "declare_type": false,
                    "include_bind": !has_hook,
                    "methods": stubs,
                }),
            )?;
            append(&path, &rendered)?;
            info!(
                target_file = %path.display(),
                service,
                missing = missing.len(),
                "emitted missing method stubs"
            );
        }
        ImplState::Complete => {
            if !has_hook {
                let rendered =
                    renderer.render(BIND_IMPL, &json!({ "type_name": type_name }))?;
                append(&path, &rendered)?;
                info!(target_file = %path.display(), service, "appended lifecycle hook");
            } else {
                debug!(target_file = %path.display(), service, "handler already complete");
            }
        }
    }

    Ok(())
}

fn append(path: &Path, text: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::reconcile::inspect::index_file;

    fn record(methods: &[(&str, &str)]) -> RouterRecord {
        RouterRecord {
            prefix: "/api".to_string(),
            emit_to: "src/handler/member.rs".to_string(),
            middlewares: Vec::new(),
            methods: methods
                .iter()
                .enumerate()
                .map(|(i, (func, snake))| RouterMethod {
                    func_name: func.to_string(),
                    fn_name: snake.to_string(),
                    path: format!("/{snake}"),
                    http_method: "POST".to_string(),
                    author: "anonymous".to_string(),
                    describe: "no description".to_string(),
                    request: format!("{func}Req"),
                    response: format!("{func}Resp"),
                    middlewares: Vec::new(),
                    rpc: i,
                })
                .collect(),
        }
    }

    fn run(dir: &TempDir, existing: Option<&str>, methods: &[(&str, &str)]) -> String {
        let record = record(methods);
        let path = dir.path().join(&record.emit_to);
        if let Some(content) = existing {
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, content).unwrap();
        }
        let mut ctx = Context::new("pkg");
        let renderer = Renderer::new().unwrap();
        reconcile_target(&mut ctx, &renderer, dir.path(), "Member", &record, None).unwrap();
        std::fs::read_to_string(&path).unwrap()
    }

    #[test]
    fn absent_file_gets_the_full_scaffold() {
        let dir = TempDir::new().unwrap();
        let out = run(&dir, None, &[("Create", "create"), ("Delete", "delete")]);
        assert!(out.contains("pub struct MemberImpl;"));
        assert!(out.contains("pub async fn create"));
        assert!(out.contains("pub async fn delete"));
        assert!(out.contains("pub fn bind"));
    }

    #[test]
    fn partially_implemented_files_only_gain_missing_methods() {
        let dir = TempDir::new().unwrap();
        let existing = r#"
pub struct MemberImpl;

impl MemberImpl {
    pub async fn create(&self, req: CreateReq) -> Result<CreateResp, core::Error> {
        Ok(CreateResp {})
    }
}
"#;
        let out = run(
            &dir,
            Some(existing),
            &[("Create", "create"), ("Delete", "delete")],
        );

        // original body untouched, delete + hook appended
        assert!(out.contains("Ok(CreateResp {})"));
        assert_eq!(out.matches("pub async fn create").count(), 1);
        assert!(out.contains("pub async fn delete"));
        assert!(out.contains("pub fn bind"));

        let index = index_file(&dir.path().join("src/handler/member.rs")).unwrap();
        let methods = index.methods("MemberImpl").unwrap();
        assert!(methods.contains("create"));
        assert!(methods.contains("delete"));
        assert!(methods.contains("bind"));
    }

    #[test]
    fn complete_files_only_gain_the_hook() {
        let dir = TempDir::new().unwrap();
        let existing = r#"
pub struct MemberImpl;

impl MemberImpl {
    pub async fn create(&self) {}
}
"#;
        let out = run(&dir, Some(existing), &[("Create", "create")]);
        assert_eq!(out.matches("pub async fn create").count(), 1);
        assert!(out.contains("pub fn bind"));
    }

    #[test]
    fn complete_files_with_hook_are_untouched() {
        let dir = TempDir::new().unwrap();
        let existing = "pub struct MemberImpl;\n\nimpl MemberImpl {\n    pub async fn create(&self) {}\n    pub fn bind(&self) {}\n}\n";
        let out = run(&dir, Some(existing), &[("Create", "create")]);
        assert_eq!(out, existing);
    }

    #[test]
    fn implemented_methods_are_registered_for_extraction() {
        let dir = TempDir::new().unwrap();
        let record = record(&[("Create", "create")]);
        let path = dir.path().join(&record.emit_to);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            "pub struct MemberImpl;\nimpl MemberImpl {\n    pub async fn create(&self) {}\n    pub fn bind(&self) {}\n}\n",
        )
        .unwrap();

        let mut ctx = Context::new("pkg");
        let renderer = Renderer::new().unwrap();
        reconcile_target(&mut ctx, &renderer, dir.path(), "Member", &record, None).unwrap();
        assert!(ctx.implemented["Member"].rpcs.contains_key("create"));
    }
}
