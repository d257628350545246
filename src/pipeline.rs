//! Per-document pass orchestration.
//!
//! Each schema document is processed start to finish with a fresh
//! context: parse, directive/tag passes, collector accumulation,
//! serialization of the injected intermediate, metadata artifact
//! generation, handler reconciliation, error extraction and the final
//! write-back. The user's document is renamed to `origin_<name>` for
//! the duration of the run and restored afterwards, so the injected
//! intermediate can carry the original file name for the wire-binding
//! compiler.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::artifacts;
use crate::collect::{errcode, index as index_collect, rate, router, task};
use crate::config::Config;
use crate::context::{Context, MODEL_PREFIX};
use crate::directive::{self, Key};
use crate::error::{Result, SyncError};
use crate::inject::{merge, store, validate, wire};
use crate::naming;
use crate::reconcile;
use crate::schema::{self, Document, NodeId, NodeKind};
use crate::scope;
use crate::templates::Renderer;
use crate::tools;

/// Outcome of one batch run. Failed documents do not stop the batch.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub processed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, SyncError)>,
}

impl RunSummary {
    pub fn ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Process every discovered schema document.
pub fn run(config: &Config) -> Result<RunSummary> {
    let files = discover(config)?;
    let renderer = Renderer::new()?;
    let mut summary = RunSummary::default();

    for file in files {
        match process_document(config, &renderer, &file) {
            Ok(()) => {
                info!(file = %file.display(), "document processed");
                summary.processed.push(file);
            }
            Err(e) => {
                error!(file = %file.display(), error = %e, "document failed");
                summary.failed.push((file, e));
            }
        }
    }
    Ok(summary)
}

/// Schema files named by the configured path: a single file, a
/// directory walk, or a `*.proto` pattern. Generated (`autogen_`) and
/// in-flight (`origin_`) documents are never picked up.
fn discover(config: &Config) -> Result<Vec<PathBuf>> {
    let path = &config.schema_path;
    let text = path.to_string_lossy().to_string();
    let mut files = Vec::new();

    if text.ends_with("*.proto") || text.ends_with('*') {
        let pattern = glob::glob(&text).map_err(|e| {
            SyncError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;
        for entry in pattern.flatten() {
            if entry.is_file() {
                files.push(entry);
            }
        }
    } else if path.is_dir() {
        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() {
                files.push(entry.path().to_path_buf());
            }
        }
    } else if path.is_file() {
        files.push(path.clone());
    } else {
        return Err(SyncError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("schema path {} does not exist", path.display()),
        )));
    }

    let excludes: Vec<glob::Pattern> = config
        .exclude
        .iter()
        .filter_map(|p| glob::Pattern::new(p).ok())
        .collect();

    files.retain(|f| {
        let name = f
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if name.starts_with("autogen") || name.starts_with("origin") {
            debug!(file = %f.display(), "skipping generated/in-flight document");
            return false;
        }
        if f.extension().map(|e| e != "proto").unwrap_or(true) {
            return false;
        }
        !excludes.iter().any(|p| p.matches_path(f))
    });

    files.sort();
    files.dedup();
    Ok(files)
}

/// Run the full pass sequence for one document, restoring the original
/// file name afterwards even when a pass fails.
fn process_document(config: &Config, renderer: &Renderer, path: &Path) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let origin = dir.join(format!("origin_{name}"));
    std::fs::rename(path, &origin)?;

    let result = process_renamed(config, renderer, &origin, path);

    if path.exists() {
        let _ = std::fs::remove_file(path);
    }
    match std::fs::rename(&origin, path) {
        Ok(()) => result,
        Err(restore_err) => result.and(Err(SyncError::Io(restore_err))),
    }
}

fn process_renamed(
    config: &Config,
    renderer: &Renderer,
    origin: &Path,
    mid: &Path,
) -> Result<()> {
    let dir = mid.parent().unwrap_or_else(|| Path::new("."));
    let stem = mid
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let out_dir = config
        .output_dir
        .clone()
        .unwrap_or_else(|| dir.to_path_buf());
    std::fs::create_dir_all(&out_dir)?;

    // ------- injection phase -------
    let mut doc = schema::parse_file(origin)?;
    let mut ctx = Context::new(doc.package_ident());
    scope::register_types(&doc, &mut ctx);

    let message_roots = doc.roots_where(|n| n.is_message());
    for &id in &message_roots {
        validate::inject_message(&mut doc, id);
        wire::inject_message(&mut doc, id);
        register_model(&doc, &mut ctx, id);
    }
    for id in doc.roots_where(|n| matches!(n.kind, NodeKind::Enum)) {
        errcode::collect_enum(&doc, &mut ctx, id);
    }
    for id in doc.roots_where(|n| matches!(n.kind, NodeKind::Service)) {
        rate::collect_service(&doc, &mut ctx, id);
    }

    store::inject_models(&mut doc, &mut ctx);
    for (name, id) in ctx.models.clone() {
        collect_table_name(&doc, &mut ctx, &name, id);
    }
    store::inject_open_messages(&mut doc, &mut ctx);
    for (_, id) in ctx.models.clone() {
        index_collect::collect_message(&doc, &mut ctx, id)?;
    }
    for &id in &message_roots {
        merge::merge_message(&mut doc, id);
    }

    schema::write_file(mid, &doc)?;

    let mut generated: Vec<PathBuf> = Vec::new();
    if let Some(p) = artifacts::write_model_metadata(&ctx, renderer, &out_dir, &stem)? {
        generated.push(p);
    }
    if let Some(p) = artifacts::write_rate_rules(
        &ctx,
        renderer,
        &out_dir,
        &stem,
        config.rate_output.as_deref(),
    )? {
        generated.push(p);
    }

    // ------- router phase over the pristine document -------
    let mut routed = schema::parse_file(origin)?;
    let crate_path = routed.option("crate_path").map(str::to_string);
    for id in routed.roots_where(|n| matches!(n.kind, NodeKind::Service)) {
        let service_name = routed.node(id).name.clone();
        ctx.add_service(&service_name, id);
        if router::is_route_group(&routed, id) {
            ctx.add_api_group(&service_name, id);
        }
        router::collect_service(&routed, &mut ctx, id);
        task::collect_service(&routed, &mut ctx, id);
    }

    let tasks_written = artifacts::write_tasks(&ctx, renderer, &out_dir, &stem, &config.project_root)?;
    generated.extend(tasks_written.files);

    for (service, record) in ctx.routers.clone() {
        reconcile::reconcile_target(
            &mut ctx,
            renderer,
            &config.project_root,
            &service,
            &record,
            crate_path.as_deref(),
        )?;
    }

    // ------- extraction and write-back -------
    let package = ctx.package_name.clone();
    for (service, implemented) in ctx.implemented.clone() {
        let target = config.project_root.join(&implemented.emit_to);
        let receiver = format!("{service}Impl");
        let facts = reconcile::extract_file(&target, &receiver, &package)?;
        for (fn_name, codes) in facts {
            if let Some(&rpc) = implemented.rpcs.get(&fn_name) {
                reconcile::sync_method_errors(&mut routed, rpc, &codes);
            }
        }
    }
    schema::write_file(origin, &routed)?;

    // route tables render after the write-back so their per-route
    // error constants reflect the synchronized labels
    if let Some(p) = artifacts::write_router_table(&routed, &ctx, renderer, &out_dir, &stem)? {
        generated.push(p);
    }

    // ------- best-effort normalization -------
    if config.format_output {
        for file in &generated {
            tools::format_rust_file(file);
        }
        for record in ctx.routers.values() {
            tools::format_rust_file(&config.project_root.join(&record.emit_to));
        }
    }
    if let Some(cmd) = &config.compiler_cmd {
        tools::run_compiler_hook(cmd, mid);
    }

    Ok(())
}

/// Register a top-level message as a model: `Model` prefix or an
/// explicit `@model: true` marker.
fn register_model(doc: &Document, ctx: &mut Context, id: NodeId) {
    let node = doc.node(id);
    if node.name.starts_with(MODEL_PREFIX) {
        let name = node.name.clone();
        ctx.register_model(&name, id);
        return;
    }
    if node
        .comment
        .iter()
        .any(|line| directive::match_value(line, Key::Model).is_some())
    {
        let name = node.name.clone();
        ctx.register_model(&name, id);
    }
}

/// Table name of a model: `@table_name:` override, else snake_case of
/// the message name with the `model_` prefix stripped.
fn collect_table_name(doc: &Document, ctx: &mut Context, model_name: &str, id: NodeId) {
    for line in &doc.node(id).comment {
        if let Some(value) = directive::match_value(line, Key::TableName) {
            ctx.add_table_name(model_name, &value);
            return;
        }
    }
    let snake = naming::to_snake(model_name);
    let table = snake.strip_prefix("model_").unwrap_or(&snake);
    ctx.add_table_name(model_name, table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse;

    #[test]
    fn table_names_default_to_snake_without_the_model_prefix() {
        let doc = parse("message ModelUserProfile {\n}\n").unwrap();
        let mut ctx = Context::new("pkg");
        collect_table_name(&doc, &mut ctx, "ModelUserProfile", doc.roots[0]);
        assert_eq!(ctx.table_names["ModelUserProfile"], "user_profile");
    }

    #[test]
    fn table_name_directive_overrides_the_default() {
        let doc = parse("// @table_name: members\nmessage ModelMember {\n}\n").unwrap();
        let mut ctx = Context::new("pkg");
        collect_table_name(&doc, &mut ctx, "ModelMember", doc.roots[0]);
        assert_eq!(ctx.table_names["ModelMember"], "members");
    }

    #[test]
    fn discovery_skips_generated_and_in_flight_documents() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in [
            "member.proto",
            "autogen_member.proto",
            "origin_member.proto",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), "syntax = \"proto3\";\n").unwrap();
        }

        let mut config = Config::default();
        config.schema_path = dir.path().to_path_buf();
        let files = discover(&config).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("member.proto"));
    }

    #[test]
    fn discovery_honors_exclude_patterns() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("legacy")).unwrap();
        std::fs::write(dir.path().join("member.proto"), "").unwrap();
        std::fs::write(dir.path().join("legacy/old.proto"), "").unwrap();

        let mut config = Config::default();
        config.schema_path = dir.path().to_path_buf();
        config.exclude = vec!["**/legacy/**".to_string()];
        let files = discover(&config).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("member.proto"));
    }
}
