//! Generated artifact writers.
//!
//! Renders the accumulated context tables into `autogen_*` Rust files
//! next to the schema document (or into a configured output
//! directory): model storage metadata, route tables, task registries
//! and rate rules. Artifact files are overwritten on every run; task
//! entry-point scaffolds are only written when absent so hand-written
//! bodies survive.

use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::info;

use crate::collect::errcode;
use crate::context::Context;
use crate::error::Result;
use crate::naming;
use crate::schema::Document;
use crate::templates::{
    Renderer, MODEL_METADATA, RATE_RULES, ROUTER_TABLE, TASK_FNS, TASK_REGISTRY,
};

/// Files produced for one schema document; used by the formatter step.
#[derive(Debug, Default)]
pub struct WrittenArtifacts {
    pub files: Vec<PathBuf>,
}

/// SCREAMING_SNAKE_CASE constant name for a CamelCase field path.
fn const_name(path: &str) -> String {
    path.split('_')
        .map(naming::to_snake)
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

/// Write the model metadata module (tables, field names, indexes, the
/// error-code catalog). Skipped entirely when no model has a table.
pub fn write_model_metadata(
    ctx: &Context,
    renderer: &Renderer,
    out_dir: &Path,
    stem: &str,
) -> Result<Option<PathBuf>> {
    if ctx.table_names.is_empty() {
        return Ok(None);
    }

    let models: Vec<_> = ctx
        .table_names
        .iter()
        .map(|(model, table)| {
            let fields: Vec<_> = ctx
                .model_fields
                .get(model)
                .map(|fields| {
                    fields
                        .iter()
                        .map(|(path, record)| {
                            json!({
                                "const_name": const_name(path),
                                "storage_field": record.storage_field,
                                "comment": record.comment,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            json!({
                "mod_name": naming::to_snake(model),
                "table": table,
                "fields": fields,
            })
        })
        .collect();

    let data = json!({
        "package": ctx.package_name,
        "models": models,
        "indexes": ctx.indexes.values().collect::<Vec<_>>(),
        "codes": ctx.err_codes,
    });

    let path = out_dir.join(format!("autogen_model_{stem}.rs"));
    std::fs::write(&path, renderer.render(MODEL_METADATA, &data)?)?;
    info!(file = %path.display(), "wrote model metadata");
    Ok(Some(path))
}

/// Write the route table module for every collected route group.
pub fn write_router_table(
    doc: &Document,
    ctx: &Context,
    renderer: &Renderer,
    out_dir: &Path,
    stem: &str,
) -> Result<Option<PathBuf>> {
    if ctx.routers.is_empty() {
        return Ok(None);
    }

    let groups: Vec<_> = ctx
        .routers
        .iter()
        .map(|(service, record)| {
            let methods: Vec<_> = record
                .methods
                .iter()
                .map(|m| {
                    json!({
                        "http_method": m.http_method,
                        "full_path": format!("{}{}", record.prefix, m.path),
                        "fn_name": m.fn_name,
                    })
                })
                .collect();

            let errors: Vec<_> = record
                .methods
                .iter()
                .filter_map(|m| {
                    let labels = errcode::pending_labels(&doc.node(m.rpc).comment);
                    if labels.is_empty() {
                        return None;
                    }
                    let resolved: Vec<String> = errcode::resolve_labels(ctx, &labels)
                        .into_iter()
                        .map(|r| r.label)
                        .collect();
                    Some(json!({ "fn_name": m.fn_name, "labels": resolved }))
                })
                .collect();

            json!({
                "service": service,
                "prefix": record.prefix,
                "const_name": format!("{}_ROUTES", const_name(service)),
                "error_const_name": format!("{}_ERRORS", const_name(service)),
                "methods": methods,
                "errors": errors,
            })
        })
        .collect();

    let data = json!({
        "package": ctx.package_name,
        "imports": ctx.router_imports,
        "groups": groups,
    });

    let path = out_dir.join(format!("autogen_router_{stem}.rs"));
    std::fs::write(&path, renderer.render(ROUTER_TABLE, &data)?)?;
    info!(file = %path.display(), "wrote route tables");
    Ok(Some(path))
}

/// Write the task registry plus per-service entry-point scaffolds.
pub fn write_tasks(
    ctx: &Context,
    renderer: &Renderer,
    out_dir: &Path,
    stem: &str,
    project_root: &Path,
) -> Result<WrittenArtifacts> {
    let mut written = WrittenArtifacts::default();
    if ctx.tasks.is_empty() {
        return Ok(written);
    }

    let rows: Vec<_> = ctx
        .tasks
        .iter()
        .flat_map(|(service, config)| {
            config.tasks.iter().map(move |(name, node)| {
                json!({
                    "service": service,
                    "name": name,
                    "spec": node.spec,
                    "times": node.times,
                    "kind": node.kind,
                    "range_start": node.range_start,
                    "range_end": node.range_end,
                })
            })
        })
        .collect();

    let registry = out_dir.join(format!("autogen_task_{stem}.rs"));
    std::fs::write(
        &registry,
        renderer.render(
            TASK_REGISTRY,
            &json!({ "package": ctx.package_name, "tasks": rows }),
        )?,
    )?;
    info!(file = %registry.display(), "wrote task registry");
    written.files.push(registry);

    for config in ctx.tasks.values() {
        if config.emit_to.is_empty() {
            continue;
        }
        let target = project_root.join(&config.emit_to);
        if target.exists() {
            continue;
        }
        let tasks: Vec<_> = config
            .tasks
            .iter()
            .map(|(name, node)| {
                let describe = if node.describe.is_empty() {
                    "scheduled task"
                } else {
                    node.describe.as_str()
                };
                json!({
                    "fn_name": naming::to_snake(name),
                    "describe": describe,
                })
            })
            .collect();
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, renderer.render(TASK_FNS, &json!({ "tasks": tasks }))?)?;
        info!(file = %target.display(), "wrote task entry points");
        written.files.push(target);
    }

    Ok(written)
}

/// Write the rate rule table, honoring a configured output directory.
pub fn write_rate_rules(
    ctx: &Context,
    renderer: &Renderer,
    out_dir: &Path,
    stem: &str,
    rate_output: Option<&Path>,
) -> Result<Option<PathBuf>> {
    if ctx.rate_rules.is_empty() {
        return Ok(None);
    }

    let rules: Vec<_> = ctx
        .rate_rules
        .iter()
        .map(|(path, rule)| {
            json!({
                "path": path,
                "minute": rule.minute,
                "hour": rule.hour,
                "day": rule.day,
            })
        })
        .collect();

    let path = match rate_output {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            dir.join("rate_rules.rs")
        }
        None => out_dir.join(format!("autogen_rate_{stem}.rs")),
    };
    std::fs::write(
        &path,
        renderer.render(
            RATE_RULES,
            &json!({ "package": ctx.package_name, "rules": rules }),
        )?,
    )?;
    info!(file = %path.display(), "wrote rate rules");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::context::{FieldRecord, RateRule};

    #[test]
    fn const_names_flatten_camel_paths() {
        assert_eq!(const_name("Profile_Bio"), "PROFILE_BIO");
        assert_eq!(const_name("NickName"), "NICK_NAME");
        assert_eq!(const_name("MemberAPI"), "MEMBER_API");
    }

    #[test]
    fn metadata_skips_documents_without_models() {
        let dir = TempDir::new().unwrap();
        let ctx = Context::new("pkg");
        let renderer = Renderer::new().unwrap();
        let out = write_model_metadata(&ctx, &renderer, dir.path(), "member").unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn metadata_renders_tables_fields_and_codes() {
        let dir = TempDir::new().unwrap();
        let mut ctx = Context::new("pkg");
        ctx.add_table_name("ModelUser", "user");
        ctx.add_model_field(
            "ModelUser",
            "ModelUser_NickName",
            FieldRecord {
                struct_field: "NickName".to_string(),
                storage_field: "nick_name".to_string(),
                comment: "display name".to_string(),
            },
        );
        ctx.add_err_code(404, "NOT_FOUND", "missing");

        let renderer = Renderer::new().unwrap();
        let path = write_model_metadata(&ctx, &renderer, dir.path(), "member")
            .unwrap()
            .unwrap();
        let out = std::fs::read_to_string(path).unwrap();
        assert!(out.contains("pub mod model_user {"));
        assert!(out.contains("pub const TABLE: &str = \"user\";"));
        assert!(out.contains("pub const NICK_NAME: &str = \"nick_name\"; // display name"));
        assert!(out.contains("pub const NOT_FOUND: i64 = 404; // missing"));
    }

    #[test]
    fn rate_rules_honor_the_configured_output_dir() {
        let dir = TempDir::new().unwrap();
        let mut ctx = Context::new("pkg");
        ctx.add_rate_rule(
            "/api/find".to_string(),
            RateRule {
                minute: 10,
                hour: 100,
                day: 1000,
            },
        );
        let renderer = Renderer::new().unwrap();
        let custom = dir.path().join("rules");
        let path = write_rate_rules(&ctx, &renderer, dir.path(), "member", Some(&custom))
            .unwrap()
            .unwrap();
        assert_eq!(path, custom.join("rate_rules.rs"));
        let out = std::fs::read_to_string(path).unwrap();
        assert!(out.contains("(\"/api/find\", 10, 100, 1000),"));
    }
}
