//! Generated-declaration templates.
//!
//! All generated text goes through handlebars with HTML escaping
//! disabled; the data contexts are built by the callers. Templates are
//! opaque text substitution, nothing here inspects the target source.

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::Result;

pub const HANDLER_FILE: &str = "handler_file";
pub const HANDLER_IMPL: &str = "handler_impl";
pub const BIND_IMPL: &str = "bind_impl";
pub const ROUTER_TABLE: &str = "router_table";
pub const MODEL_METADATA: &str = "model_metadata";
pub const TASK_REGISTRY: &str = "task_registry";
pub const TASK_FNS: &str = "task_fns";
pub const RATE_RULES: &str = "rate_rules";

const HANDLER_FILE_TPL: &str = r#"//! Handler scaffold for `{{service}}`. Generated declarations are
//! appended only; hand-written bodies are never rewritten.

use crate::core;
{{#if crate_path}}use {{crate_path}}::*;
{{/if}}{{#each imports}}use {{this}};
{{/each}}
/// Handlers for the `{{service}}` route group.
pub struct {{type_name}};

impl {{type_name}} {
{{#each methods}}    /// {{describe}} ({{author}})
    pub async fn {{fn_name}}(&self, req: {{request}}) -> Result<{{response}}, core::Error> {
        let _ = req;
        todo!("{{fn_name}} is not implemented")
    }

{{/each}}    /// Lifecycle hook invoked once at route registration.
    pub fn bind(&self) {}
}
"#;

const HANDLER_IMPL_TPL: &str = r#"
{{#if declare_type}}/// Handlers for the `{{service}}` route group.
pub struct {{type_name}};

{{/if}}impl {{type_name}} {
{{#each methods}}    /// {{describe}} ({{author}})
    pub async fn {{fn_name}}(&self, req: {{request}}) -> Result<{{response}}, core::Error> {
        let _ = req;
        todo!("{{fn_name}} is not implemented")
    }

{{/each}}{{#if include_bind}}    /// Lifecycle hook invoked once at route registration.
    pub fn bind(&self) {}
{{/if}}}
"#;

const BIND_IMPL_TPL: &str = r#"
impl {{type_name}} {
    /// Lifecycle hook invoked once at route registration.
    pub fn bind(&self) {}
}
"#;

const ROUTER_TABLE_TPL: &str = r#"// Code generated by protosync. DO NOT EDIT.
//! Route tables for `{{package}}`.

{{#each imports}}use {{this}};
{{/each}}{{#each groups}}
/// Routes of `{{service}}` under `{{prefix}}`.
pub const {{const_name}}: &[(&str, &str, &str)] = &[
{{#each methods}}    ("{{http_method}}", "{{full_path}}", "{{fn_name}}"),
{{/each}}];
{{#if errors}}
/// Error codes observed per `{{service}}` handler.
pub const {{error_const_name}}: &[(&str, &[&str])] = &[
{{#each errors}}    ("{{fn_name}}", &[{{#each labels}}"{{this}}", {{/each}}]),
{{/each}}];
{{/if}}{{/each}}"#;

const MODEL_METADATA_TPL: &str = r#"// Code generated by protosync. DO NOT EDIT.
//! Storage metadata for `{{package}}`.

{{#each models}}pub mod {{mod_name}} {
    pub const TABLE: &str = "{{table}}";

{{#each fields}}    pub const {{const_name}}: &str = "{{storage_field}}";{{#if comment}} // {{comment}}{{/if}}
{{/each}}}

{{/each}}{{#if indexes}}/// (name, unique, ttl, expire_after_seconds, members as (field, order)).
pub const INDEXES: &[(&str, bool, bool, i64, &[(&str, i32)])] = &[
{{#each indexes}}    ("{{name}}", {{unique}}, {{ttl}}, {{expire_after_seconds}}, &[{{#each fields}}("{{field}}", {{order}}), {{/each}}]),
{{/each}}];

{{/if}}{{#if codes}}pub mod errcode {
{{#each codes}}    pub const {{name}}: i64 = {{code}}; // {{message}}
{{/each}}}
{{/if}}"#;

const TASK_REGISTRY_TPL: &str = r#"// Code generated by protosync. DO NOT EDIT.
//! Task registry for `{{package}}`.

/// (service, task, schedule, times, kind, range_start, range_end).
pub const TASKS: &[(&str, &str, &str, i64, i64, i64, i64)] = &[
{{#each tasks}}    ("{{service}}", "{{name}}", "{{spec}}", {{times}}, {{kind}}, {{range_start}}, {{range_end}}),
{{/each}}];
"#;

const TASK_FNS_TPL: &str = r#"//! Task entry points. Generated once; edit freely.

{{#each tasks}}/// {{describe}}
pub async fn {{fn_name}}() {
    todo!("{{fn_name}} is not implemented")
}

{{/each}}"#;

const RATE_RULES_TPL: &str = r#"// Code generated by protosync. DO NOT EDIT.
//! Rate rules for `{{package}}`.

/// (path, per_minute, per_hour, per_day).
pub const RATE_RULES: &[(&str, i64, i64, i64)] = &[
{{#each rules}}    ("{{path}}", {{minute}}, {{hour}}, {{day}}),
{{/each}}];
"#;

/// Template registry shared by one run.
pub struct Renderer {
    registry: Handlebars<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        for (name, tpl) in [
            (HANDLER_FILE, HANDLER_FILE_TPL),
            (HANDLER_IMPL, HANDLER_IMPL_TPL),
            (BIND_IMPL, BIND_IMPL_TPL),
            (ROUTER_TABLE, ROUTER_TABLE_TPL),
            (MODEL_METADATA, MODEL_METADATA_TPL),
            (TASK_REGISTRY, TASK_REGISTRY_TPL),
            (TASK_FNS, TASK_FNS_TPL),
            (RATE_RULES, RATE_RULES_TPL),
        ] {
            registry
                .register_template_string(name, tpl)
                .map_err(Box::new)?;
        }
        Ok(Self { registry })
    }

    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String> {
        Ok(self.registry.render(template, data)?)
    }
}
