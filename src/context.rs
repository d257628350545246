//! Per-run reconciliation context.
//!
//! All cross-cutting tables accumulated while processing one schema
//! document live here. A fresh context is created per document, so batch
//! runs never alias state across documents and the engine stays
//! re-entrant.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::directive::{IndexDirective, MiddlewareSpec};
use crate::error::{Result, SyncError};
use crate::schema::NodeId;

/// Messages whose name starts with this prefix are storage models.
pub const MODEL_PREFIX: &str = "Model";
/// Enum name that defines the document's error-code catalog.
pub const ERR_CODE_ENUM: &str = "ErrCode";
/// Services whose name ends with this suffix are route groups.
pub const API_GROUP_SUFFIX: &str = "API";
/// Request/response message name suffixes used by the add commands.
pub const REQ_SUFFIX: &str = "Req";
pub const RESP_SUFFIX: &str = "Resp";
/// Reserved lifecycle hook every generated handler type exposes once.
pub const LIFECYCLE_HOOK: &str = "bind";
/// Call path recognized by the error-fact extractor.
pub const ERROR_FACTORY_MODULE: &str = "core";
pub const ERROR_FACTORY_FNS: [&str; 2] = ["create_error", "create_error_with_msg"];
/// Default reconciliation target when a route group has no `@emit_to:`.
pub const DEFAULT_EMIT_TO: &str = "src/controller/impl_controller.rs";

/// One member of a (possibly compound) index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexField {
    pub field: String,
    /// 1 ascending, -1 descending.
    pub order: i32,
}

/// Accumulated index definition keyed by index name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexInfo {
    pub name: String,
    pub unique: bool,
    pub ttl: bool,
    pub expire_after_seconds: i64,
    pub fields: Vec<IndexField>,
}

impl IndexInfo {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            unique: false,
            ttl: false,
            expire_after_seconds: 0,
            fields: Vec::new(),
        }
    }
}

/// One rpc entry of a route group.
#[derive(Debug, Clone, Serialize)]
pub struct RouterMethod {
    /// Rpc name as declared in the schema.
    pub func_name: String,
    /// snake_case symbol generated into the target source file.
    pub fn_name: String,
    pub path: String,
    pub http_method: String,
    pub author: String,
    pub describe: String,
    pub request: String,
    pub response: String,
    pub middlewares: Vec<String>,
    /// Backing rpc node, used when error facts are written back.
    #[serde(skip)]
    pub rpc: NodeId,
}

/// A route group accumulated from one service.
#[derive(Debug, Clone, Serialize)]
pub struct RouterRecord {
    pub prefix: String,
    pub emit_to: String,
    pub middlewares: Vec<String>,
    pub methods: Vec<RouterMethod>,
}

/// Catalog entry built from the `ErrCode` enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrCodeInfo {
    pub code: i64,
    pub name: String,
    pub message: String,
}

/// Storage field record retained for the model metadata templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRecord {
    pub struct_field: String,
    pub storage_field: String,
    pub comment: String,
}

/// One scheduled task harvested from a `@task: true` service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskNode {
    pub describe: String,
    pub spec: String,
    pub times: i64,
    /// 0 perpetual, 1 time-ranged, 2 bounded by `times`.
    pub kind: i64,
    pub range_start: i64,
    pub range_end: i64,
}

/// Task table of one service plus its generation target.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskConfig {
    pub emit_to: String,
    pub tasks: BTreeMap<String, TaskNode>,
}

/// Rate rule attached to one routed path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateRule {
    pub minute: i64,
    pub hour: i64,
    pub day: i64,
}

/// A reconciled service: where its handlers live and which rpcs exist.
#[derive(Debug, Clone, Default)]
pub struct ImplementedService {
    pub emit_to: String,
    pub rpcs: BTreeMap<String, NodeId>,
}

/// Accumulation tables for one run over one schema document.
#[derive(Debug, Default)]
pub struct Context {
    /// Normalized schema package name (`a.b` -> `a_b`).
    pub package_name: String,
    /// Composite-or-bare type name -> message node.
    pub type_registry: HashMap<String, NodeId>,
    /// Model messages by name, in discovery order.
    pub models: Vec<(String, NodeId)>,
    /// Composite field path -> canonical storage value.
    pub storage_tags: BTreeMap<String, String>,
    /// Model name -> field path -> record, for metadata generation.
    pub model_fields: BTreeMap<String, BTreeMap<String, FieldRecord>>,
    /// Model name -> table name.
    pub table_names: BTreeMap<String, String>,
    /// Error-code catalog in declaration order.
    pub err_codes: Vec<ErrCodeInfo>,
    /// Fully qualified code symbol -> catalog entry.
    pub err_catalog: BTreeMap<String, ErrCodeInfo>,
    /// Index name -> accumulated definition.
    pub indexes: BTreeMap<String, IndexInfo>,
    /// Service name -> route group.
    pub routers: BTreeMap<String, RouterRecord>,
    /// Module paths generated router code must import.
    pub router_imports: Vec<String>,
    /// All services by name.
    pub services: HashMap<String, NodeId>,
    /// Route-group services by name.
    pub api_groups: HashMap<String, NodeId>,
    /// Services whose handlers were located during reconciliation.
    pub implemented: HashMap<String, ImplementedService>,
    /// Task service name -> task table.
    pub tasks: BTreeMap<String, TaskConfig>,
    /// Routed path -> rate rule.
    pub rate_rules: BTreeMap<String, RateRule>,
}

impl Context {
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            ..Self::default()
        }
    }

    pub fn register_type(&mut self, path: String, id: NodeId) {
        self.type_registry.insert(path, id);
    }

    pub fn register_model(&mut self, name: &str, id: NodeId) {
        if !self.models.iter().any(|(n, _)| n == name) {
            self.models.push((name.to_string(), id));
        }
    }

    pub fn add_storage_tag(&mut self, path: String, value: String) {
        self.storage_tags.insert(path, value);
    }

    pub fn add_model_field(
        &mut self,
        model: &str,
        field_path: &str,
        record: FieldRecord,
    ) {
        // field paths are stored relative to the owning model
        let relative = field_path
            .strip_prefix(&format!("{model}_"))
            .unwrap_or(field_path)
            .to_string();
        self.model_fields
            .entry(model.to_string())
            .or_default()
            .insert(relative, record);
    }

    pub fn add_table_name(&mut self, model: &str, table: &str) {
        self.table_names
            .insert(model.to_string(), table.to_string());
    }

    pub fn add_err_code(&mut self, code: i64, name: &str, message: &str) {
        self.err_codes.push(ErrCodeInfo {
            code,
            name: name.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_catalog_entry(&mut self, qualified: String, entry: ErrCodeInfo) {
        self.err_catalog.insert(qualified, entry);
    }

    /// Register a plain index member. Conflicts with an existing unique
    /// or ttl declaration under the same name are hard errors.
    pub fn add_index_field(&mut self, spec: &IndexDirective, field: IndexField) -> Result<()> {
        match self.indexes.get_mut(&spec.name) {
            None => {
                let mut info = IndexInfo::new(&spec.name);
                info.fields.push(field);
                self.indexes.insert(spec.name.clone(), info);
                Ok(())
            }
            Some(info) => {
                if info.unique {
                    return Err(SyncError::UniqueIndexConflict(spec.name.clone()));
                }
                if info.ttl {
                    return Err(SyncError::TtlIndexConflict(spec.name.clone()));
                }
                info.fields.push(field);
                Ok(())
            }
        }
    }

    /// Register a unique index member.
    pub fn add_unique_index_field(
        &mut self,
        spec: &IndexDirective,
        field: IndexField,
    ) -> Result<()> {
        match self.indexes.get_mut(&spec.name) {
            None => {
                let mut info = IndexInfo::new(&spec.name);
                info.unique = true;
                info.fields.push(field);
                self.indexes.insert(spec.name.clone(), info);
                Ok(())
            }
            Some(info) => {
                if !info.unique {
                    return Err(SyncError::UniqueIndexConflict(spec.name.clone()));
                }
                if info.ttl {
                    return Err(SyncError::TtlIndexConflict(spec.name.clone()));
                }
                info.fields.push(field);
                Ok(())
            }
        }
    }

    /// Register a ttl index member. A second ttl declaration for the
    /// same name is an error rather than a silent overwrite.
    pub fn add_ttl_index_field(&mut self, spec: &IndexDirective, field: IndexField) -> Result<()> {
        match self.indexes.get_mut(&spec.name) {
            None => {
                let mut info = IndexInfo::new(&spec.name);
                info.ttl = true;
                info.expire_after_seconds = spec.expire_after_seconds.unwrap_or_default();
                info.fields.push(field);
                self.indexes.insert(spec.name.clone(), info);
                Ok(())
            }
            Some(info) => {
                if info.unique {
                    return Err(SyncError::UniqueIndexConflict(spec.name.clone()));
                }
                if info.ttl {
                    return Err(SyncError::TtlIndexConflict(spec.name.clone()));
                }
                info.fields.push(field);
                Ok(())
            }
        }
    }

    pub fn add_router_group(&mut self, service: &str, record: RouterRecord) {
        self.routers.insert(service.to_string(), record);
    }

    pub fn add_router_imports(&mut self, spec: &MiddlewareSpec) {
        for import in &spec.imports {
            if !self.router_imports.contains(import) {
                self.router_imports.push(import.clone());
            }
        }
    }

    pub fn add_service(&mut self, name: &str, id: NodeId) {
        self.services.insert(name.to_string(), id);
    }

    pub fn add_api_group(&mut self, name: &str, id: NodeId) {
        self.api_groups.insert(name.to_string(), id);
    }

    pub fn add_implemented_rpc(&mut self, service: &str, emit_to: &str, rpc_name: &str, rpc: NodeId) {
        let entry = self.implemented.entry(service.to_string()).or_default();
        entry.emit_to = emit_to.to_string();
        entry.rpcs.insert(rpc_name.to_string(), rpc);
    }

    pub fn add_task(&mut self, service: &str, task_name: &str, emit_to: &str, node: TaskNode) {
        let config = self.tasks.entry(service.to_string()).or_insert_with(|| {
            TaskConfig {
                emit_to: emit_to.to_string(),
                tasks: BTreeMap::new(),
            }
        });
        config.tasks.insert(task_name.to_string(), node);
    }

    pub fn add_rate_rule(&mut self, path: String, rule: RateRule) {
        self.rate_rules.insert(path, rule);
    }
}
