#![forbid(unsafe_code)]

//! # protosync
//!
//! Schema-driven code generation and reconciliation for Rust services.
//!
//! protosync reads proto-style schema documents whose comment blocks
//! embed `@key:` directives, derives storage/wire/validation tags,
//! indexes, route tables, error taxonomies, tasks and rate rules, and
//! keeps a separately maintained body of generated or hand-edited Rust
//! source synchronized with the schema over repeated runs.
//!
//! ## Example
//!
//! ```rust,no_run
//! use protosync::{pipeline, Config};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut config = Config::load_or_default();
//!     config.schema_path = "proto/member.proto".into();
//!     let summary = pipeline::run(&config)?;
//!     assert!(summary.ok());
//!     Ok(())
//! }
//! ```

pub mod artifacts;
pub mod collect;
pub mod commands;
pub mod config;
pub mod context;
pub mod directive;
pub mod error;
pub mod inject;
pub mod naming;
pub mod pipeline;
pub mod reconcile;
pub mod schema;
pub mod scope;
pub mod templates;
pub mod tools;

// Re-exports
pub use config::Config;
pub use context::{Context, ErrCodeInfo, IndexField, IndexInfo, RouterMethod, RouterRecord};
pub use error::{Result, SyncError};
pub use pipeline::RunSummary;
pub use reconcile::{ErrorFact, ImplIndex, ImplState};
pub use schema::{Document, Node, NodeKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
