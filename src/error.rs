//! Error types shared across the library.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used by every fallible API in the crate.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors surfaced while processing one schema document.
///
/// Semantic conflicts carry the offending name so batch runs can report
/// which declaration caused the abort.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{}: {source}", .file.display())]
    Schema {
        file: PathBuf,
        #[source]
        source: crate::schema::ParseError,
    },

    #[error("index `{0}` redeclared with a conflicting unique setting")]
    UniqueIndexConflict(String),

    #[error("index `{0}` carries more than one ttl declaration")]
    TtlIndexConflict(String),

    #[error("service `{0}` is already registered")]
    ServiceExists(String),

    #[error("service `{0}` not found")]
    ServiceNotFound(String),

    #[error("rpc `{0}` is already registered")]
    RpcExists(String),

    #[error("task `{0}` is already registered")]
    TaskExists(String),

    #[error("{} is not parseable Rust: {message}", .file.display())]
    TargetParse { file: PathBuf, message: String },

    #[error("template rendering failed: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("template registration failed: {0}")]
    TemplateDefinition(#[from] Box<handlebars::TemplateError>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
