//! Schema definition language: tree, parser and printer.
//!
//! The tree is mutated in place by the injection passes and serialized
//! back with [`print`]; the round trip preserves declarations and order
//! even when comment content changed.

pub mod ast;
pub mod parser;
pub mod printer;

pub use ast::{Document, FieldData, Node, NodeId, NodeKind, RpcData};
pub use parser::{parse, ParseError};
pub use printer::print;

use std::path::Path;

use crate::error::{Result, SyncError};

/// Parse a schema document from disk.
pub fn parse_file(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path)?;
    parse(&content).map_err(|source| SyncError::Schema {
        file: path.to_path_buf(),
        source,
    })
}

/// Serialize a document back to disk in canonical form.
pub fn write_file(path: &Path, doc: &Document) -> Result<()> {
    std::fs::write(path, print(doc))?;
    Ok(())
}
