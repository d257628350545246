//! Target-source inspection.
//!
//! Builds a read-only [`ImplIndex`] from one Rust source file: which
//! types are declared, which methods each inherent impl block exposes,
//! and whether the reserved lifecycle hook is present. The index is the
//! sole input to the reconciliation state machine.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use syn::{ImplItem, Item, Type};

use crate::context::LIFECYCLE_HOOK;
use crate::error::{Result, SyncError};

/// Declaration index of one target source file.
#[derive(Debug, Default)]
pub struct ImplIndex {
    /// Top-level struct/enum/alias names.
    pub types: BTreeSet<String>,
    /// Receiver type name -> method names across its inherent impls.
    pub methods_by_receiver: BTreeMap<String, BTreeSet<String>>,
}

impl ImplIndex {
    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains(name)
    }

    pub fn methods(&self, receiver: &str) -> Option<&BTreeSet<String>> {
        self.methods_by_receiver.get(receiver)
    }

    pub fn has_method(&self, receiver: &str, name: &str) -> bool {
        self.methods(receiver).is_some_and(|m| m.contains(name))
    }

    pub fn has_lifecycle_hook(&self, receiver: &str) -> bool {
        self.has_method(receiver, LIFECYCLE_HOOK)
    }
}

/// Reconciliation state of one required type against an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImplState {
    /// Type not declared at all.
    Absent,
    /// Type exists, none of the required methods do.
    PartialTypeOnly,
    /// Type exists with some required methods; carries the missing
    /// names in required order.
    PartialMethods(Vec<String>),
    /// Every required method exists.
    Complete,
}

/// Compute the reconciliation state for `type_name` and the ordered
/// required method list.
pub fn classify(index: &ImplIndex, type_name: &str, required: &[String]) -> ImplState {
    if !index.has_type(type_name) {
        return ImplState::Absent;
    }
    let missing: Vec<String> = required
        .iter()
        .filter(|m| !index.has_method(type_name, m))
        .cloned()
        .collect();
    if missing.len() == required.len() && !required.is_empty() {
        ImplState::PartialTypeOnly
    } else if missing.is_empty() {
        ImplState::Complete
    } else {
        ImplState::PartialMethods(missing)
    }
}

/// Index a source string.
pub fn index_source(path: &Path, source: &str) -> Result<ImplIndex> {
    let file = syn::parse_file(source).map_err(|e| SyncError::TargetParse {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut index = ImplIndex::default();
    for item in &file.items {
        match item {
            Item::Struct(s) => {
                index.types.insert(s.ident.to_string());
            }
            Item::Enum(e) => {
                index.types.insert(e.ident.to_string());
            }
            Item::Type(t) => {
                index.types.insert(t.ident.to_string());
            }
            Item::Impl(block) if block.trait_.is_none() => {
                let Some(receiver) = receiver_name(&block.self_ty) else {
                    continue;
                };
                let methods = index.methods_by_receiver.entry(receiver).or_default();
                for item in &block.items {
                    if let ImplItem::Fn(f) = item {
                        methods.insert(f.sig.ident.to_string());
                    }
                }
            }
            _ => {}
        }
    }
    Ok(index)
}

/// Index a target file from disk.
pub fn index_file(path: &Path) -> Result<ImplIndex> {
    let source = std::fs::read_to_string(path)?;
    index_source(path, &source)
}

/// Last path segment of an inherent impl's self type.
pub(crate) fn receiver_name(self_ty: &Type) -> Option<String> {
    match self_ty {
        Type::Path(p) => p.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    }
}
