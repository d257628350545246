//! Implementation reconciliation and reverse fact extraction.
//!
//! [`inspect`] builds the declaration index of a target file,
//! [`scaffold`] appends the missing declarations, [`extract`] harvests
//! error facts from method bodies, and [`sync`] merges those facts back
//! into the schema's comment blocks.

pub mod extract;
pub mod inspect;
pub mod scaffold;
pub mod sync;

pub use extract::{extract_file, extract_source, ErrorFact};
pub use inspect::{classify, index_file, index_source, ImplIndex, ImplState};
pub use scaffold::reconcile_target;
pub use sync::sync_method_errors;
