//! Index collection.
//!
//! `@index:` / `@unique_index:` / `@ttl_index:` directives on model
//! fields accumulate into named [`crate::context::IndexInfo`] entries.
//! Redeclaring a name under incompatible unique/ttl settings aborts the
//! document with a named error instead of silently merging.

use crate::context::{Context, IndexField};
use crate::directive;
use crate::error::Result;
use crate::schema::{Document, NodeId};

/// Collect index directives from the direct fields of one model
/// message. Sub-document indexes are not supported.
pub fn collect_message(doc: &Document, ctx: &mut Context, msg: NodeId) -> Result<()> {
    for &child in &doc.node(msg).children {
        let node = doc.node(child);
        if node.field().is_none() || node.comment.is_empty() {
            continue;
        }
        collect_field(ctx, &node.name, &node.comment)?;
    }
    Ok(())
}

fn collect_field(ctx: &mut Context, field_name: &str, lines: &[String]) -> Result<()> {
    for line in lines {
        // ttl first: its marker would otherwise also satisfy the
        // plain-index substring check
        if line.contains("@ttl_index:") {
            if let Some(spec) = directive::ttl_index_spec(line) {
                let member = IndexField {
                    field: field_name.to_string(),
                    order: spec.order.as_i32(),
                };
                ctx.add_ttl_index_field(&spec, member)?;
            }
            continue;
        }
        if line.contains("@unique_index:") {
            if let Some(spec) = directive::unique_index_spec(line) {
                let member = IndexField {
                    field: field_name.to_string(),
                    order: spec.order.as_i32(),
                };
                ctx.add_unique_index_field(&spec, member)?;
            }
            continue;
        }
        if line.contains("@index:") {
            if let Some(spec) = directive::index_spec(line) {
                let member = IndexField {
                    field: field_name.to_string(),
                    order: spec.order.as_i32(),
                };
                ctx.add_index_field(&spec, member)?;
            }
            continue;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::schema::parse;

    fn collect(src: &str) -> Result<Context> {
        let doc = parse(src).unwrap();
        let mut ctx = Context::new("pkg");
        for &root in &doc.roots {
            collect_message(&doc, &mut ctx, root)?;
        }
        Ok(ctx)
    }

    #[test]
    fn compound_index_gathers_fields_across_declarations() {
        let ctx = collect(
            r#"
message ModelOrder {
    // @index: idx_owner asc
    string owner = 1;
    // @index: idx_owner desc
    int64 created_at = 2;
}
"#,
        )
        .unwrap();
        let info = &ctx.indexes["idx_owner"];
        assert!(!info.unique && !info.ttl);
        assert_eq!(info.fields.len(), 2);
        assert_eq!(info.fields[1].order, -1);
    }

    #[test]
    fn unique_redeclaration_conflict_aborts() {
        let err = collect(
            r#"
message ModelOrder {
    // @index: idx1 asc
    string f1 = 1;
    // @unique_index: idx1 asc
    string f2 = 2;
}
"#,
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::UniqueIndexConflict(name) if name == "idx1"));
    }

    #[test]
    fn ttl_index_parses_expiry() {
        let ctx = collect(
            r#"
message ModelSession {
    // @ttl_index: idx_expire asc 3600
    int64 expire_at = 1;
}
"#,
        )
        .unwrap();
        let info = &ctx.indexes["idx_expire"];
        assert!(info.ttl);
        assert_eq!(info.expire_after_seconds, 3600);
    }

    #[test]
    fn malformed_index_lines_are_soft_failures() {
        let ctx = collect(
            r#"
message ModelOrder {
    // @index: idx_owner sideways
    string owner = 1;
}
"#,
        )
        .unwrap();
        assert!(ctx.indexes.is_empty());
    }
}
