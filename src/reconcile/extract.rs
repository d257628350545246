//! Error-fact extraction.
//!
//! Walks handler method bodies looking for the exact call shape
//! `core::create_error(pkg::CODE, ..)` (or `create_error_with_msg`).
//! Traversal recurses through blocks, let bindings, assignments,
//! returns, if/else branches, loops and match arms; a statement may
//! nest several matches. Facts are reported per method, deduplicated
//! and sorted lexically after qualification.

use std::collections::BTreeMap;
use std::path::Path;

use syn::{Expr, ImplItem, Item, Stmt};

use crate::context::{ERROR_FACTORY_FNS, ERROR_FACTORY_MODULE};
use crate::error::{Result, SyncError};
use crate::reconcile::inspect::receiver_name;

/// One extracted (package alias, code symbol) pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ErrorFact {
    pub pkg: String,
    pub code: String,
}

impl ErrorFact {
    /// Schema-side rendering: unqualified for the document's own
    /// package, dot-qualified otherwise.
    pub fn qualify(&self, package: &str) -> String {
        if self.pkg == package {
            self.code.clone()
        } else {
            format!("{}.{}", self.pkg, self.code)
        }
    }
}

/// Extract error facts from every method of `receiver` in one file.
/// Returns method name -> qualified, deduplicated, sorted codes.
pub fn extract_file(
    path: &Path,
    receiver: &str,
    package: &str,
) -> Result<BTreeMap<String, Vec<String>>> {
    let source = std::fs::read_to_string(path)?;
    extract_source(path, &source, receiver, package)
}

/// Extract error facts from a source string.
pub fn extract_source(
    path: &Path,
    source: &str,
    receiver: &str,
    package: &str,
) -> Result<BTreeMap<String, Vec<String>>> {
    let file = syn::parse_file(source).map_err(|e| SyncError::TargetParse {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut by_method = BTreeMap::new();
    for item in &file.items {
        let Item::Impl(block) = item else { continue };
        if block.trait_.is_some() || receiver_name(&block.self_ty).as_deref() != Some(receiver) {
            continue;
        }
        for impl_item in &block.items {
            let ImplItem::Fn(f) = impl_item else { continue };
            let mut facts = Vec::new();
            scan_block(&f.block, &mut facts);
            if facts.is_empty() {
                continue;
            }
            let mut codes: Vec<String> = facts.iter().map(|f| f.qualify(package)).collect();
            codes.sort();
            codes.dedup();
            by_method.insert(f.sig.ident.to_string(), codes);
        }
    }
    Ok(by_method)
}

fn scan_block(block: &syn::Block, facts: &mut Vec<ErrorFact>) {
    for stmt in &block.stmts {
        scan_stmt(stmt, facts);
    }
}

fn scan_stmt(stmt: &Stmt, facts: &mut Vec<ErrorFact>) {
    match stmt {
        Stmt::Local(local) => {
            if let Some(init) = &local.init {
                scan_expr(&init.expr, facts);
                if let Some((_, diverge)) = &init.diverge {
                    scan_expr(diverge, facts);
                }
            }
        }
        Stmt::Expr(expr, _) => scan_expr(expr, facts),
        _ => {}
    }
}

fn scan_expr(expr: &Expr, facts: &mut Vec<ErrorFact>) {
    match expr {
        Expr::Call(call) => {
            if let Some(fact) = match_call(call) {
                facts.push(fact);
            } else {
                // wrapper calls (`Err(..)`, `Ok(..)`) carry the factory
                // call in their arguments
                for arg in &call.args {
                    scan_expr(arg, facts);
                }
            }
        }
        Expr::Assign(assign) => scan_expr(&assign.right, facts),
        Expr::Return(ret) => {
            if let Some(inner) = &ret.expr {
                scan_expr(inner, facts);
            }
        }
        Expr::If(branch) => {
            scan_block(&branch.then_branch, facts);
            if let Some((_, else_branch)) = &branch.else_branch {
                scan_expr(else_branch, facts);
            }
        }
        Expr::ForLoop(l) => scan_block(&l.body, facts),
        Expr::While(l) => scan_block(&l.body, facts),
        Expr::Loop(l) => scan_block(&l.body, facts),
        Expr::Match(m) => {
            for arm in &m.arms {
                scan_expr(&arm.body, facts);
            }
        }
        Expr::Block(b) => scan_block(&b.block, facts),
        _ => {}
    }
}

/// Match the `core::create_error(pkg::CODE, ..)` call shape.
fn match_call(call: &syn::ExprCall) -> Option<ErrorFact> {
    let Expr::Path(func) = call.func.as_ref() else {
        return None;
    };
    let segments: Vec<String> = func
        .path
        .segments
        .iter()
        .map(|s| s.ident.to_string())
        .collect();
    if segments.len() != 2
        || segments[0] != ERROR_FACTORY_MODULE
        || !ERROR_FACTORY_FNS.contains(&segments[1].as_str())
    {
        return None;
    }

    let Expr::Path(arg) = call.args.first()? else {
        return None;
    };
    let arg_segments: Vec<String> = arg
        .path
        .segments
        .iter()
        .map(|s| s.ident.to_string())
        .collect();
    if arg_segments.len() != 2 {
        return None;
    }
    Some(ErrorFact {
        pkg: arg_segments[0].clone(),
        code: arg_segments[1].clone(),
    })
}
