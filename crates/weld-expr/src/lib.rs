//! Weld: the binding-expression graph engine.
//!
//! Compiles the small expressions embedded in layout markup
//! (`user.name`, `a + b`, `android.view.View.VISIBLE`, `flag ? x : y`) into
//! a shared, deduplicated graph, resolves every node's static type against a
//! pluggable type model, and derives for every binding the dynamic values it
//! must observe.
//!
//! # Architecture
//!
//! - [`ty`]: Type descriptors and numeric promotion
//! - [`model`]: The `TypeModel` trait, import tables and an in-memory catalog
//! - [`expr`]: Expression variants, unique keys, two-phase identifiers
//! - [`pool`]: The interning arena owning one unit's nodes
//! - [`resolve`]: Memoized type resolution with package-prefix disambiguation
//! - [`deps`]: Dependency sets and the per-root dependency graph
//! - [`syntax`]: Parsed trees and their lowering into a pool
//! - [`error`]: Resolution and pool errors
//! - [`diagnostics`]: Ariadne rendering of errors

pub mod deps;
pub mod diagnostics;
pub mod error;
pub mod expr;
pub mod model;
pub mod pool;
pub mod resolve;
pub mod syntax;
pub mod ty;

use std::ops::Range;

use rowan::TextRange;
use serde::Serialize;

use crate::deps::DependencyGraph;
use crate::diagnostics::{error_code, render_diagnostic, DiagnosticOptions};
use crate::error::ResolveError;
use crate::expr::ExprId;
use crate::model::TypeModel;
use crate::pool::ExprPool;
use crate::ty::TypeDesc;

/// What the code generator receives for one binding expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RootBinding {
    pub key: String,
    pub ty: TypeDesc,
    /// Unique keys of the dynamic nodes the binding reads, in key order.
    pub dependencies: Vec<String>,
    pub span: Option<Range<usize>>,
}

/// One change listener: a distinct dynamic value and the bindings it
/// invalidates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Observer {
    pub key: String,
    pub name: String,
    pub ty: Option<TypeDesc>,
    pub bindings: Vec<String>,
}

/// A binding expression that failed to resolve.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnitError {
    pub key: String,
    pub code: &'static str,
    pub message: String,
    pub span: Option<Range<usize>>,
    #[serde(skip)]
    pub error: ResolveError,
}

/// The result of compiling one unit, in canonical order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CompiledUnit {
    pub bindings: Vec<RootBinding>,
    pub observers: Vec<Observer>,
    pub errors: Vec<UnitError>,
}

impl CompiledUnit {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Render every error of the unit against its source.
    pub fn render_errors(
        &self,
        source: &str,
        filename: &str,
        options: &DiagnosticOptions,
    ) -> Vec<String> {
        self.errors
            .iter()
            .map(|err| render_diagnostic(&err.error, source, filename, options))
            .collect()
    }
}

fn to_range(range: TextRange) -> Range<usize> {
    range.start().into()..range.end().into()
}

fn keys(pool: &ExprPool, ids: &[ExprId]) -> Vec<String> {
    ids.iter().map(|id| pool.key(*id).to_string()).collect()
}

/// Resolve and analyze every root registered with `pool`.
///
/// Bindings are sorted by unique key; a binding registered twice appears
/// once. Failed bindings are reported in `errors` and do not affect the
/// others.
pub fn compile_unit(pool: &mut ExprPool, model: &dyn TypeModel) -> CompiledUnit {
    let graph = DependencyGraph::build(pool, model);
    let pool: &ExprPool = pool;
    let span_of = |id: ExprId| {
        pool.roots()
            .iter()
            .find(|root| root.id == id)
            .and_then(|root| root.span)
            .map(to_range)
    };

    let mut bindings: Vec<RootBinding> = graph
        .roots()
        .iter()
        .map(|root| RootBinding {
            key: pool.key(root.id).to_string(),
            ty: root.ty.clone(),
            dependencies: keys(pool, &root.dependencies),
            span: span_of(root.id),
        })
        .collect();
    bindings.sort_by(|a, b| a.key.cmp(&b.key));

    let observers = graph
        .observers()
        .iter()
        .map(|&leaf| Observer {
            key: pool.key(leaf).to_string(),
            name: pool.get(leaf).identifier_name().unwrap_or_default().to_string(),
            ty: pool.resolved_type(leaf).cloned(),
            bindings: keys(pool, graph.dependents(leaf)),
        })
        .collect();

    let mut errors: Vec<UnitError> = graph
        .failures()
        .iter()
        .map(|(id, err)| UnitError {
            key: pool.key(*id).to_string(),
            code: error_code(err),
            message: err.to_string(),
            span: err.span().map(to_range).or_else(|| span_of(*id)),
            error: err.clone(),
        })
        .collect();
    errors.sort_by(|a, b| a.key.cmp(&b.key));

    CompiledUnit {
        bindings,
        observers,
        errors,
    }
}
