//! Dependency extraction.
//!
//! A node's dependency set is the set of dynamic nodes whose change may change
//! the node's value: the union of its value children's sets plus every value
//! child that is itself dynamic. Identifiers have an empty set of their own;
//! they are what their parents collect.
//!
//! [`DependencyGraph`] applies this to every registered root and keeps the
//! reverse edges the code generator needs to emit one observer per distinct
//! dynamic leaf.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::error::ResolveError;
use crate::expr::{ExprId, ExprKind};
use crate::model::TypeModel;
use crate::pool::{ExprPool, Resolution};
use crate::ty::TypeDesc;

impl ExprPool {
    /// Children read as runtime values.
    ///
    /// Receivers claimed as classes and the segments of a qualified class
    /// path are not values and are excluded.
    pub(crate) fn value_children(&self, id: ExprId) -> Vec<ExprId> {
        if self.resolution(id).is_some_and(Resolution::is_type_ref) {
            return Vec::new();
        }
        let static_receiver = self.states[id.index()].static_receiver;
        match self.get(id).kind() {
            ExprKind::FieldAccess { target, .. } => {
                if static_receiver {
                    Vec::new()
                } else {
                    vec![*target]
                }
            }
            ExprKind::MethodCall { target, args, .. } => {
                let mut children = Vec::with_capacity(args.len() + 1);
                if !static_receiver {
                    children.push(*target);
                }
                children.extend(args.iter().copied());
                children
            }
            kind => kind.children(),
        }
    }

    /// The dependency set of `id`.
    ///
    /// Whether a receiver is a value is only known once the node is
    /// resolved, so the set is memoized from then on. Before that it is a
    /// structural estimate and is recomputed on every call.
    pub fn construct_dependencies(&mut self, id: ExprId) -> FxHashSet<ExprId> {
        if let Some(deps) = &self.states[id.index()].dependencies {
            return deps.clone();
        }
        let mut deps = FxHashSet::default();
        for child in self.value_children(id) {
            deps.extend(self.construct_dependencies(child));
            if self.is_dynamic(child) {
                deps.insert(child);
            }
        }
        if self.states[id.index()].outcome.is_some() {
            self.states[id.index()].dependencies = Some(deps.clone());
        }
        deps
    }
}

/// A root that resolved, with its canonically ordered dependencies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootDeps {
    pub id: ExprId,
    pub ty: TypeDesc,
    /// Every dynamic node the root reads, ordered by unique key.
    pub dependencies: Vec<ExprId>,
    /// The identifier subset of `dependencies`.
    pub leaves: Vec<ExprId>,
}

/// Per-root dependency sets of one pool, plus reverse edges.
///
/// Roots that fail to resolve are kept apart with their error; they do not
/// take part in the graph and do not affect their siblings.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    roots: Vec<RootDeps>,
    index: FxHashMap<ExprId, usize>,
    failures: Vec<(ExprId, ResolveError)>,
    dependents: FxHashMap<ExprId, Vec<ExprId>>,
    observers: Vec<ExprId>,
}

impl DependencyGraph {
    /// Resolve every root registered with `pool` and collect its
    /// dependencies.
    ///
    /// A root that is itself an identifier depends on itself: it is the one
    /// dynamic leaf reachable from it.
    pub fn build(pool: &mut ExprPool, model: &dyn TypeModel) -> DependencyGraph {
        let mut graph = DependencyGraph::default();
        let roots: Vec<ExprId> = pool.roots().iter().map(|root| root.id).collect();

        for id in roots {
            let ty = match pool.resolve_value(id, model) {
                Ok(ty) => ty,
                Err(err) => {
                    debug!(key = pool.key(id), error = %err, "binding expression failed to resolve");
                    graph.failures.push((id, err));
                    continue;
                }
            };

            let mut deps: Vec<ExprId> = pool.construct_dependencies(id).into_iter().collect();
            if pool.get(id).identifier_name().is_some() {
                deps.push(id);
            }
            pool.sort_canonical(&mut deps);
            let leaves: Vec<ExprId> = deps
                .iter()
                .copied()
                .filter(|dep| pool.get(*dep).identifier_name().is_some())
                .collect();
            debug!(key = pool.key(id), dependencies = deps.len(), leaves = leaves.len(), "collected dependencies");

            for dep in &deps {
                graph.dependents.entry(*dep).or_default().push(id);
            }
            graph.index.insert(id, graph.roots.len());
            graph.roots.push(RootDeps {
                id,
                ty,
                dependencies: deps,
                leaves,
            });
        }

        for dependents in graph.dependents.values_mut() {
            pool.sort_canonical(dependents);
        }
        let distinct: FxHashSet<ExprId> = graph
            .roots
            .iter()
            .flat_map(|root| root.leaves.iter().copied())
            .collect();
        graph.observers = distinct.into_iter().collect();
        pool.sort_canonical(&mut graph.observers);
        graph
    }

    /// The resolved roots, in registration order.
    pub fn roots(&self) -> &[RootDeps] {
        &self.roots
    }

    pub fn root(&self, id: ExprId) -> Option<&RootDeps> {
        self.index.get(&id).map(|&i| &self.roots[i])
    }

    /// Dependencies of a resolved root; empty for unknown or failed roots.
    pub fn dependencies(&self, root: ExprId) -> &[ExprId] {
        self.root(root)
            .map(|r| r.dependencies.as_slice())
            .unwrap_or(&[])
    }

    /// The dynamic identifiers a root reads.
    pub fn leaves(&self, root: ExprId) -> &[ExprId] {
        self.root(root).map(|r| r.leaves.as_slice()).unwrap_or(&[])
    }

    /// Distinct dynamic leaves across all roots, ordered by unique key. The
    /// generator emits one observer for each.
    pub fn observers(&self) -> &[ExprId] {
        &self.observers
    }

    /// Roots to re-evaluate when `node` changes, ordered by unique key.
    pub fn dependents(&self, node: ExprId) -> &[ExprId] {
        self.dependents
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Roots that failed, in registration order.
    pub fn failures(&self) -> &[(ExprId, ResolveError)] {
        &self.failures
    }
}
