//! The expression pool: arena, interning and per-node memo state.
//!
//! One pool owns every node of one compilation unit. Nodes are interned by
//! unique key, so structurally identical sub-expressions share a single
//! entry and are resolved and watched once. All references between nodes
//! are [`ExprId`]s into the arena.

use rowan::TextRange;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{PoolError, ResolveError};
use crate::expr::{
    BinaryOp, DeclaredType, Expr, ExprId, ExprKind, IdentifierBuilder, LiteralKind, UnaryOp,
};
use crate::model::ImportTable;
use crate::ty::TypeDesc;

/// What a resolved node denotes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// A runtime value of the given type.
    Value(TypeDesc),
    /// A class reference: a static receiver or a qualified class path.
    TypeRef(TypeDesc),
}

impl Resolution {
    pub fn ty(&self) -> &TypeDesc {
        match self {
            Resolution::Value(ty) | Resolution::TypeRef(ty) => ty,
        }
    }

    pub fn is_type_ref(&self) -> bool {
        matches!(self, Resolution::TypeRef(_))
    }
}

/// A root binding expression registered with the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Root {
    pub id: ExprId,
    pub span: Option<TextRange>,
}

/// Mutable side-table entry for one node. The node itself never changes.
#[derive(Clone, Debug, Default)]
pub(crate) struct NodeState {
    /// Structural estimate at intern time, refined once the node resolves.
    pub(crate) dynamic: bool,
    /// The node's receiver was claimed as a class, not read as a value.
    pub(crate) static_receiver: bool,
    pub(crate) outcome: Option<Result<Resolution, ResolveError>>,
    pub(crate) dependencies: Option<FxHashSet<ExprId>>,
}

/// Arena of the expression nodes of one compilation unit.
#[derive(Debug, Default)]
pub struct ExprPool {
    nodes: Vec<Expr>,
    by_key: FxHashMap<String, ExprId>,
    imports: ImportTable,
    roots: Vec<Root>,
    spans: FxHashMap<ExprId, TextRange>,
    pub(crate) states: Vec<NodeState>,
}

impl ExprPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_imports(imports: ImportTable) -> Self {
        ExprPool {
            imports,
            ..Self::default()
        }
    }

    pub fn imports(&self) -> &ImportTable {
        &self.imports
    }

    // ── Interning ───────────────────────────────────────────────────────

    /// Publish a candidate node, or return the existing node with the same
    /// unique key (the candidate is then discarded).
    ///
    /// Declared identifiers only arrive here through [`ExprPool::declare`],
    /// which rejects conflicts first.
    pub(crate) fn intern(&mut self, candidate: ExprKind) -> ExprId {
        let key = candidate.compute_unique_key(self);
        if let Some(&existing) = self.by_key.get(&key) {
            tracing::trace!(key = %key, id = existing.0, "reused interned expression");
            return existing;
        }

        let dynamic = match &candidate {
            ExprKind::Identifier { .. } => true,
            ExprKind::Literal { .. } => false,
            other => other
                .children()
                .iter()
                .any(|child| self.states[child.index()].dynamic),
        };
        let id = ExprId(self.nodes.len() as u32);
        tracing::debug!(key = %key, id = id.0, "interned expression");
        self.by_key.insert(key.clone(), id);
        self.nodes.push(Expr {
            key,
            kind: candidate,
        });
        self.states.push(NodeState {
            dynamic,
            ..NodeState::default()
        });
        id
    }

    /// A bare identifier; returns the declared variable if one exists.
    pub fn identifier(&mut self, name: &str) -> ExprId {
        self.intern(IdentifierBuilder::new(name).build())
    }

    /// Declare a variable with its type.
    ///
    /// Redeclaring with the same type returns the existing node. A name that
    /// was already published as a bare identifier cannot be declared any
    /// more: its node is immutable.
    pub fn declare(&mut self, name: &str, type_name: &str) -> Result<ExprId, PoolError> {
        let candidate = IdentifierBuilder::new(name).declared_type(type_name).build();
        let key = candidate.compute_unique_key(self);
        if let Some(&existing) = self.by_key.get(&key) {
            return match &self.get(existing).kind {
                ExprKind::Identifier {
                    declared: DeclaredType::Declared(existing_ty),
                    ..
                } if existing_ty == type_name => Ok(existing),
                ExprKind::Identifier {
                    declared: DeclaredType::Declared(existing_ty),
                    ..
                } => Err(PoolError::AlreadyDeclared {
                    name: name.to_string(),
                    existing: existing_ty.clone(),
                    requested: type_name.to_string(),
                }),
                _ => Err(PoolError::DeclaredAfterUse {
                    name: name.to_string(),
                }),
            };
        }
        Ok(self.intern(candidate))
    }

    pub fn literal(&mut self, kind: LiteralKind, text: &str) -> ExprId {
        self.intern(ExprKind::Literal {
            kind,
            text: text.to_string(),
        })
    }

    pub fn field_access(&mut self, target: ExprId, field: &str) -> ExprId {
        self.intern(ExprKind::FieldAccess {
            target,
            field: field.to_string(),
        })
    }

    pub fn method_call(&mut self, target: ExprId, method: &str, args: Vec<ExprId>) -> ExprId {
        self.intern(ExprKind::MethodCall {
            target,
            method: method.to_string(),
            args,
        })
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.intern(ExprKind::Binary { op, lhs, rhs })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        self.intern(ExprKind::Unary { op, operand })
    }

    pub fn ternary(&mut self, condition: ExprId, then_branch: ExprId, else_branch: ExprId) -> ExprId {
        self.intern(ExprKind::Ternary {
            condition,
            then_branch,
            else_branch,
        })
    }

    // ── Roots and spans ─────────────────────────────────────────────────

    /// Register a root binding expression. Registering the same node twice
    /// keeps the first registration.
    pub fn add_root(&mut self, id: ExprId, span: Option<TextRange>) {
        if self.roots.iter().any(|root| root.id == id) {
            return;
        }
        self.roots.push(Root { id, span });
    }

    pub fn roots(&self) -> &[Root] {
        &self.roots
    }

    /// Record where a node occurs in the source. The first occurrence wins,
    /// so diagnostics for a shared node are stable.
    pub fn record_span(&mut self, id: ExprId, span: TextRange) {
        self.spans.entry(id).or_insert(span);
    }

    pub fn span(&self, id: ExprId) -> Option<TextRange> {
        self.spans.get(&id).copied()
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()]
    }

    pub fn key(&self, id: ExprId) -> &str {
        &self.nodes[id.index()].key
    }

    pub fn find(&self, key: &str) -> Option<ExprId> {
        self.by_key.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the node's value can change at runtime.
    ///
    /// Identifiers are always dynamic and literals never are. A composite is
    /// dynamic when a child it reads as a value is; once resolved, a node
    /// that names a class is not.
    pub fn is_dynamic(&self, id: ExprId) -> bool {
        self.states[id.index()].dynamic
    }

    /// The memoized resolution outcome, if resolution succeeded.
    pub fn resolution(&self, id: ExprId) -> Option<&Resolution> {
        match &self.states[id.index()].outcome {
            Some(Ok(resolution)) => Some(resolution),
            _ => None,
        }
    }

    pub fn resolved_type(&self, id: ExprId) -> Option<&TypeDesc> {
        self.resolution(id).map(Resolution::ty)
    }

    /// The memoized failure of a node that could not be resolved. The node
    /// stays in the pool; repeated diagnostics report the same error.
    pub fn failure(&self, id: ExprId) -> Option<&ResolveError> {
        match &self.states[id.index()].outcome {
            Some(Err(err)) => Some(err),
            _ => None,
        }
    }

    /// Sort node handles into the canonical (unique key) order.
    pub fn sort_canonical(&self, ids: &mut [ExprId]) {
        ids.sort_by(|a, b| self.key(*a).cmp(self.key(*b)));
    }
}
