//! Type resolution.
//!
//! Resolution is a post-order walk over the pool with one memo entry per
//! node: the first outcome (success or failure) is stored and returned for
//! every later request, so each distinct expression queries the type model
//! once no matter how many parents share it.
//!
//! Bare names are the interesting case. An undeclared identifier never
//! resolves by itself; an enclosing field access or method call may claim it
//! as the head of a package or class path first:
//!
//! 1. `path.field` is tried as a fully-qualified type name;
//! 2. otherwise the target is resolved as a receiver, where an undeclared
//!    identifier may still name a class (`View.VISIBLE`, `Math.max(a, b)`);
//! 3. otherwise the identifier is an undefined variable (or, when it names a
//!    class but sits where a value is needed, an ambiguous one).

use tracing::debug;

use crate::error::ResolveError;
use crate::expr::{BinaryOp, DeclaredType, ExprId, ExprKind, UnaryOp};
use crate::model::TypeModel;
use crate::pool::{ExprPool, Resolution};
use crate::ty::{binary_promotion, unary_promotion, TypeDesc};

impl ExprPool {
    /// Resolve the static type of a node.
    ///
    /// Returns the value type, or the named class for nodes that denote a
    /// class (see [`ExprPool::resolution`] to tell them apart). The pool is
    /// bound to one model: the outcome is memoized per node, not per model.
    pub fn resolve_type(
        &mut self,
        id: ExprId,
        model: &dyn TypeModel,
    ) -> Result<TypeDesc, ResolveError> {
        self.resolve(id, model).map(|resolution| resolution.ty().clone())
    }

    /// Resolve a node that must denote a runtime value.
    ///
    /// A node that only names a package or class fails with
    /// [`ResolveError::AmbiguousPackageOrValue`].
    pub fn resolve_value(
        &mut self,
        id: ExprId,
        model: &dyn TypeModel,
    ) -> Result<TypeDesc, ResolveError> {
        match self.resolve(id, model)? {
            Resolution::Value(ty) => Ok(ty),
            Resolution::TypeRef(ty) => Err(ResolveError::AmbiguousPackageOrValue {
                name: self.package_path(id).unwrap_or(ty.name),
                span: self.span(id),
            }),
        }
    }

    /// The dotted path spelled by an undeclared identifier, or by a chain of
    /// field accesses whose head is one (`android.view.View`).
    pub fn package_path(&self, id: ExprId) -> Option<String> {
        let expr = self.get(id);
        if let Some(name) = expr.as_package_prefix() {
            return Some(name.to_string());
        }
        match expr.kind() {
            ExprKind::FieldAccess { target, field } => self
                .package_path(*target)
                .map(|path| format!("{}.{}", path, field)),
            _ => None,
        }
    }

    pub(crate) fn resolve(
        &mut self,
        id: ExprId,
        model: &dyn TypeModel,
    ) -> Result<Resolution, ResolveError> {
        if let Some(outcome) = &self.states[id.index()].outcome {
            return outcome.clone();
        }

        let outcome = self.resolve_uncached(id, model);
        match &outcome {
            Ok(resolution) => {
                debug!(key = self.key(id), ty = %resolution.ty(), type_ref = resolution.is_type_ref(), "resolved expression");
            }
            Err(err) => {
                debug!(key = self.key(id), error = %err, "failed to resolve expression");
            }
        }
        self.states[id.index()].outcome = Some(outcome.clone());
        if outcome.is_ok() {
            self.refine_dynamic(id);
        }
        outcome
    }

    fn resolve_uncached(
        &mut self,
        id: ExprId,
        model: &dyn TypeModel,
    ) -> Result<Resolution, ResolveError> {
        let span = self.span(id);
        match self.get(id).kind().clone() {
            ExprKind::Identifier { name, declared } => match declared {
                DeclaredType::Declared(type_name) => model
                    .find_type(&type_name, self.imports())
                    .map(Resolution::Value)
                    .map_err(|_| ResolveError::TypeNotFound {
                        name,
                        type_name,
                        span,
                    }),
                // Receivers claim class names before they get here, so a bare
                // name reaching this point is always read as a value.
                DeclaredType::Undeclared => {
                    if model.find_type(&name, self.imports()).is_ok() {
                        Err(ResolveError::AmbiguousPackageOrValue { name, span })
                    } else {
                        Err(ResolveError::UndefinedVariable { name, span })
                    }
                }
            },
            ExprKind::Literal { kind, .. } => Ok(Resolution::Value(kind.ty())),
            ExprKind::FieldAccess { target, field } => {
                self.resolve_field_access(id, target, &field, model)
            }
            ExprKind::MethodCall {
                target,
                method,
                args,
            } => {
                let owner = self.resolve_receiver(id, target, model)?;
                let mut arg_types = Vec::with_capacity(args.len());
                for arg in args {
                    arg_types.push(self.resolve_value(arg, model)?);
                }
                match model.method_return_type(&owner, &method, &arg_types) {
                    Some(ty) => Ok(Resolution::Value(ty)),
                    None => Err(ResolveError::NoSuchMethod {
                        owner,
                        method,
                        args: arg_types,
                        span,
                    }),
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let l = self.resolve_value(lhs, model)?;
                let r = self.resolve_value(rhs, model)?;
                match binary_type(op, &l, &r) {
                    Some(ty) => Ok(Resolution::Value(ty)),
                    None => Err(ResolveError::OperatorMismatch {
                        op: op.symbol().to_string(),
                        operands: vec![l, r],
                        span,
                    }),
                }
            }
            ExprKind::Unary { op, operand } => {
                let ty = self.resolve_value(operand, model)?;
                match unary_type(op, &ty) {
                    Some(ty) => Ok(Resolution::Value(ty)),
                    None => Err(ResolveError::OperatorMismatch {
                        op: op.symbol().to_string(),
                        operands: vec![ty],
                        span,
                    }),
                }
            }
            ExprKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                let cond = self.resolve_value(condition, model)?;
                if !cond.is_boolean() {
                    return Err(ResolveError::OperatorMismatch {
                        op: "?:".to_string(),
                        operands: vec![cond],
                        span,
                    });
                }
                let then_ty = self.resolve_value(then_branch, model)?;
                let else_ty = self.resolve_value(else_branch, model)?;
                match ternary_type(&then_ty, &else_ty) {
                    Some(ty) => Ok(Resolution::Value(ty)),
                    None => Err(ResolveError::OperatorMismatch {
                        op: "?:".to_string(),
                        operands: vec![cond, then_ty, else_ty],
                        span,
                    }),
                }
            }
        }
    }

    fn resolve_field_access(
        &mut self,
        id: ExprId,
        target: ExprId,
        field: &str,
        model: &dyn TypeModel,
    ) -> Result<Resolution, ResolveError> {
        // A qualified class name takes precedence over member access. The
        // identifiers along the path stay unresolved.
        if let Some(path) = self.package_path(target) {
            let qualified = format!("{}.{}", path, field);
            if let Ok(ty) = model.find_type(&qualified, self.imports()) {
                return Ok(Resolution::TypeRef(ty));
            }
        }

        let owner = self.resolve_receiver(id, target, model)?;
        if let Some(ty) = model.field_type(&owner, field) {
            return Ok(Resolution::Value(ty));
        }
        let capitalized = capitalize(field);
        if let Some(ty) = model.method_return_type(&owner, &format!("get{}", capitalized), &[]) {
            return Ok(Resolution::Value(ty));
        }
        if let Some(ty) = model.method_return_type(&owner, &format!("is{}", capitalized), &[]) {
            if ty.is_boolean() {
                return Ok(Resolution::Value(ty));
            }
        }
        Err(ResolveError::NoSuchField {
            owner,
            field: field.to_string(),
            span: self.span(id),
        })
    }

    /// Resolve the target of a member access on behalf of `parent`.
    ///
    /// A receiver is either a value or a class. When it is a class, `parent`
    /// is marked as having a static receiver so the receiver is not read as a
    /// dependency.
    fn resolve_receiver(
        &mut self,
        parent: ExprId,
        target: ExprId,
        model: &dyn TypeModel,
    ) -> Result<TypeDesc, ResolveError> {
        if let Some(name) = self.get(target).as_package_prefix() {
            if let Ok(ty) = model.find_type(name, self.imports()) {
                self.states[parent.index()].static_receiver = true;
                return Ok(ty);
            }
        }
        match self.resolve(target, model)? {
            Resolution::Value(ty) => Ok(ty),
            Resolution::TypeRef(ty) => {
                self.states[parent.index()].static_receiver = true;
                Ok(ty)
            }
        }
    }

    /// Recompute the dynamic flag from the resolved shape of the node.
    fn refine_dynamic(&mut self, id: ExprId) {
        let dynamic = match self.get(id).kind() {
            ExprKind::Identifier { .. } => true,
            ExprKind::Literal { .. } => false,
            _ if self.resolution(id).is_some_and(Resolution::is_type_ref) => false,
            _ => self
                .value_children(id)
                .into_iter()
                .any(|child| self.is_dynamic(child)),
        };
        self.states[id.index()].dynamic = dynamic;
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Result type of a binary operator, or `None` when the operands do not fit.
pub fn binary_type(op: BinaryOp, lhs: &TypeDesc, rhs: &TypeDesc) -> Option<TypeDesc> {
    match op {
        BinaryOp::Add if lhs.is_string() || rhs.is_string() => Some(TypeDesc::string()),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            binary_promotion(lhs, rhs)
        }
        BinaryOp::Eq | BinaryOp::Ne => Some(TypeDesc::boolean()),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            binary_promotion(lhs, rhs).map(|_| TypeDesc::boolean())
        }
        BinaryOp::And | BinaryOp::Or => {
            (lhs.is_boolean() && rhs.is_boolean()).then(TypeDesc::boolean)
        }
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
            if lhs.is_boolean() && rhs.is_boolean() {
                Some(TypeDesc::boolean())
            } else if lhs.is_integral() && rhs.is_integral() {
                binary_promotion(lhs, rhs)
            } else {
                None
            }
        }
        BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => {
            if lhs.is_integral() && rhs.is_integral() {
                unary_promotion(lhs)
            } else {
                None
            }
        }
        BinaryOp::Coalesce => {
            if lhs.is_null() {
                Some(rhs.clone())
            } else {
                Some(lhs.clone())
            }
        }
    }
}

/// Result type of a unary operator.
pub fn unary_type(op: UnaryOp, operand: &TypeDesc) -> Option<TypeDesc> {
    match op {
        UnaryOp::Not => operand.is_boolean().then(TypeDesc::boolean),
        UnaryOp::Neg | UnaryOp::Plus => unary_promotion(operand),
        UnaryOp::BitNot => {
            if operand.is_integral() {
                unary_promotion(operand)
            } else {
                None
            }
        }
    }
}

/// Result type of `cond ? then : else` given both branch types.
pub fn ternary_type(then_ty: &TypeDesc, else_ty: &TypeDesc) -> Option<TypeDesc> {
    if then_ty == else_ty {
        return Some(then_ty.clone());
    }
    if let Some(ty) = binary_promotion(then_ty, else_ty) {
        return Some(ty);
    }
    match (then_ty.is_null(), else_ty.is_null()) {
        (true, false) if else_ty.is_reference() => Some(else_ty.clone()),
        (false, true) if then_ty.is_reference() => Some(then_ty.clone()),
        _ => None,
    }
}
