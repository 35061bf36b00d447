//! Resolution and pool errors.
//!
//! Every resolution error names the offending identifier (or member, or
//! operator) and carries the source span of the failing node's first
//! occurrence, when the syntax tree supplied one.

use std::fmt;

use rowan::TextRange;

use crate::ty::TypeDesc;

/// An error raised while resolving the type of an expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// An identifier without a declared type that no enclosing expression
    /// could interpret as a package or class path.
    UndefinedVariable {
        name: String,
        span: Option<TextRange>,
    },
    /// A declared type name that the model cannot find under the unit's
    /// imports.
    TypeNotFound {
        name: String,
        type_name: String,
        span: Option<TextRange>,
    },
    /// A value was required, but the expression only names a package or
    /// class.
    AmbiguousPackageOrValue {
        name: String,
        span: Option<TextRange>,
    },
    /// Field access on a type with no such field or getter.
    NoSuchField {
        owner: TypeDesc,
        field: String,
        span: Option<TextRange>,
    },
    /// Method call on a type with no matching method.
    NoSuchMethod {
        owner: TypeDesc,
        method: String,
        args: Vec<TypeDesc>,
        span: Option<TextRange>,
    },
    /// An operator applied to operand types it does not accept.
    OperatorMismatch {
        op: String,
        operands: Vec<TypeDesc>,
        span: Option<TextRange>,
    },
}

impl ResolveError {
    /// The name the error is about: a variable, type, member or operator.
    pub fn name(&self) -> &str {
        match self {
            ResolveError::UndefinedVariable { name, .. }
            | ResolveError::TypeNotFound { name, .. }
            | ResolveError::AmbiguousPackageOrValue { name, .. } => name,
            ResolveError::NoSuchField { field, .. } => field,
            ResolveError::NoSuchMethod { method, .. } => method,
            ResolveError::OperatorMismatch { op, .. } => op,
        }
    }

    pub fn span(&self) -> Option<TextRange> {
        match self {
            ResolveError::UndefinedVariable { span, .. }
            | ResolveError::TypeNotFound { span, .. }
            | ResolveError::AmbiguousPackageOrValue { span, .. }
            | ResolveError::NoSuchField { span, .. }
            | ResolveError::NoSuchMethod { span, .. }
            | ResolveError::OperatorMismatch { span, .. } => *span,
        }
    }
}

fn join_types(types: &[TypeDesc]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::UndefinedVariable { name, .. } => {
                write!(f, "undefined variable `{}`", name)
            }
            ResolveError::TypeNotFound {
                name, type_name, ..
            } => {
                write!(
                    f,
                    "cannot find type `{}` declared for variable `{}`",
                    type_name, name
                )
            }
            ResolveError::AmbiguousPackageOrValue { name, .. } => {
                write!(
                    f,
                    "`{}` names a package or class, but a value is expected here",
                    name
                )
            }
            ResolveError::NoSuchField { owner, field, .. } => {
                write!(f, "type `{}` has no field or getter `{}`", owner, field)
            }
            ResolveError::NoSuchMethod {
                owner,
                method,
                args,
                ..
            } => {
                write!(
                    f,
                    "no method `{}({})` on type `{}`",
                    method,
                    join_types(args),
                    owner
                )
            }
            ResolveError::OperatorMismatch { op, operands, .. } => {
                write!(
                    f,
                    "operator `{}` cannot be applied to `{}`",
                    op,
                    join_types(operands)
                )
            }
        }
    }
}

impl std::error::Error for ResolveError {}

/// Misuse of the pool's construction API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolError {
    /// The variable was already declared with a different type.
    AlreadyDeclared {
        name: String,
        existing: String,
        requested: String,
    },
    /// The name was published as a bare identifier before its declaration.
    DeclaredAfterUse { name: String },
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::AlreadyDeclared {
                name,
                existing,
                requested,
            } => write!(
                f,
                "variable `{}` is already declared as `{}`, cannot redeclare as `{}`",
                name, existing, requested
            ),
            PoolError::DeclaredAfterUse { name } => {
                write!(f, "variable `{}` is declared after it was used", name)
            }
        }
    }
}

impl std::error::Error for PoolError {}
