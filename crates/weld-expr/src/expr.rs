//! Expression nodes.
//!
//! Nodes form a closed set of variants ([`ExprKind`]) stored in an
//! [`ExprPool`](crate::pool::ExprPool) arena and referencing each other by
//! [`ExprId`]. A node never changes once published: its kind, children and
//! declared type are fixed at construction, and its unique key is computed
//! once when it is interned.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pool::ExprPool;
use crate::ty::TypeDesc;

/// A handle to a node in an [`ExprPool`]. Only meaningful for the pool that
/// issued it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ExprId(pub u32);

impl ExprId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Whether an identifier carries a user-declared type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclaredType {
    /// Declared by a markup-level variable declaration.
    Declared(String),
    /// A bare name: either an undefined variable or the head of a
    /// package/class path, decided by the enclosing expression.
    Undeclared,
}

impl DeclaredType {
    pub fn type_name(&self) -> Option<&str> {
        match self {
            DeclaredType::Declared(name) => Some(name),
            DeclaredType::Undeclared => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralKind {
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    Boolean,
    Null,
}

impl LiteralKind {
    /// The static type of a literal of this kind.
    pub fn ty(self) -> TypeDesc {
        match self {
            LiteralKind::Int => TypeDesc::int(),
            LiteralKind::Long => TypeDesc::long(),
            LiteralKind::Float => TypeDesc::float(),
            LiteralKind::Double => TypeDesc::double(),
            LiteralKind::Char => TypeDesc::char(),
            LiteralKind::String => TypeDesc::string(),
            LiteralKind::Boolean => TypeDesc::boolean(),
            LiteralKind::Null => TypeDesc::null(),
        }
    }

    fn tag(self) -> &'static str {
        match self {
            LiteralKind::Int => "int",
            LiteralKind::Long => "long",
            LiteralKind::Float => "float",
            LiteralKind::Double => "double",
            LiteralKind::Char => "char",
            LiteralKind::String => "string",
            LiteralKind::Boolean => "boolean",
            LiteralKind::Null => "null",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Rem,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "|")]
    BitOr,
    #[serde(rename = "^")]
    BitXor,
    #[serde(rename = "<<")]
    Shl,
    #[serde(rename = ">>")]
    Shr,
    #[serde(rename = ">>>")]
    UShr,
    /// Null-coalescing `a ?? b`.
    #[serde(rename = "??")]
    Coalesce,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Coalesce => "??",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "-")]
    Neg,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "~")]
    BitNot,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::BitNot => "~",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The closed set of expression variants.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExprKind {
    /// A bare name.
    Identifier { name: String, declared: DeclaredType },
    /// A literal; `text` is the literal's value as written (strings unquoted).
    Literal { kind: LiteralKind, text: String },
    /// `target.field`; also spells package and class paths.
    FieldAccess { target: ExprId, field: String },
    /// `target.method(args)`.
    MethodCall {
        target: ExprId,
        method: String,
        args: Vec<ExprId>,
    },
    Binary { op: BinaryOp, lhs: ExprId, rhs: ExprId },
    Unary { op: UnaryOp, operand: ExprId },
    /// `condition ? then_branch : else_branch`.
    Ternary {
        condition: ExprId,
        then_branch: ExprId,
        else_branch: ExprId,
    },
}

impl ExprKind {
    /// Compute the structural key of this candidate node.
    ///
    /// The key is built from the kind tag, the node's own scalar data and the
    /// (already interned) children's keys, so it is a pure function of the
    /// expression's structure. Identifier keys carry the name only: a unit
    /// declares each variable once. Names that are not plain identifiers are
    /// quoted so they cannot mimic key syntax.
    pub fn compute_unique_key(&self, pool: &ExprPool) -> String {
        match self {
            ExprKind::Identifier { name, .. } => format!("id({})", key_name(name)),
            ExprKind::Literal { kind, text } => format!("lit:{}({:?})", kind.tag(), text),
            ExprKind::FieldAccess { target, field } => {
                format!("field({}.{})", pool.key(*target), key_name(field))
            }
            ExprKind::MethodCall {
                target,
                method,
                args,
            } => {
                let args: Vec<&str> = args.iter().map(|a| pool.key(*a)).collect();
                format!(
                    "call({}.{}({}))",
                    pool.key(*target),
                    key_name(method),
                    args.join(",")
                )
            }
            ExprKind::Binary { op, lhs, rhs } => {
                format!("bin({} {} {})", pool.key(*lhs), op, pool.key(*rhs))
            }
            ExprKind::Unary { op, operand } => format!("un({}{})", op, pool.key(*operand)),
            ExprKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "tern({} ? {} : {})",
                pool.key(*condition),
                pool.key(*then_branch),
                pool.key(*else_branch)
            ),
        }
    }

    /// All direct children, in source order.
    pub fn children(&self) -> Vec<ExprId> {
        match self {
            ExprKind::Identifier { .. } | ExprKind::Literal { .. } => Vec::new(),
            ExprKind::FieldAccess { target, .. } => vec![*target],
            ExprKind::MethodCall { target, args, .. } => {
                let mut children = Vec::with_capacity(args.len() + 1);
                children.push(*target);
                children.extend(args.iter().copied());
                children
            }
            ExprKind::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            ExprKind::Unary { operand, .. } => vec![*operand],
            ExprKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => vec![*condition, *then_branch, *else_branch],
        }
    }

    /// The name of an undeclared identifier, i.e. a candidate head of a
    /// package/class path. `None` for declared identifiers and for every
    /// composite.
    pub fn as_package_prefix(&self) -> Option<&str> {
        match self {
            ExprKind::Identifier {
                name,
                declared: DeclaredType::Undeclared,
            } => Some(name),
            _ => None,
        }
    }
}

fn is_plain_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn key_name(name: &str) -> Cow<'_, str> {
    if is_plain_name(name) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{:?}", name))
    }
}

/// A published node: its kind and its cached unique key.
#[derive(Clone, Debug)]
pub struct Expr {
    pub(crate) key: String,
    pub(crate) kind: ExprKind,
}

impl Expr {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    pub fn children(&self) -> Vec<ExprId> {
        self.kind.children()
    }

    pub fn as_package_prefix(&self) -> Option<&str> {
        self.kind.as_package_prefix()
    }

    /// The identifier's name, if this is an identifier.
    pub fn identifier_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Identifier { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Two-phase construction of identifier nodes.
///
/// The declared type can only be supplied here, before the node exists, so
/// nothing can change an identifier's type information after it is interned.
#[derive(Clone, Debug)]
pub struct IdentifierBuilder {
    name: String,
    declared: DeclaredType,
}

impl IdentifierBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        IdentifierBuilder {
            name: name.into(),
            declared: DeclaredType::Undeclared,
        }
    }

    pub fn declared_type(mut self, type_name: impl Into<String>) -> Self {
        self.declared = DeclaredType::Declared(type_name.into());
        self
    }

    pub fn build(self) -> ExprKind {
        ExprKind::Identifier {
            name: self.name,
            declared: self.declared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_prefix_only_for_undeclared_identifiers() {
        let bare = IdentifierBuilder::new("android").build();
        let declared = IdentifierBuilder::new("user")
            .declared_type("com.example.User")
            .build();
        let literal = ExprKind::Literal {
            kind: LiteralKind::Int,
            text: "1".into(),
        };
        assert_eq!(bare.as_package_prefix(), Some("android"));
        assert_eq!(declared.as_package_prefix(), None);
        assert_eq!(literal.as_package_prefix(), None);
    }

    #[test]
    fn children_follow_source_order() {
        let call = ExprKind::MethodCall {
            target: ExprId(0),
            method: "max".into(),
            args: vec![ExprId(1), ExprId(2)],
        };
        assert_eq!(call.children(), vec![ExprId(0), ExprId(1), ExprId(2)]);
        let ternary = ExprKind::Ternary {
            condition: ExprId(3),
            then_branch: ExprId(4),
            else_branch: ExprId(5),
        };
        assert_eq!(ternary.children(), vec![ExprId(3), ExprId(4), ExprId(5)]);
    }

    #[test]
    fn names_are_quoted_only_when_needed() {
        assert_eq!(key_name("user"), "user");
        assert_eq!(key_name("_tmp$1"), "_tmp$1");
        assert_eq!(key_name("a b"), "\"a b\"");
        assert_eq!(key_name("1x"), "\"1x\"");
        assert_eq!(key_name(""), "\"\"");
    }

    #[test]
    fn literal_types() {
        assert_eq!(LiteralKind::String.ty(), TypeDesc::string());
        assert_eq!(LiteralKind::Long.ty(), TypeDesc::long());
        assert!(LiteralKind::Null.ty().is_null());
    }
}
