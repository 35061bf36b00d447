//! Parsed binding expressions and their lowering into a pool.
//!
//! The engine does not parse. A [`SyntaxExpr`] is the tree a parser hands
//! over, optionally annotated with `[start, end)` byte offsets into the
//! layout source; it deserializes from JSON such as
//!
//! ```json
//! { "kind": "field_access", "field": "name", "span": [0, 9],
//!   "target": { "kind": "identifier", "name": "user", "span": [0, 4] } }
//! ```

use rowan::{TextRange, TextSize};
use serde::{Deserialize, Serialize};

use crate::expr::{BinaryOp, ExprId, LiteralKind, UnaryOp};
use crate::pool::ExprPool;

/// A parsed expression with an optional source span.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxExpr {
    #[serde(flatten)]
    pub node: SyntaxNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<[u32; 2]>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyntaxNode {
    Identifier {
        name: String,
    },
    Literal {
        literal: LiteralKind,
        text: String,
    },
    FieldAccess {
        target: Box<SyntaxExpr>,
        field: String,
    },
    MethodCall {
        target: Box<SyntaxExpr>,
        method: String,
        #[serde(default)]
        args: Vec<SyntaxExpr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<SyntaxExpr>,
        rhs: Box<SyntaxExpr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<SyntaxExpr>,
    },
    Ternary {
        condition: Box<SyntaxExpr>,
        then_branch: Box<SyntaxExpr>,
        else_branch: Box<SyntaxExpr>,
    },
}

impl SyntaxExpr {
    fn new(node: SyntaxNode) -> Self {
        SyntaxExpr { node, span: None }
    }

    pub fn ident(name: &str) -> Self {
        Self::new(SyntaxNode::Identifier {
            name: name.to_string(),
        })
    }

    pub fn literal(literal: LiteralKind, text: &str) -> Self {
        Self::new(SyntaxNode::Literal {
            literal,
            text: text.to_string(),
        })
    }

    pub fn field(self, field: &str) -> Self {
        Self::new(SyntaxNode::FieldAccess {
            target: Box::new(self),
            field: field.to_string(),
        })
    }

    pub fn call(self, method: &str, args: Vec<SyntaxExpr>) -> Self {
        Self::new(SyntaxNode::MethodCall {
            target: Box::new(self),
            method: method.to_string(),
            args,
        })
    }

    pub fn binary(op: BinaryOp, lhs: SyntaxExpr, rhs: SyntaxExpr) -> Self {
        Self::new(SyntaxNode::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    pub fn unary(op: UnaryOp, operand: SyntaxExpr) -> Self {
        Self::new(SyntaxNode::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn ternary(condition: SyntaxExpr, then_branch: SyntaxExpr, else_branch: SyntaxExpr) -> Self {
        Self::new(SyntaxNode::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    /// Attach a `[start, end)` byte span.
    pub fn at(mut self, start: u32, end: u32) -> Self {
        self.span = Some([start, end]);
        self
    }

    /// The span as a text range. Inverted spans are dropped.
    pub fn text_range(&self) -> Option<TextRange> {
        let [start, end] = self.span?;
        (start <= end).then(|| TextRange::new(TextSize::from(start), TextSize::from(end)))
    }
}

/// Intern `expr` bottom-up into `pool`, recording the span of each node's
/// first occurrence.
///
/// Identifiers are looked up by name, so variables declared on the pool
/// beforehand keep their declared type.
pub fn lower(pool: &mut ExprPool, expr: &SyntaxExpr) -> ExprId {
    let id = match &expr.node {
        SyntaxNode::Identifier { name } => pool.identifier(name),
        SyntaxNode::Literal { literal, text } => pool.literal(*literal, text),
        SyntaxNode::FieldAccess { target, field } => {
            let target = lower(pool, target);
            pool.field_access(target, field)
        }
        SyntaxNode::MethodCall {
            target,
            method,
            args,
        } => {
            let target = lower(pool, target);
            let args = args.iter().map(|arg| lower(pool, arg)).collect();
            pool.method_call(target, method, args)
        }
        SyntaxNode::Binary { op, lhs, rhs } => {
            let lhs = lower(pool, lhs);
            let rhs = lower(pool, rhs);
            pool.binary(*op, lhs, rhs)
        }
        SyntaxNode::Unary { op, operand } => {
            let operand = lower(pool, operand);
            pool.unary(*op, operand)
        }
        SyntaxNode::Ternary {
            condition,
            then_branch,
            else_branch,
        } => {
            let condition = lower(pool, condition);
            let then_branch = lower(pool, then_branch);
            let else_branch = lower(pool, else_branch);
            pool.ternary(condition, then_branch, else_branch)
        }
    };
    if let Some(range) = expr.text_range() {
        pool.record_span(id, range);
    }
    id
}

/// Lower `expr` and register it as a root binding.
pub fn lower_root(pool: &mut ExprPool, expr: &SyntaxExpr) -> ExprId {
    let id = lower(pool, expr);
    pool.add_root(id, expr.text_range());
    id
}
