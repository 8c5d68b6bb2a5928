use crate::block::Stmt;
use crate::vars::VarId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastKind {
    /// Value-preserving conversion (qualifier adjustment, decay, ...).
    NoOp,
    /// Lvalue reinterpretation; still refers to the same object.
    LValueBitCast,
    /// Conversion that may change the pointer value.
    PointerConversion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Deref,
    Not,
    AddrOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Assign,
    Comma,
    PtrMemDot,
    PtrMemArrow,
    LogicalAnd,
    LogicalOr,
    Eq,
    Ne,
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Null,
}

/// Expression tree the analysis walks.
///
/// Every shape the classifier and the statement scanner care about is a
/// distinct variant, so matches over expressions are checked for
/// exhaustiveness at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Var(VarId),
    Literal(Literal),
    Paren(Box<Expr>),
    Cast {
        kind: CastKind,
        operand: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// C ternary: `cond ? then_expr : else_expr`.
    Conditional {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// GNU `cond ?: else_expr`; the true branch is the condition itself.
    BinaryConditional {
        cond: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// Opaque intermediate value standing in for an already-evaluated
    /// subexpression; `source` is the expression it was bound from.
    Opaque {
        source: Box<Expr>,
    },
    Member {
        base: Box<Expr>,
        member: String,
        is_static: bool,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// Block literal / lambda. The body is a separate analysis scope and is
    /// never walked by this one.
    Closure {
        body: Vec<Stmt>,
    },
}

impl Expr {
    pub fn var(id: VarId) -> Self {
        Expr::Var(id)
    }

    pub fn int(value: i64) -> Self {
        Expr::Literal(Literal::Int(value))
    }

    pub fn null() -> Self {
        Expr::Literal(Literal::Null)
    }

    pub fn paren(inner: Expr) -> Self {
        Expr::Paren(Box::new(inner))
    }

    pub fn cast(kind: CastKind, operand: Expr) -> Self {
        Expr::Cast {
            kind,
            operand: Box::new(operand),
        }
    }

    pub fn deref(operand: Expr) -> Self {
        Expr::Unary {
            op: UnaryOp::Deref,
            operand: Box::new(operand),
        }
    }

    pub fn not(operand: Expr) -> Self {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }
    }

    pub fn addr_of(operand: Expr) -> Self {
        Expr::Unary {
            op: UnaryOp::AddrOf,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn assign(lhs: Expr, rhs: Expr) -> Self {
        Expr::binary(BinOp::Assign, lhs, rhs)
    }

    pub fn comma(lhs: Expr, rhs: Expr) -> Self {
        Expr::binary(BinOp::Comma, lhs, rhs)
    }

    pub fn ternary(cond: Expr, then_expr: Expr, else_expr: Expr) -> Self {
        Expr::Conditional {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        }
    }

    pub fn elvis(cond: Expr, else_expr: Expr) -> Self {
        Expr::BinaryConditional {
            cond: Box::new(cond),
            else_expr: Box::new(else_expr),
        }
    }

    pub fn opaque(source: Expr) -> Self {
        Expr::Opaque {
            source: Box::new(source),
        }
    }

    pub fn member(base: Expr, member: impl Into<String>) -> Self {
        Expr::Member {
            base: Box::new(base),
            member: member.into(),
            is_static: false,
        }
    }

    pub fn static_member(base: Expr, member: impl Into<String>) -> Self {
        Expr::Member {
            base: Box::new(base),
            member: member.into(),
            is_static: true,
        }
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            args,
        }
    }
}
