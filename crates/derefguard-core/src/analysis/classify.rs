use crate::expr::{BinOp, CastKind, Expr, UnaryOp};
use crate::vars::{DeclMap, VarId};
use serde::{Deserialize, Serialize};

/// Which way a condition tests the pointer. Either form is equally dead once
/// the pointer is known to have been dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckPolarity {
    /// `!ptr` — taken when the pointer is null.
    Null,
    /// `ptr` — taken when the pointer is non-null.
    NonNull,
}

/// Strips wrappers that cannot change which object an lvalue names:
/// parentheses, no-op casts, and lvalue bitcasts.
fn strip_value_preserving(mut expr: &Expr) -> &Expr {
    loop {
        match expr {
            Expr::Paren(inner) => expr = inner,
            Expr::Cast {
                kind: CastKind::NoOp | CastKind::LValueBitCast,
                operand,
            } => expr = operand,
            _ => return expr,
        }
    }
}

fn strip_parens_and_casts(mut expr: &Expr) -> &Expr {
    loop {
        match expr {
            Expr::Paren(inner) => expr = inner,
            Expr::Cast { operand, .. } => expr = operand,
            _ => return expr,
        }
    }
}

/// Resolves a bare reference to a declared pointer variable, or `None`.
pub fn as_pointer_variable(expr: &Expr, decls: &DeclMap) -> Option<VarId> {
    match strip_value_preserving(expr) {
        Expr::Var(id) if decls.is_pointer(*id) => Some(*id),
        _ => None,
    }
}

/// Resolves an expression that dereferences a local pointer variable.
///
/// Recurses through ternaries (both forms), opaque values, non-static member
/// accesses, and the comma and pointer-to-member operators to reach the
/// underlying `*var`. A dereference of anything that is not a plain variable
/// (a computed pointer, a double dereference) yields `None`; only direct
/// variable provenance is tracked.
pub fn as_dereferenced_variable(expr: &Expr, decls: &DeclMap) -> Option<VarId> {
    match strip_parens_and_casts(expr) {
        Expr::Conditional {
            then_expr,
            else_expr,
            ..
        } => as_dereferenced_variable(then_expr, decls)
            .or_else(|| as_dereferenced_variable(else_expr, decls)),
        // The true branch of `a ?: b` is the condition itself; only the
        // false branch can carry a distinct dereference.
        Expr::BinaryConditional { else_expr, .. } => as_dereferenced_variable(else_expr, decls),
        Expr::Opaque { source } => as_dereferenced_variable(source, decls),
        Expr::Member {
            base,
            is_static: false,
            ..
        } => as_dereferenced_variable(base, decls),
        Expr::Binary { op, lhs, rhs } => match op {
            BinOp::PtrMemDot | BinOp::PtrMemArrow => deref_in_either_operand(lhs, rhs, decls),
            BinOp::Comma => as_dereferenced_variable(rhs, decls),
            _ => None,
        },
        Expr::Unary {
            op: UnaryOp::Deref,
            operand,
        } => as_pointer_variable(strip_parens_and_casts(operand), decls),
        _ => None,
    }
}

/// Pointer-to-member consults the left operand first, then the right one,
/// the same double check the comma operator gets.
fn deref_in_either_operand(lhs: &Expr, rhs: &Expr, decls: &DeclMap) -> Option<VarId> {
    as_dereferenced_variable(lhs, decls).or_else(|| as_dereferenced_variable(rhs, decls))
}

/// Resolves a condition that is a bare null test of a pointer variable:
/// `ptr` or `!ptr`, with the polarity recorded. Anything more structured
/// yields `None`.
pub fn as_checked_variable(expr: &Expr, decls: &DeclMap) -> Option<(VarId, CheckPolarity)> {
    match strip_parens_and_casts(expr) {
        Expr::Unary {
            op: UnaryOp::Not,
            operand,
        } => as_pointer_variable(strip_parens_and_casts(operand), decls)
            .map(|var| (var, CheckPolarity::Null)),
        other => as_pointer_variable(other, decls).map(|var| (var, CheckPolarity::NonNull)),
    }
}
