use crate::block::{BasicBlock, BranchKind, Stmt, Terminator};
use crate::cfg::Cfg;
use crate::expr::{BinOp, CastKind, Expr, Literal, UnaryOp};
use crate::vars::DeclMap;
use std::fmt::Write;

pub fn format_cfg(cfg: &Cfg, decls: &DeclMap) -> String {
    let mut output = String::new();

    writeln!(&mut output, "; entry: {}", cfg.entry()).unwrap();

    if !decls.is_empty() {
        writeln!(&mut output, "; vars:").unwrap();
        for (id, info) in decls.iter() {
            writeln!(
                &mut output,
                ";   {} = {}{}",
                id,
                info.name,
                if info.is_pointer { " (pointer)" } else { "" }
            )
            .unwrap();
        }
    }

    for block in cfg.blocks() {
        write!(&mut output, "{}", format_block(block, decls)).unwrap();
    }

    output
}

pub fn format_block(block: &BasicBlock, decls: &DeclMap) -> String {
    let mut output = String::new();

    writeln!(&mut output, "\n{}:", block.id).unwrap();
    for stmt in &block.stmts {
        writeln!(&mut output, "    {}", format_stmt(stmt, decls)).unwrap();
    }
    writeln!(&mut output, "    {}", format_terminator(&block.terminator, decls)).unwrap();

    output
}

pub fn format_stmt(stmt: &Stmt, decls: &DeclMap) -> String {
    match stmt {
        Stmt::Expr(expr) => format_expr(expr, decls),
        Stmt::Decl(vars) => {
            let mut parts = Vec::new();
            for (id, init) in vars {
                match init {
                    Some(expr) => {
                        parts.push(format!("{} = {}", decls.name_of(*id), format_expr(expr, decls)))
                    }
                    None => parts.push(decls.name_of(*id)),
                }
            }
            format!("decl {}", parts.join(", "))
        }
    }
}

fn format_terminator(term: &Terminator, decls: &DeclMap) -> String {
    match term {
        Terminator::Goto(target) => format!("goto {}", target),
        Terminator::Branch {
            kind,
            cond,
            then_block,
            else_block,
        } => {
            let kw = match kind {
                BranchKind::If => "if",
                BranchKind::Ternary => "ternary",
                BranchKind::Loop => "loop",
            };
            format!(
                "{} {} then {} else {}",
                kw,
                format_expr(cond, decls),
                then_block,
                else_block
            )
        }
        Terminator::Switch {
            value,
            default,
            cases,
        } => {
            let mut arms: Vec<String> = cases
                .iter()
                .map(|(v, block)| format!("{} -> {}", v, block))
                .collect();
            arms.push(format!("default -> {}", default));
            format!("switch {} [{}]", format_expr(value, decls), arms.join(", "))
        }
        Terminator::Return(None) => "return".to_string(),
        Terminator::Return(Some(expr)) => format!("return {}", format_expr(expr, decls)),
        Terminator::Invalid => "<invalid>".to_string(),
    }
}

pub fn format_expr(expr: &Expr, decls: &DeclMap) -> String {
    match expr {
        Expr::Var(id) => decls.name_of(*id),
        Expr::Literal(Literal::Int(v)) => v.to_string(),
        Expr::Literal(Literal::Bool(b)) => b.to_string(),
        Expr::Literal(Literal::Null) => "null".to_string(),
        Expr::Paren(inner) => format!("({})", format_expr(inner, decls)),
        Expr::Cast { kind, operand } => match kind {
            CastKind::NoOp => format_expr(operand, decls),
            CastKind::LValueBitCast => format!("(bitcast){}", format_expr(operand, decls)),
            CastKind::PointerConversion => format!("(ptrcast){}", format_expr(operand, decls)),
        },
        Expr::Unary { op, operand } => {
            let sigil = match op {
                UnaryOp::Deref => "*",
                UnaryOp::Not => "!",
                UnaryOp::AddrOf => "&",
            };
            format!("{}{}", sigil, format_expr(operand, decls))
        }
        Expr::Binary { op, lhs, rhs } => {
            let sigil = match op {
                BinOp::Assign => "=",
                BinOp::Comma => ",",
                BinOp::PtrMemDot => ".*",
                BinOp::PtrMemArrow => "->*",
                BinOp::LogicalAnd => "&&",
                BinOp::LogicalOr => "||",
                BinOp::Eq => "==",
                BinOp::Ne => "!=",
                BinOp::Add => "+",
                BinOp::Sub => "-",
            };
            format!(
                "{} {} {}",
                format_expr(lhs, decls),
                sigil,
                format_expr(rhs, decls)
            )
        }
        Expr::Conditional {
            cond,
            then_expr,
            else_expr,
        } => format!(
            "{} ? {} : {}",
            format_expr(cond, decls),
            format_expr(then_expr, decls),
            format_expr(else_expr, decls)
        ),
        Expr::BinaryConditional { cond, else_expr } => format!(
            "{} ?: {}",
            format_expr(cond, decls),
            format_expr(else_expr, decls)
        ),
        Expr::Opaque { source } => format_expr(source, decls),
        Expr::Member {
            base,
            member,
            is_static,
        } => {
            if *is_static {
                format!("{}::{}", format_expr(base, decls), member)
            } else {
                format!("{}.{}", format_expr(base, decls), member)
            }
        }
        Expr::Call { callee, args } => {
            let rendered: Vec<String> = args.iter().map(|a| format_expr(a, decls)).collect();
            format!("{}({})", format_expr(callee, decls), rendered.join(", "))
        }
        Expr::Closure { body } => format!("closure{{{} stmts}}", body.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::{VarId, VarInfo, VarKind};

    #[test]
    fn expressions_render_with_declared_names() {
        let mut decls = DeclMap::new();
        let p = VarId(0);
        decls.insert(p, VarInfo::new("p", VarKind::Param, true));

        let expr = Expr::assign(Expr::deref(Expr::var(p)), Expr::int(0));
        assert_eq!(format_expr(&expr, &decls), "*p = 0");

        let check = Expr::not(Expr::paren(Expr::var(p)));
        assert_eq!(format_expr(&check, &decls), "!(p)");
    }
}
