use super::classify::{as_checked_variable, as_dereferenced_variable, as_pointer_variable};
use super::handler::Finding;
use crate::block::{BasicBlock, ProgramPoint, Stmt, Terminator};
use crate::expr::{BinOp, Expr};
use crate::vars::{DeclMap, VarId};
use indexmap::IndexMap;
use tracing::trace;

/// Variables known dereferenced on every path to the current program point,
/// each with the first dereference site observed. Insertion order is kept so
/// reports come out stable across runs.
pub type DerefState = IndexMap<VarId, ProgramPoint>;

/// Runs one block: statements in program order, then the terminator
/// condition. Produces the outgoing state; qualifying check sites are
/// reported through the callback as they are found.
pub struct BlockTransfer<'a> {
    decls: &'a DeclMap,
    block: &'a BasicBlock,
    state: DerefState,
}

impl<'a> BlockTransfer<'a> {
    pub fn new(decls: &'a DeclMap, block: &'a BasicBlock, incoming: DerefState) -> Self {
        Self {
            decls,
            block,
            state: incoming,
        }
    }

    pub fn run(mut self, mut report: impl FnMut(Finding)) -> DerefState {
        let block = self.block;

        for (index, stmt) in block.stmts.iter().enumerate() {
            let at = ProgramPoint::Stmt {
                block: block.id,
                index,
            };
            match stmt {
                Stmt::Expr(expr) => self.transfer_expr(expr, at),
                // A declaration introduces no fact; the variable is simply
                // not in the state yet.
                Stmt::Decl(_) => {}
            }
        }

        self.transfer_terminator(&block.terminator, &mut report);
        self.state
    }

    fn transfer_expr(&mut self, expr: &Expr, at: ProgramPoint) {
        if let Expr::Binary {
            op: BinOp::Assign,
            lhs,
            rhs,
        } = expr
        {
            // RHS dereferences first, then the kill: the assigned pointer no
            // longer carries the value that was dereferenced. A non-trivial
            // LHS (`*p = x`) is itself scanned, since storing through p
            // dereferences it.
            self.scan_derefs(rhs, at);
            if let Some(var) = as_pointer_variable(lhs, self.decls) {
                if self.state.shift_remove(&var).is_some() {
                    trace!(var = %var, at = %at, "assignment invalidates dereference fact");
                }
            } else {
                self.scan_derefs(lhs, at);
            }
            return;
        }

        self.scan_derefs(expr, at);
    }

    fn transfer_terminator(&mut self, term: &Terminator, report: &mut impl FnMut(Finding)) {
        let at = ProgramPoint::Terminator {
            block: self.block.id,
        };

        if let Some(cond) = term.check_site() {
            // The check is judged against the state accumulated from the
            // statements before it; dereferences embedded in the condition
            // itself join the state afterwards (left-to-right order).
            if let Some((var, polarity)) = as_checked_variable(cond, self.decls) {
                if let Some(&deref) = self.state.get(&var) {
                    report(Finding {
                        var,
                        deref,
                        check: at,
                        polarity,
                    });
                }
            }
        }

        match term {
            Terminator::Branch { cond, .. } => self.scan_derefs(cond, at),
            Terminator::Switch { value, .. } => self.scan_derefs(value, at),
            Terminator::Return(Some(expr)) => self.scan_derefs(expr, at),
            Terminator::Goto(_) | Terminator::Return(None) | Terminator::Invalid => {}
        }
    }

    /// Records every dereference of a pointer variable reachable in this
    /// subtree. Closure bodies are a separate analysis scope and are not
    /// walked; the base of a static member access is never evaluated.
    fn scan_derefs(&mut self, expr: &Expr, at: ProgramPoint) {
        if let Some(var) = as_dereferenced_variable(expr, self.decls) {
            self.record_deref(var, at);
        }

        match expr {
            Expr::Var(_) | Expr::Literal(_) | Expr::Closure { .. } => {}
            Expr::Paren(inner) => self.scan_derefs(inner, at),
            Expr::Cast { operand, .. } | Expr::Unary { operand, .. } => {
                self.scan_derefs(operand, at)
            }
            Expr::Opaque { source } => self.scan_derefs(source, at),
            Expr::Binary { lhs, rhs, .. } => {
                self.scan_derefs(lhs, at);
                self.scan_derefs(rhs, at);
            }
            Expr::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                self.scan_derefs(cond, at);
                self.scan_derefs(then_expr, at);
                self.scan_derefs(else_expr, at);
            }
            Expr::BinaryConditional { cond, else_expr } => {
                self.scan_derefs(cond, at);
                self.scan_derefs(else_expr, at);
            }
            Expr::Member {
                base,
                is_static: false,
                ..
            } => self.scan_derefs(base, at),
            Expr::Member {
                is_static: true, ..
            } => {}
            Expr::Call { callee, args } => {
                self.scan_derefs(callee, at);
                for arg in args {
                    self.scan_derefs(arg, at);
                }
            }
        }
    }

    fn record_deref(&mut self, var: VarId, at: ProgramPoint) {
        // The first site wins; re-dereferencing adds nothing.
        if !self.state.contains_key(&var) {
            self.state.insert(var, at);
            trace!(var = %var, at = %at, "dereference recorded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BasicBlock, BlockId, BranchKind};
    use crate::vars::{VarInfo, VarKind};

    fn setup() -> (DeclMap, VarId, VarId) {
        let mut decls = DeclMap::new();
        let p = VarId(0);
        let q = VarId(1);
        decls.insert(p, VarInfo::new("p", VarKind::Param, true));
        decls.insert(q, VarInfo::new("q", VarKind::Param, true));
        (decls, p, q)
    }

    fn run_block(
        decls: &DeclMap,
        block: &BasicBlock,
        incoming: DerefState,
    ) -> (DerefState, Vec<Finding>) {
        let mut findings = Vec::new();
        let out = BlockTransfer::new(decls, block, incoming).run(|f| findings.push(f));
        (out, findings)
    }

    #[test]
    fn dereference_enters_the_state_once() {
        let (decls, p, _) = setup();
        let mut block = BasicBlock::new(BlockId(0));
        block.push_stmt(Stmt::Expr(Expr::deref(Expr::var(p))));
        block.push_stmt(Stmt::Expr(Expr::deref(Expr::var(p))));
        block.set_terminator(Terminator::Return(None));

        let (out, findings) = run_block(&decls, &block, DerefState::new());
        assert!(findings.is_empty());
        assert_eq!(
            out.get(&p),
            Some(&ProgramPoint::Stmt {
                block: BlockId(0),
                index: 0
            })
        );
    }

    #[test]
    fn assignment_kills_the_fact_even_with_self_reference() {
        let (decls, p, q) = setup();
        let mut block = BasicBlock::new(BlockId(0));
        // p = *p ? p : q — the RHS dereference is recorded first, then the
        // kill removes it again.
        block.push_stmt(Stmt::Expr(Expr::assign(
            Expr::var(p),
            Expr::ternary(Expr::deref(Expr::var(p)), Expr::var(p), Expr::var(q)),
        )));
        block.set_terminator(Terminator::Return(None));

        let (out, _) = run_block(&decls, &block, DerefState::new());
        assert!(!out.contains_key(&p));
    }

    #[test]
    fn store_through_pointer_counts_as_dereference() {
        let (decls, p, _) = setup();
        let mut block = BasicBlock::new(BlockId(0));
        block.push_stmt(Stmt::Expr(Expr::assign(
            Expr::deref(Expr::var(p)),
            Expr::int(0),
        )));
        block.set_terminator(Terminator::Return(None));

        let (out, _) = run_block(&decls, &block, DerefState::new());
        assert!(out.contains_key(&p));
    }

    #[test]
    fn call_arguments_are_scanned() {
        let (decls, p, q) = setup();
        let mut block = BasicBlock::new(BlockId(0));
        block.push_stmt(Stmt::Expr(Expr::call(
            Expr::var(q),
            vec![Expr::deref(Expr::var(p))],
        )));
        block.set_terminator(Terminator::Return(None));

        let (out, _) = run_block(&decls, &block, DerefState::new());
        assert!(out.contains_key(&p));
    }

    #[test]
    fn closure_bodies_are_not_walked() {
        let (decls, p, _) = setup();
        let mut block = BasicBlock::new(BlockId(0));
        block.push_stmt(Stmt::Expr(Expr::Closure {
            body: vec![Stmt::Expr(Expr::deref(Expr::var(p)))],
        }));
        block.set_terminator(Terminator::Return(None));

        let (out, _) = run_block(&decls, &block, DerefState::new());
        assert!(out.is_empty());
    }

    #[test]
    fn declarations_change_nothing() {
        let (decls, p, _) = setup();
        let mut block = BasicBlock::new(BlockId(0));
        block.push_stmt(Stmt::Decl(vec![(p, Some(Expr::null()))]));
        block.set_terminator(Terminator::Return(None));

        let (out, _) = run_block(&decls, &block, DerefState::new());
        assert!(out.is_empty());
    }

    #[test]
    fn check_site_is_judged_against_prior_statements() {
        let (decls, p, _) = setup();
        let mut block = BasicBlock::new(BlockId(0));
        block.push_stmt(Stmt::Expr(Expr::deref(Expr::var(p))));
        block.set_terminator(Terminator::Branch {
            kind: BranchKind::If,
            cond: Expr::var(p),
            then_block: BlockId(0),
            else_block: BlockId(0),
        });

        let (_, findings) = run_block(&decls, &block, DerefState::new());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].var, p);
        assert_eq!(
            findings[0].check,
            ProgramPoint::Terminator { block: BlockId(0) }
        );
    }

    #[test]
    fn dereference_inside_the_condition_does_not_trigger_its_own_check() {
        let (decls, p, _) = setup();
        let mut block = BasicBlock::new(BlockId(0));
        // if (p) with no prior dereference: the condition is a check site
        // but the state is empty when it is judged.
        block.set_terminator(Terminator::Branch {
            kind: BranchKind::If,
            cond: Expr::var(p),
            then_block: BlockId(0),
            else_block: BlockId(0),
        });

        let (_, findings) = run_block(&decls, &block, DerefState::new());
        assert!(findings.is_empty());
    }

    #[test]
    fn loop_conditions_are_scanned_but_never_reported() {
        let (decls, p, _) = setup();
        let mut block = BasicBlock::new(BlockId(0));
        block.push_stmt(Stmt::Expr(Expr::deref(Expr::var(p))));
        block.set_terminator(Terminator::Branch {
            kind: BranchKind::Loop,
            cond: Expr::var(p),
            then_block: BlockId(0),
            else_block: BlockId(0),
        });

        let (out, findings) = run_block(&decls, &block, DerefState::new());
        assert!(findings.is_empty());
        assert!(out.contains_key(&p));
    }
}
