use crate::expr::Expr;
use crate::vars::VarId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "block{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Expr(Expr),
    /// Declarations with optional initializers. Declaring a pointer adds no
    /// dataflow fact; the variable is simply absent from the state.
    Decl(Vec<(VarId, Option<Expr>)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchKind {
    If,
    Ternary,
    Loop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Terminator {
    Goto(BlockId),
    Branch {
        kind: BranchKind,
        cond: Expr,
        then_block: BlockId,
        else_block: BlockId,
    },
    Switch {
        value: Expr,
        default: BlockId,
        cases: Vec<(i64, BlockId)>,
    },
    Return(Option<Expr>),
    Invalid,
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Goto(target) => vec![*target],
            Terminator::Branch {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Switch { default, cases, .. } => {
                let mut blocks = vec![*default];
                blocks.extend(cases.iter().map(|(_, block)| *block));
                blocks
            }
            Terminator::Return(_) | Terminator::Invalid => vec![],
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Terminator::Return(_))
    }

    /// The branch condition, if this terminator is a null-check site. Only
    /// `if` and ternary conditions qualify; loop and switch dispatch never
    /// produce findings.
    pub fn check_site(&self) -> Option<&Expr> {
        match self {
            Terminator::Branch {
                kind: BranchKind::If | BranchKind::Ternary,
                cond,
                ..
            } => Some(cond),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub stmts: Vec<Stmt>,
    pub terminator: Terminator,
}

impl BasicBlock {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            stmts: Vec::new(),
            terminator: Terminator::Invalid,
        }
    }

    pub fn push_stmt(&mut self, stmt: Stmt) {
        self.stmts.push(stmt);
    }

    pub fn set_terminator(&mut self, term: Terminator) {
        self.terminator = term;
    }

    pub fn is_terminated(&self) -> bool {
        !matches!(self.terminator, Terminator::Invalid)
    }

    pub fn successors(&self) -> Vec<BlockId> {
        self.terminator.successors()
    }
}

/// A position inside one block: either a statement by index, or the
/// terminator condition evaluated after every statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProgramPoint {
    Stmt { block: BlockId, index: usize },
    Terminator { block: BlockId },
}

impl ProgramPoint {
    pub fn block(&self) -> BlockId {
        match self {
            ProgramPoint::Stmt { block, .. } | ProgramPoint::Terminator { block } => *block,
        }
    }
}

impl std::fmt::Display for ProgramPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgramPoint::Stmt { block, index } => write!(f, "{}[{}]", block, index),
            ProgramPoint::Terminator { block } => write!(f, "{}:term", block),
        }
    }
}
