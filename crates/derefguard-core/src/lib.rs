/*! CFG data model and the check-after-dereference dataflow analysis.
 *
 * A null check on a pointer that was already dereferenced on every path
 * reaching the check is dead protection: the fault it guards against has
 * already had its chance to happen. This crate detects that pattern with an
 * intraprocedural worklist analysis over a caller-supplied control-flow
 * graph, reporting each confirmed occurrence through a handler the caller
 * provides.
 */

pub mod analysis;
pub mod block;
pub mod builder;
pub mod cfg;
pub mod expr;
pub mod format;
pub mod persist;
pub mod vars;

pub use analysis::{
    run_check_after_deref_analysis, AnalysisStats, CheckAfterDerefAnalysis, CheckPolarity,
    CollectFindings, DerefCheckHandler, Finding,
};
pub use block::{BasicBlock, BlockId, BranchKind, ProgramPoint, Stmt, Terminator};
pub use builder::CfgBuilder;
pub use cfg::Cfg;
pub use expr::{BinOp, CastKind, Expr, Literal, UnaryOp};
pub use vars::{DeclMap, VarId, VarInfo, VarKind};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CfgError {
    #[error("entry block {0} is not in the block list")]
    MissingEntry(BlockId),
    #[error("{block} targets undeclared block {target}")]
    DanglingSuccessor { block: BlockId, target: BlockId },
    #[error("{0} has no terminator")]
    Unterminated(BlockId),
    #[error("builder error: {0}")]
    BuilderError(String),
}

pub type Result<T> = std::result::Result<T, CfgError>;
