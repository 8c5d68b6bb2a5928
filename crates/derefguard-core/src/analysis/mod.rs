/*! The check-after-dereference analysis.
 *
 * Three layers, leaves first: a syntactic classifier that resolves
 * expressions to pointer variables, a per-block transfer function that
 * accumulates "dereferenced on every path so far" facts and judges check
 * sites against them, and a worklist scheduler that drives both to a fixed
 * point over the CFG.
 */

pub mod check_after_deref;
pub mod classify;
pub mod handler;
pub mod transfer;
pub mod worklist;

pub use check_after_deref::{
    run_check_after_deref_analysis, AnalysisStats, CheckAfterDerefAnalysis,
};
pub use classify::{
    as_checked_variable, as_dereferenced_variable, as_pointer_variable, CheckPolarity,
};
pub use handler::{CollectFindings, DerefCheckHandler, Finding};
pub use transfer::{BlockTransfer, DerefState};
pub use worklist::DataflowWorklist;
