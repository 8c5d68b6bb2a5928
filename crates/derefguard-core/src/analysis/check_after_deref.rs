use super::handler::DerefCheckHandler;
use super::transfer::{BlockTransfer, DerefState};
use super::worklist::DataflowWorklist;
use crate::block::{BlockId, ProgramPoint};
use crate::cfg::Cfg;
use crate::vars::{DeclMap, VarId};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisStats {
    pub blocks_visited: usize,
    pub findings: usize,
}

/// Per-run state of the check-after-dereference analysis: block out-states,
/// the revisit bookkeeping, and the set of already-reported check sites.
/// One instance analyzes one function and is then discarded.
pub struct CheckAfterDerefAnalysis<'a> {
    cfg: &'a Cfg,
    decls: &'a DeclMap,
    out_states: IndexMap<BlockId, DerefState>,
    reported: HashSet<(VarId, ProgramPoint)>,
    stats: AnalysisStats,
}

impl<'a> CheckAfterDerefAnalysis<'a> {
    pub fn new(cfg: &'a Cfg, decls: &'a DeclMap) -> Self {
        Self {
            cfg,
            decls,
            out_states: IndexMap::new(),
            reported: HashSet::new(),
            stats: AnalysisStats::default(),
        }
    }

    pub fn run(mut self, handler: &mut dyn DerefCheckHandler) -> Result<AnalysisStats> {
        self.cfg
            .validate()
            .context("refusing to analyze a malformed CFG")?;

        let rpo = self.cfg.reverse_post_order();
        let mut worklist = DataflowWorklist::new(self.cfg, &rpo);

        // The entry runs first with an empty incoming state; every other
        // reachable block follows in reverse post-order, with back-edge
        // revisits interleaved by the scheduler.
        let mut next = Some(self.cfg.entry());
        while let Some(block) = next {
            let changed = self.run_block(block, handler)?;
            if changed {
                worklist.enqueue_successors(block);
            }
            next = worklist.dequeue();
        }

        debug!(
            blocks_visited = self.stats.blocks_visited,
            findings = self.stats.findings,
            "analysis reached its fixed point"
        );
        Ok(self.stats)
    }

    /// Runs the transfer function for one block against the merged
    /// predecessor state. Returns whether the out-state changed, which is
    /// what decides re-enqueuing the successors.
    fn run_block(
        &mut self,
        block_id: BlockId,
        handler: &mut dyn DerefCheckHandler,
    ) -> Result<bool> {
        let block = self
            .cfg
            .block(block_id)
            .with_context(|| format!("{} disappeared from the CFG", block_id))?;

        let incoming = self.merge_predecessors(block_id);

        let reported = &mut self.reported;
        let mut new_findings = 0usize;
        let out = BlockTransfer::new(self.decls, block, incoming).run(|finding| {
            // A check site is reported once, no matter how many times the
            // fixed-point iteration revisits its block.
            if reported.insert((finding.var, finding.check)) {
                handler.check_after_deref(&finding);
                new_findings += 1;
            }
        });

        self.stats.blocks_visited += 1;
        self.stats.findings += new_findings;

        let changed = self.out_states.get(&block_id) != Some(&out);
        self.out_states.insert(block_id, out);
        Ok(changed)
    }

    /// A variable is unconditionally dereferenced at a join only if every
    /// path got there through a dereference, so the incoming state is the
    /// intersection of the predecessors' out-states. An unprocessed
    /// predecessor contributes its best-known state, which is empty; the
    /// state then grows monotonically to the fixed point, erring toward
    /// missed findings rather than wrong ones.
    fn merge_predecessors(&self, block: BlockId) -> DerefState {
        // The entry block is also reached by the function-entry edge, which
        // carries no dereference facts. A back-edge into the entry therefore
        // never seeds it with anything.
        if block == self.cfg.entry() {
            return DerefState::new();
        }

        let preds = self.cfg.predecessors(block);

        let mut iter = preds.iter();
        let Some(&first) = iter.next() else {
            return DerefState::new();
        };

        // The dereference site kept for a merged variable is the first
        // predecessor's, which keeps reports deterministic.
        let mut merged = self.out_states.get(&first).cloned().unwrap_or_default();
        for &pred in iter {
            if merged.is_empty() {
                break;
            }
            match self.out_states.get(&pred) {
                Some(out) => merged.retain(|var, _| out.contains_key(var)),
                None => merged.clear(),
            }
        }

        merged
    }
}

/// Analyzes one function body and reports every check-after-dereference
/// occurrence to `handler`. The CFG and declaration table are read-only;
/// all per-run state lives in the analysis instance and is dropped on
/// return.
pub fn run_check_after_deref_analysis(
    cfg: &Cfg,
    decls: &DeclMap,
    handler: &mut dyn DerefCheckHandler,
) -> Result<AnalysisStats> {
    CheckAfterDerefAnalysis::new(cfg, decls).run(handler)
}
