use crate::block::BlockId;
use crate::cfg::Cfg;
use tracing::trace;

/// Scheduler for the dataflow fixed point.
///
/// Every reachable block starts implicitly pending in the precomputed
/// reverse post-order, which is the convergence-optimal order when there are
/// no back edges. Once a block has been dequeued, `enqueue_successors` can
/// put it on an explicit revisit list; `dequeue` drains that list before the
/// baseline order continues, so updates along back edges propagate as
/// quickly as possible. The membership bitset keeps any block from being
/// pending twice.
pub struct DataflowWorklist<'a> {
    cfg: &'a Cfg,
    rpo: &'a [BlockId],
    rpo_next: usize,
    worklist: Vec<BlockId>,
    enqueued: Vec<bool>,
}

impl<'a> DataflowWorklist<'a> {
    pub fn new(cfg: &'a Cfg, rpo: &'a [BlockId]) -> Self {
        let mut enqueued = vec![true; cfg.block_id_bound()];
        let mut rpo_next = 0;

        // The entry block is treated as already analyzed; the driver runs
        // it before consulting the scheduler.
        if let Some(&first) = rpo.first() {
            assert_eq!(
                first,
                cfg.entry(),
                "reverse post-order must begin at the entry block"
            );
            enqueued[first.0 as usize] = false;
            rpo_next = 1;
        }

        Self {
            cfg,
            rpo,
            rpo_next,
            worklist: Vec::new(),
            enqueued,
        }
    }

    pub fn enqueue_successors(&mut self, block: BlockId) {
        for &succ in self.cfg.successors(block) {
            if self.enqueued[succ.0 as usize] {
                continue;
            }
            self.worklist.push(succ);
            self.enqueued[succ.0 as usize] = true;
            trace!(from = %block, block = %succ, "enqueued for revisit");
        }
    }

    pub fn dequeue(&mut self) -> Option<BlockId> {
        // The revisit list first: it carries updates along back edges.
        let block = if let Some(block) = self.worklist.pop() {
            block
        } else if self.rpo_next < self.rpo.len() {
            let block = self.rpo[self.rpo_next];
            self.rpo_next += 1;
            block
        } else {
            return None;
        };

        assert!(
            self.enqueued[block.0 as usize],
            "dequeued a block that was not pending"
        );
        self.enqueued[block.0 as usize] = false;
        Some(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BasicBlock, BranchKind, Terminator};
    use crate::expr::Expr;

    fn block(id: u32, term: Terminator) -> BasicBlock {
        let mut b = BasicBlock::new(BlockId(id));
        b.set_terminator(term);
        b
    }

    fn diamond() -> Cfg {
        Cfg::new(
            vec![
                block(
                    0,
                    Terminator::Branch {
                        kind: BranchKind::If,
                        cond: Expr::int(1),
                        then_block: BlockId(1),
                        else_block: BlockId(2),
                    },
                ),
                block(1, Terminator::Goto(BlockId(3))),
                block(2, Terminator::Goto(BlockId(3))),
                block(3, Terminator::Return(None)),
            ],
            BlockId(0),
        )
    }

    #[test]
    fn baseline_order_is_reverse_post_order_after_the_entry() {
        let cfg = diamond();
        let rpo = cfg.reverse_post_order();
        let mut worklist = DataflowWorklist::new(&cfg, &rpo);

        let mut order = Vec::new();
        while let Some(block) = worklist.dequeue() {
            order.push(block);
        }
        assert_eq!(order, rpo[1..].to_vec());
    }

    #[test]
    fn revisits_pop_before_the_baseline_continues() {
        let cfg = diamond();
        let rpo = cfg.reverse_post_order();
        let mut worklist = DataflowWorklist::new(&cfg, &rpo);

        // Drain the baseline completely, then revisit from block 0.
        while worklist.dequeue().is_some() {}
        worklist.enqueue_successors(BlockId(0));

        let first = worklist.dequeue();
        let second = worklist.dequeue();
        assert!(matches!(first, Some(BlockId(1)) | Some(BlockId(2))));
        assert!(matches!(second, Some(BlockId(1)) | Some(BlockId(2))));
        assert_ne!(first, second);
        assert_eq!(worklist.dequeue(), None);
    }

    #[test]
    fn pending_blocks_are_never_enqueued_twice() {
        let cfg = diamond();
        let rpo = cfg.reverse_post_order();
        let mut worklist = DataflowWorklist::new(&cfg, &rpo);

        // Successors of the entry are still pending in the baseline, so this
        // must not duplicate them on the revisit list.
        worklist.enqueue_successors(BlockId(0));

        let mut seen = Vec::new();
        while let Some(block) = worklist.dequeue() {
            assert!(!seen.contains(&block), "block dequeued twice");
            seen.push(block);
        }
        assert_eq!(seen.len(), 3);
    }
}
