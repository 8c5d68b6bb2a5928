use crate::block::{BasicBlock, BlockId};
use crate::{CfgError, Result};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Control-flow graph for one function body.
///
/// Blocks are owned here and read-only for the analysis; edge maps are
/// derived from the terminators at construction time.
#[derive(Debug, Clone)]
pub struct Cfg {
    blocks: IndexMap<BlockId, BasicBlock>,
    entry: BlockId,
    edges: HashMap<BlockId, Vec<BlockId>>,
    reverse_edges: HashMap<BlockId, Vec<BlockId>>,
}

impl Cfg {
    pub fn new(blocks: impl IntoIterator<Item = BasicBlock>, entry: BlockId) -> Self {
        let blocks: IndexMap<BlockId, BasicBlock> =
            blocks.into_iter().map(|b| (b.id, b)).collect();

        let mut edges = HashMap::new();
        let mut reverse_edges: HashMap<BlockId, Vec<BlockId>> = HashMap::new();

        for (block_id, block) in &blocks {
            let successors = block.successors();
            for &succ in &successors {
                reverse_edges.entry(succ).or_default().push(*block_id);
            }
            edges.insert(*block_id, successors);
        }

        Self {
            blocks,
            entry,
            edges,
            reverse_edges,
        }
    }

    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(&id)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.values()
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// One past the highest block id; sizes bitsets keyed by block identity.
    pub fn block_id_bound(&self) -> usize {
        self.blocks
            .keys()
            .map(|id| id.0 as usize + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn successors(&self, block: BlockId) -> &[BlockId] {
        self.edges.get(&block).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn predecessors(&self, block: BlockId) -> &[BlockId] {
        self.reverse_edges
            .get(&block)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Checks the caller contract: the entry block exists, every block is
    /// terminated, and no terminator targets an undeclared block.
    pub fn validate(&self) -> Result<()> {
        if !self.blocks.contains_key(&self.entry) {
            return Err(CfgError::MissingEntry(self.entry));
        }

        for (block_id, block) in &self.blocks {
            if !block.is_terminated() {
                return Err(CfgError::Unterminated(*block_id));
            }
            for succ in block.successors() {
                if !self.blocks.contains_key(&succ) {
                    return Err(CfgError::DanglingSuccessor {
                        block: *block_id,
                        target: succ,
                    });
                }
            }
        }

        Ok(())
    }

    /// Blocks in reverse post-order from the entry. The entry is always
    /// first; unreachable blocks are not included.
    pub fn reverse_post_order(&self) -> Vec<BlockId> {
        let mut order = Vec::with_capacity(self.blocks.len());
        let mut visited = HashSet::new();
        let mut stack = vec![(self.entry, false)];

        while let Some((block, children_done)) = stack.pop() {
            if children_done {
                order.push(block);
                continue;
            }

            if !visited.insert(block) {
                continue;
            }

            stack.push((block, true));
            for &succ in self.successors(block).iter().rev() {
                if !visited.contains(&succ) {
                    stack.push((succ, false));
                }
            }
        }

        order.reverse();
        order
    }
}
