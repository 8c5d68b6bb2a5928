use crate::block::{BasicBlock, BlockId, BranchKind, Stmt, Terminator};
use crate::cfg::Cfg;
use crate::expr::Expr;
use crate::vars::{DeclMap, VarId, VarInfo, VarKind};
use crate::{CfgError, Result};
use indexmap::IndexMap;

/// Programmatic CFG construction for adapters and tests.
///
/// The first created block becomes the entry. `build` validates the result,
/// so a graph that leaves this builder satisfies the analysis contract.
#[derive(Debug, Default)]
pub struct CfgBuilder {
    decls: DeclMap,
    blocks: IndexMap<BlockId, BasicBlock>,
    entry: Option<BlockId>,
    next_block: u32,
    next_var: u32,
}

impl CfgBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: impl Into<String>, kind: VarKind, is_pointer: bool) -> VarId {
        let id = VarId(self.next_var);
        self.next_var += 1;
        self.decls.insert(id, VarInfo::new(name, kind, is_pointer));
        id
    }

    pub fn local_pointer(&mut self, name: impl Into<String>) -> VarId {
        self.declare(name, VarKind::Local, true)
    }

    pub fn param_pointer(&mut self, name: impl Into<String>) -> VarId {
        self.declare(name, VarKind::Param, true)
    }

    pub fn local(&mut self, name: impl Into<String>) -> VarId {
        self.declare(name, VarKind::Local, false)
    }

    pub fn create_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        self.blocks.insert(id, BasicBlock::new(id));
        if self.entry.is_none() {
            self.entry = Some(id);
        }
        id
    }

    fn block_mut(&mut self, block: BlockId) -> Result<&mut BasicBlock> {
        self.blocks
            .get_mut(&block)
            .ok_or_else(|| CfgError::BuilderError(format!("unknown block {}", block)))
    }

    pub fn push(&mut self, block: BlockId, stmt: Stmt) -> Result<()> {
        self.block_mut(block)?.push_stmt(stmt);
        Ok(())
    }

    pub fn stmt(&mut self, block: BlockId, expr: Expr) -> Result<()> {
        self.push(block, Stmt::Expr(expr))
    }

    pub fn decl_stmt(&mut self, block: BlockId, decls: Vec<(VarId, Option<Expr>)>) -> Result<()> {
        self.push(block, Stmt::Decl(decls))
    }

    pub fn set_terminator(&mut self, block: BlockId, term: Terminator) -> Result<()> {
        let b = self.block_mut(block)?;
        if b.is_terminated() {
            return Err(CfgError::BuilderError(format!(
                "{} is already terminated",
                block
            )));
        }
        b.set_terminator(term);
        Ok(())
    }

    pub fn goto(&mut self, block: BlockId, target: BlockId) -> Result<()> {
        self.set_terminator(block, Terminator::Goto(target))
    }

    pub fn branch(
        &mut self,
        block: BlockId,
        kind: BranchKind,
        cond: Expr,
        then_block: BlockId,
        else_block: BlockId,
    ) -> Result<()> {
        self.set_terminator(
            block,
            Terminator::Branch {
                kind,
                cond,
                then_block,
                else_block,
            },
        )
    }

    pub fn ret(&mut self, block: BlockId) -> Result<()> {
        self.set_terminator(block, Terminator::Return(None))
    }

    pub fn ret_value(&mut self, block: BlockId, value: Expr) -> Result<()> {
        self.set_terminator(block, Terminator::Return(Some(value)))
    }

    pub fn build(self) -> Result<(Cfg, DeclMap)> {
        let entry = self
            .entry
            .ok_or_else(|| CfgError::BuilderError("no blocks were created".to_string()))?;
        let cfg = Cfg::new(self.blocks.into_values(), entry);
        cfg.validate()?;
        Ok((cfg, self.decls))
    }
}
