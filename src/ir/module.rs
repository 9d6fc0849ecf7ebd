//! IR module: a statement arena plus the blocks that order it.

use super::stmt::{BlockId, Stmt, StmtId, StmtKind};

/// An ordered sequence of statements belonging to one lexical region.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block {
    /// Control-flow statement owning this block; `None` for the root.
    pub owner: Option<StmtId>,
    pub stmts: Vec<StmtId>,
}

/// A complete statement graph.
///
/// `stmts[i].id == StmtId(i)`, so operand lookup is an index and
/// "is defined before" is an integer comparison.
#[derive(Clone, Debug, PartialEq)]
pub struct IrModule {
    stmts: Vec<Stmt>,
    blocks: Vec<Block>,
}

impl Default for IrModule {
    fn default() -> Self {
        Self::new()
    }
}

impl IrModule {
    pub fn new() -> Self {
        Self {
            stmts: Vec::new(),
            blocks: vec![Block::default()],
        }
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    pub fn get(&self, id: StmtId) -> Option<&Stmt> {
        self.stmts.get(id.index())
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    pub fn root(&self) -> &Block {
        &self.blocks[BlockId::ROOT.index()]
    }

    pub fn stmts(&self) -> &[Stmt] {
        &self.stmts
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    /// Id the next appended statement will receive.
    pub fn next_id(&self) -> StmtId {
        StmtId(self.stmts.len() as u32)
    }

    /// Chain of statements owning `block`, innermost first.
    pub fn enclosing_stmts(&self, mut block: BlockId) -> Vec<StmtId> {
        let mut chain = Vec::new();
        while let Some(owner) = self.block(block).owner {
            chain.push(owner);
            block = self.stmt(owner).block;
        }
        chain
    }

    /// Every statement nested (at any depth) under the given top-level ones,
    /// the top-level ones included, in definition order.
    pub fn collect_nested(&self, top: &[StmtId]) -> Vec<StmtId> {
        let mut out = Vec::new();
        let mut stack: Vec<StmtId> = top.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            for block in self.stmt(id).child_blocks().iter().rev() {
                stack.extend(self.block(*block).stmts.iter().rev());
            }
        }
        out.sort();
        out
    }

    // ── Construction (builder only) ──

    pub(crate) fn new_block(&mut self, owner: Option<StmtId>) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(Block {
            owner,
            stmts: Vec::new(),
        });
        id
    }

    /// Append a statement to `block`. Blocks owned by the new statement
    /// must be created first with `new_block(Some(self.next_id()))`.
    pub(crate) fn append(&mut self, block: BlockId, kind: StmtKind) -> StmtId {
        let id = self.next_id();
        self.stmts.push(Stmt { id, block, kind });
        self.blocks[block.index()].stmts.push(id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::stmt::ConstValue;

    #[test]
    fn test_append_assigns_sequential_ids() {
        let mut m = IrModule::new();
        let a = m.append(BlockId::ROOT, StmtKind::Const(ConstValue::I32(1)));
        let b = m.append(BlockId::ROOT, StmtKind::Const(ConstValue::I32(2)));
        assert_eq!(a, StmtId(0));
        assert_eq!(b, StmtId(1));
        assert_eq!(m.root().stmts, vec![a, b]);
        assert_eq!(m.next_id(), StmtId(2));
    }

    #[test]
    fn test_enclosing_chain() {
        let mut m = IrModule::new();
        let body = m.new_block(Some(StmtId(0)));
        let outer = m.append(BlockId::ROOT, StmtKind::While { body });
        let inner_body = m.new_block(Some(StmtId(1)));
        let inner = m.append(body, StmtKind::While { body: inner_body });
        assert_eq!(m.enclosing_stmts(inner_body), vec![inner, outer]);
        assert!(m.enclosing_stmts(BlockId::ROOT).is_empty());
        assert_eq!(m.collect_nested(&[outer]), vec![outer, inner]);
    }
}
