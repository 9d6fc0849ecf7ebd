//! IrBuilder: the construction API for statement graphs.
//!
//! Every `create_*` factory allocates the next [`StmtId`], checks operand
//! arity, and appends the statement to the block currently open for
//! insertion. Which block that is lives on an explicit guard stack:
//!
//! ```text
//! let lp = b.create_range_for(n, false);
//! let g = b.get_range_loop_guard(lp);   // push lp's body
//! let i = b.get_loop_index(lp);         // lands inside the body
//! b.close_guard(g);                     // pop, parent is current again
//! ```
//!
//! Guards close in strict LIFO order. Misuse (closing out of order,
//! requesting a guard from a statement that is not control flow, operands
//! that are out of scope) is a front-end bug and panics immediately.

mod control;
mod expr;
mod memory;
mod stage;
#[cfg(test)]
mod tests;

use log::trace;

use super::module::IrModule;
use super::stmt::{BlockId, StmtId, StmtKind};

/// Handle for a block that is open for appending.
///
/// A guard is obtained from one of the `get_*_guard` operations and must
/// be handed back to [`IrBuilder::close_guard`]. It is consumed on close,
/// so a guard cannot be closed twice.
#[must_use = "an open guard must be closed with IrBuilder::close_guard"]
#[derive(Debug, PartialEq, Eq)]
pub struct Guard {
    block: BlockId,
    depth: usize,
}

impl Guard {
    pub fn block(&self) -> BlockId {
        self.block
    }
}

// ─── IrBuilder ─────────────────────────────────────────────────────

/// Builds one [`IrModule`].
pub struct IrBuilder {
    pub(crate) module: IrModule,
    /// Open blocks, innermost last. Empty means the module root is current.
    pub(crate) guards: Vec<BlockId>,
}

impl Default for IrBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IrBuilder {
    pub fn new() -> Self {
        Self {
            module: IrModule::new(),
            guards: Vec::new(),
        }
    }

    pub fn module(&self) -> &IrModule {
        &self.module
    }

    /// Block new statements are currently appended to.
    pub fn current_block(&self) -> BlockId {
        self.guards.last().copied().unwrap_or(BlockId::ROOT)
    }

    pub fn open_guard_count(&self) -> usize {
        self.guards.len()
    }

    /// Finish construction. Every guard must have been closed.
    pub fn finish(self) -> IrModule {
        assert!(
            self.guards.is_empty(),
            "IrBuilder finished with {} open guard(s)",
            self.guards.len()
        );
        self.module
    }

    // ── Guard stack ───────────────────────────────────────────────

    /// Open `block` for insertion. Its owner must live in the current block,
    /// which keeps the open guards a strict ancestor chain.
    pub(crate) fn add_guard(&mut self, block: BlockId) -> Guard {
        let owner = self
            .module
            .block(block)
            .owner
            .expect("cannot open a guard on the module root");
        let owner_block = self.module.stmt(owner).block;
        assert!(
            owner_block == self.current_block(),
            "guard for a block of {} requested while {:?} is open; guards must nest",
            owner,
            self.current_block()
        );
        self.guards.push(block);
        trace!("open guard {:?} (depth {})", block, self.guards.len());
        Guard {
            block,
            depth: self.guards.len(),
        }
    }

    pub fn close_guard(&mut self, guard: Guard) {
        assert!(
            self.guards.len() == guard.depth && self.guards.last() == Some(&guard.block),
            "guard {:?} closed out of order (open: {:?})",
            guard.block,
            self.guards
        );
        self.guards.pop();
        trace!("close guard {:?}", guard.block);
    }

    /// Run `f` with `guard` open, then close it.
    pub fn with_guard<R>(&mut self, guard: Guard, f: impl FnOnce(&mut Self) -> R) -> R {
        let result = f(self);
        self.close_guard(guard);
        result
    }

    // ── Appending ─────────────────────────────────────────────────

    /// Append a statement without child blocks.
    pub(crate) fn push_stmt(&mut self, kind: StmtKind) -> StmtId {
        let block = self.current_block();
        let id = self.module.append(block, kind);
        self.check_operands(id);
        trace!("{} {} in {:?}", id, self.module.stmt(id).kind_name(), block);
        id
    }

    /// Append a control-flow statement owning `n` fresh child blocks.
    pub(crate) fn push_stmt_with_blocks(
        &mut self,
        n: usize,
        make: impl FnOnce(&[BlockId]) -> StmtKind,
    ) -> StmtId {
        let owner = self.module.next_id();
        let blocks: Vec<BlockId> = (0..n).map(|_| self.module.new_block(Some(owner))).collect();
        let id = self.push_stmt(make(&blocks));
        debug_assert_eq!(id, owner);
        id
    }

    /// Every operand must be defined earlier and be in scope: its block is
    /// the root or one of the currently open blocks.
    fn check_operands(&self, id: StmtId) {
        let stmt = self.module.stmt(id);
        for op in stmt.operands() {
            assert!(
                op < id,
                "{} ({}) references {} which is not defined yet",
                id,
                stmt.kind_name(),
                op
            );
            let op_block = self.module.stmt(op).block;
            assert!(
                op_block == BlockId::ROOT || self.guards.contains(&op_block),
                "{} ({}) references {} outside its scope",
                id,
                stmt.kind_name(),
                op
            );
        }
    }

    /// Panic unless `id` names a statement matching `pred`.
    pub(crate) fn expect_kind(&self, id: StmtId, what: &str, pred: impl Fn(&StmtKind) -> bool) {
        let stmt = self
            .module
            .get(id)
            .unwrap_or_else(|| panic!("{} does not exist", id));
        assert!(
            pred(&stmt.kind),
            "expected {} to be {}, found {}",
            id,
            what,
            stmt.kind_name()
        );
    }
}
