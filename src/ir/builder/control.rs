//! Control-flow factories and their guard retrieval operations.

use crate::ir::field::Field;
use crate::ir::stmt::{LoopControl, RangeBound, StmtId, StmtKind};

use super::{Guard, IrBuilder};

impl IrBuilder {
    // ── Loops ─────────────────────────────────────────────────────

    /// `for i in 0..range`. With `strictly_serialize` the loop never
    /// becomes a parallel dispatch.
    pub fn create_range_for(&mut self, range: StmtId, strictly_serialize: bool) -> StmtId {
        self.push_stmt_with_blocks(1, |b| StmtKind::RangeFor {
            bound: RangeBound::Value(range),
            strictly_serialize,
            body: b[0],
        })
    }

    /// Loop over every element of `field`.
    pub fn create_range_for_field(&mut self, field: &Field, strictly_serialize: bool) -> StmtId {
        self.push_stmt_with_blocks(1, |b| StmtKind::RangeFor {
            bound: RangeBound::FieldElements(field.clone()),
            strictly_serialize,
            body: b[0],
        })
    }

    /// Unconditional loop; exits through a guarded `create_break`.
    pub fn create_while_true(&mut self) -> StmtId {
        self.push_stmt_with_blocks(1, |b| StmtKind::While { body: b[0] })
    }

    pub fn create_vertex_for(&mut self) -> StmtId {
        self.push_stmt_with_blocks(1, |b| StmtKind::VertexFor { body: b[0] })
    }

    pub fn create_fragment_for(&mut self) -> StmtId {
        self.push_stmt_with_blocks(1, |b| StmtKind::FragmentFor { body: b[0] })
    }

    // ── Branches and loop exits ───────────────────────────────────

    pub fn create_if(&mut self, cond: StmtId) -> StmtId {
        self.push_stmt_with_blocks(2, |b| StmtKind::If {
            cond,
            then_block: b[0],
            else_block: b[1],
        })
    }

    /// Leave the innermost enclosing `while`.
    pub fn create_break(&mut self) -> StmtId {
        let inner = self.innermost_loop();
        assert!(
            matches!(inner, Some(StmtKind::While { .. })),
            "break outside of a while loop"
        );
        self.push_stmt(StmtKind::WhileControl {
            control: LoopControl::Break,
        })
    }

    /// Skip to the next iteration of the innermost `while` or `range-for`.
    pub fn create_continue(&mut self) -> StmtId {
        let inner = self.innermost_loop();
        assert!(
            matches!(
                inner,
                Some(StmtKind::While { .. }) | Some(StmtKind::RangeFor { .. })
            ),
            "continue outside of a loop"
        );
        self.push_stmt(StmtKind::Continue)
    }

    /// Innermost enclosing loop-like statement of the insertion point.
    fn innermost_loop(&self) -> Option<&StmtKind> {
        self.module
            .enclosing_stmts(self.current_block())
            .into_iter()
            .map(|id| &self.module.stmt(id).kind)
            .find(|k| {
                matches!(
                    k,
                    StmtKind::While { .. }
                        | StmtKind::RangeFor { .. }
                        | StmtKind::VertexFor { .. }
                        | StmtKind::FragmentFor { .. }
                )
            })
    }

    // ── Guard retrieval ───────────────────────────────────────────

    pub fn get_range_loop_guard(&mut self, loop_stmt: StmtId) -> Guard {
        let body = match &self.module.stmt(loop_stmt).kind {
            StmtKind::RangeFor { body, .. } => *body,
            _ => panic!("{} is not a range-for", loop_stmt),
        };
        self.add_guard(body)
    }

    pub fn get_while_loop_guard(&mut self, loop_stmt: StmtId) -> Guard {
        let body = match &self.module.stmt(loop_stmt).kind {
            StmtKind::While { body } => *body,
            _ => panic!("{} is not a while loop", loop_stmt),
        };
        self.add_guard(body)
    }

    pub fn get_vertex_loop_guard(&mut self, loop_stmt: StmtId) -> Guard {
        let body = match &self.module.stmt(loop_stmt).kind {
            StmtKind::VertexFor { body } => *body,
            _ => panic!("{} is not a vertex-for", loop_stmt),
        };
        self.add_guard(body)
    }

    pub fn get_fragment_loop_guard(&mut self, loop_stmt: StmtId) -> Guard {
        let body = match &self.module.stmt(loop_stmt).kind {
            StmtKind::FragmentFor { body } => *body,
            _ => panic!("{} is not a fragment-for", loop_stmt),
        };
        self.add_guard(body)
    }

    /// Guard for the then (`true`) or else (`false`) branch.
    pub fn get_if_guard(&mut self, stmt: StmtId, branch: bool) -> Guard {
        let block = match &self.module.stmt(stmt).kind {
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => {
                if branch {
                    *then_block
                } else {
                    *else_block
                }
            }
            _ => panic!("{} is not an if", stmt),
        };
        self.add_guard(block)
    }
}
