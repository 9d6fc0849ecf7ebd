//! Memory factories: scratch slots, field pointers, global temporaries, atomics.

use crate::ir::field::Field;
use crate::ir::stmt::{AtomicOp, StmtId, StmtKind};
use crate::ir::types::PrimitiveType;

use super::IrBuilder;

fn is_alloca(k: &StmtKind) -> bool {
    matches!(k, StmtKind::Alloca { .. })
}

fn is_global_ptr(k: &StmtKind) -> bool {
    matches!(k, StmtKind::GlobalPtr { .. })
}

fn is_global_temporary(k: &StmtKind) -> bool {
    matches!(k, StmtKind::GlobalTemporary { .. })
}

fn is_atomic_target(k: &StmtKind) -> bool {
    is_global_ptr(k) || is_global_temporary(k)
}

impl IrBuilder {
    // ── Local scratch slots ───────────────────────────────────────

    pub fn create_local_var(&mut self, ty: PrimitiveType) -> StmtId {
        self.push_stmt(StmtKind::Alloca { ty })
    }

    pub fn create_local_load(&mut self, ptr: StmtId) -> StmtId {
        self.expect_kind(ptr, "an alloca", is_alloca);
        self.push_stmt(StmtKind::LocalLoad { ptr })
    }

    pub fn create_local_store(&mut self, ptr: StmtId, value: StmtId) -> StmtId {
        self.expect_kind(ptr, "an alloca", is_alloca);
        self.push_stmt(StmtKind::LocalStore { ptr, value })
    }

    // ── Field buffers ─────────────────────────────────────────────

    /// Address of `field[indices...]`, plus `element_offset` words into
    /// the element (component selection for vector fields).
    pub fn create_global_ptr(
        &mut self,
        field: &Field,
        indices: &[StmtId],
        element_offset: u32,
    ) -> StmtId {
        assert_eq!(
            indices.len(),
            field.shape.len(),
            "field {} has {} dimension(s), got {} index(es)",
            field.id,
            field.shape.len(),
            indices.len()
        );
        assert!(
            element_offset < field.components,
            "element offset {} out of range for field {} ({} component(s))",
            element_offset,
            field.id,
            field.components
        );
        self.push_stmt(StmtKind::GlobalPtr {
            field: field.clone(),
            indices: indices.to_vec(),
            element_offset,
        })
    }

    pub fn create_global_load(&mut self, ptr: StmtId) -> StmtId {
        self.expect_kind(ptr, "a global pointer", is_global_ptr);
        self.push_stmt(StmtKind::GlobalLoad { ptr })
    }

    pub fn create_global_store(&mut self, ptr: StmtId, value: StmtId) -> StmtId {
        self.expect_kind(ptr, "a global pointer", is_global_ptr);
        self.push_stmt(StmtKind::GlobalStore { ptr, value })
    }

    // ── Global temporaries ────────────────────────────────────────

    /// Address of a dispatch-wide scratch value at byte `offset`.
    pub fn create_global_temporary(&mut self, ty: PrimitiveType, offset: u32) -> StmtId {
        self.push_stmt(StmtKind::GlobalTemporary { ty, offset })
    }

    pub fn create_global_temporary_load(&mut self, ptr: StmtId) -> StmtId {
        self.expect_kind(ptr, "a global temporary", is_global_temporary);
        self.push_stmt(StmtKind::GlobalTemporaryLoad { ptr })
    }

    pub fn create_global_temporary_store(&mut self, ptr: StmtId, value: StmtId) -> StmtId {
        self.expect_kind(ptr, "a global temporary", is_global_temporary);
        self.push_stmt(StmtKind::GlobalTemporaryStore { ptr, value })
    }

    // ── Atomics ───────────────────────────────────────────────────

    /// Atomic read-modify-write; the statement's value is the old contents.
    pub fn create_atomic_op(&mut self, op: AtomicOp, dest: StmtId, value: StmtId) -> StmtId {
        self.expect_kind(dest, "a global pointer or temporary", is_atomic_target);
        self.push_stmt(StmtKind::AtomicOp { op, dest, value })
    }

    pub fn create_atomic_add(&mut self, dest: StmtId, value: StmtId) -> StmtId {
        self.create_atomic_op(AtomicOp::Add, dest, value)
    }

    pub fn create_atomic_sub(&mut self, dest: StmtId, value: StmtId) -> StmtId {
        self.create_atomic_op(AtomicOp::Sub, dest, value)
    }

    pub fn create_atomic_max(&mut self, dest: StmtId, value: StmtId) -> StmtId {
        self.create_atomic_op(AtomicOp::Max, dest, value)
    }

    pub fn create_atomic_min(&mut self, dest: StmtId, value: StmtId) -> StmtId {
        self.create_atomic_op(AtomicOp::Min, dest, value)
    }

    pub fn create_atomic_load(&mut self, ptr: StmtId) -> StmtId {
        self.expect_kind(ptr, "a global pointer or temporary", is_atomic_target);
        self.push_stmt(StmtKind::AtomicLoad { ptr })
    }

    pub fn create_atomic_store(&mut self, ptr: StmtId, value: StmtId) -> StmtId {
        self.expect_kind(ptr, "a global pointer or temporary", is_atomic_target);
        self.push_stmt(StmtKind::AtomicStore { ptr, value })
    }
}
