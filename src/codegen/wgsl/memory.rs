//! Locals, field access, global temporaries, and atomics.

use super::expr::{from_word, to_word};
use super::{Value, WgslCodegen};
use crate::codegen::bindings::ResourceInfo;
use crate::codegen::error::CodegenError;
use crate::ir::field::Field;
use crate::ir::stmt::{AtomicOp, StmtId, StmtKind};
use crate::ir::types::{PrimitiveType, ValueType};

impl<'a> WgslCodegen<'a> {
    // ── Locals ────────────────────────────────────────────────────

    pub(super) fn visit_alloca(&mut self, id: StmtId, ty: PrimitiveType) -> Result<(), CodegenError> {
        let vt = ValueType::scalar(ty);
        let ty_name = self.type_name(id, vt)?;
        let name = format!("t{}", id.0);
        self.line(format!("var {}: {};", name, ty_name));
        self.alias(id, name, vt);
        Ok(())
    }

    pub(super) fn visit_local_load(&mut self, id: StmtId, ptr: StmtId) -> Result<(), CodegenError> {
        let var = self.value(id, ptr)?;
        self.define(id, var.ty, var.expr)
    }

    pub(super) fn visit_local_store(
        &mut self,
        id: StmtId,
        ptr: StmtId,
        value: StmtId,
    ) -> Result<(), CodegenError> {
        let var = self.value(id, ptr)?;
        let v = self.value(id, value)?;
        self.require_type(id, &v, var.ty)?;
        self.line(format!("{} = {};", var.expr, v.expr));
        Ok(())
    }

    // ── Fields ────────────────────────────────────────────────────

    /// Word index of a field element, with constant terms folded.
    pub(super) fn visit_global_ptr(
        &mut self,
        id: StmtId,
        field: &Field,
        indices: &[StmtId],
        element_offset: u32,
    ) -> Result<(), CodegenError> {
        self.check_prim(id, field.dtype)?;
        let strides = self.field_strides(id, field)?;
        let mut terms = Vec::new();
        for (&index, stride) in indices.iter().zip(strides) {
            let v = self.value(id, index)?;
            if v.ty != ValueType::scalar(PrimitiveType::I32) {
                return Err(CodegenError::mismatch(
                    id,
                    format!("field index {} must be i32, found {}", index, v.ty),
                ));
            }
            if stride == 1 {
                terms.push(v.expr);
            } else {
                terms.push(format!("{} * {}i", v.expr, stride));
            }
        }
        let base = field
            .offset_words
            .checked_add(element_offset)
            .and_then(|b| i32::try_from(b).ok())
            .ok_or(CodegenError::FieldOutOfRange {
                stmt: id,
                field: field.id,
            })?;
        if base != 0 || terms.is_empty() {
            terms.push(format!("{}i", base));
        }
        self.define(id, ValueType::scalar(PrimitiveType::I32), terms.join(" + "))
    }

    /// Element count of a field whose words are all `i32`-addressable.
    pub(super) fn field_elements(&self, id: StmtId, field: &Field) -> Result<i32, CodegenError> {
        field
            .element_count()
            .filter(|_| field.is_addressable())
            .and_then(|n| i32::try_from(n).ok())
            .ok_or(CodegenError::FieldOutOfRange {
                stmt: id,
                field: field.id,
            })
    }

    fn field_strides(&self, id: StmtId, field: &Field) -> Result<Vec<i32>, CodegenError> {
        let out_of_range = || CodegenError::FieldOutOfRange {
            stmt: id,
            field: field.id,
        };
        if !field.is_addressable() {
            return Err(out_of_range());
        }
        field
            .strides()
            .ok_or_else(out_of_range)?
            .into_iter()
            .map(|s| i32::try_from(s).map_err(|_| out_of_range()))
            .collect()
    }

    /// Field addressed by a `global_ptr` operand.
    fn field_of(&self, user: StmtId, ptr: StmtId) -> Result<&'a Field, CodegenError> {
        let module = self.module;
        match &module.stmt(ptr).kind {
            StmtKind::GlobalPtr { field, .. } => Ok(field),
            _ => Err(CodegenError::mismatch(
                user,
                format!("{} is not a global pointer", ptr),
            )),
        }
    }

    pub(super) fn visit_global_load(&mut self, id: StmtId, ptr: StmtId) -> Result<(), CodegenError> {
        let field = self.field_of(id, ptr)?;
        let index = self.value(id, ptr)?.expr;
        let buffer = self.root_buffer(field.buffer);
        self.define(
            id,
            ValueType::scalar(field.dtype),
            from_word(&format!("{}.member[{}]", buffer, index), field.dtype),
        )
    }

    pub(super) fn visit_global_store(
        &mut self,
        id: StmtId,
        ptr: StmtId,
        value: StmtId,
    ) -> Result<(), CodegenError> {
        let field = self.field_of(id, ptr)?;
        self.check_field_writable(id, field)?;
        let v = self.value(id, value)?;
        self.require_type(id, &v, ValueType::scalar(field.dtype))?;
        let index = self.value(id, ptr)?.expr;
        let buffer = self.root_buffer(field.buffer);
        self.line(format!(
            "{}.member[{}] = {};",
            buffer,
            index,
            to_word(&v.expr, field.dtype)
        ));
        Ok(())
    }

    fn check_field_writable(&self, id: StmtId, field: &Field) -> Result<(), CodegenError> {
        self.check_writable(id, ResourceInfo::root(field.buffer))?;
        if !field.writable {
            return Err(CodegenError::ReadOnlyResource {
                stmt: id,
                resource: format!("field {}", field.id),
                stage: self.stage.name(),
            });
        }
        Ok(())
    }

    // ── Global temporaries ────────────────────────────────────────

    /// Word index of a global temporary at byte `offset`.
    pub(super) fn temporary_word(&self, stmt: StmtId, offset: u32) -> Result<u32, CodegenError> {
        if offset % 4 != 0 {
            return Err(CodegenError::MisalignedTemporary { stmt, offset });
        }
        if offset
            .checked_add(4)
            .map_or(true, |end| end > self.config.global_tmps_bytes)
        {
            return Err(CodegenError::UndeclaredResource {
                stmt,
                message: format!(
                    "global temporary at byte {} lies outside the {}-byte buffer",
                    offset, self.config.global_tmps_bytes
                ),
            });
        }
        Ok(offset / 4)
    }

    pub(super) fn visit_global_temporary(
        &mut self,
        id: StmtId,
        ty: PrimitiveType,
        offset: u32,
    ) -> Result<(), CodegenError> {
        self.check_prim(id, ty)?;
        let word = self.temporary_word(id, offset)?;
        self.alias(id, word.to_string(), ValueType::scalar(ty));
        Ok(())
    }

    pub(super) fn visit_global_temporary_load(
        &mut self,
        id: StmtId,
        ptr: StmtId,
    ) -> Result<(), CodegenError> {
        let slot = self.temporary(id, ptr)?;
        let buffer = self.global_tmps();
        self.define(
            id,
            slot.ty,
            from_word(&format!("{}.member[{}]", buffer, slot.expr), slot.ty.prim),
        )
    }

    pub(super) fn visit_global_temporary_store(
        &mut self,
        id: StmtId,
        ptr: StmtId,
        value: StmtId,
    ) -> Result<(), CodegenError> {
        self.check_writable(id, ResourceInfo::global_tmps())?;
        let slot = self.temporary(id, ptr)?;
        let v = self.value(id, value)?;
        self.require_type(id, &v, slot.ty)?;
        let buffer = self.global_tmps();
        self.line(format!(
            "{}.member[{}] = {};",
            buffer,
            slot.expr,
            to_word(&v.expr, slot.ty.prim)
        ));
        Ok(())
    }

    fn temporary(&self, user: StmtId, ptr: StmtId) -> Result<Value, CodegenError> {
        match self.module.stmt(ptr).kind {
            StmtKind::GlobalTemporary { .. } => self.value(user, ptr),
            _ => Err(CodegenError::mismatch(
                user,
                format!("{} is not a global temporary", ptr),
            )),
        }
    }

    // ── Atomics ───────────────────────────────────────────────────

    /// Atomic view of the word behind `ptr`, plus its element type.
    ///
    /// Atomic bindings are always `read_write`, so graphics stages reject
    /// every atomic. A read-only field only rejects atomics that `write`.
    fn atomic_target(
        &mut self,
        user: StmtId,
        ptr: StmtId,
        write: bool,
    ) -> Result<(String, PrimitiveType), CodegenError> {
        let module = self.module;
        match &module.stmt(ptr).kind {
            StmtKind::GlobalPtr { field, .. } => {
                if write {
                    self.check_field_writable(user, field)?;
                } else {
                    self.check_writable(user, ResourceInfo::root_atomic(field.buffer))?;
                }
                let index = self.value(user, ptr)?.expr;
                let buffer = self.root_buffer_atomic(field.buffer);
                Ok((format!("{}.member[{}]", buffer, index), field.dtype))
            }
            StmtKind::GlobalTemporary { ty, .. } => {
                self.check_writable(user, ResourceInfo::global_tmps_atomic())?;
                let word = self.value(user, ptr)?.expr;
                let buffer = self.global_tmps_atomic();
                Ok((format!("{}.member[{}]", buffer, word), *ty))
            }
            _ => Err(CodegenError::mismatch(
                user,
                format!("{} cannot be the target of an atomic", ptr),
            )),
        }
    }

    pub(super) fn visit_atomic_op(
        &mut self,
        id: StmtId,
        op: AtomicOp,
        dest: StmtId,
        value: StmtId,
    ) -> Result<(), CodegenError> {
        let (target, prim) = self.atomic_target(id, dest, true)?;
        let v = self.value(id, value)?;
        self.require_type(id, &v, ValueType::scalar(prim))?;

        if prim == PrimitiveType::I32 {
            let f = match op {
                AtomicOp::Add => "atomicAdd",
                AtomicOp::Sub => "atomicSub",
                AtomicOp::Max => "atomicMax",
                AtomicOp::Min => "atomicMin",
            };
            return self.define(
                id,
                ValueType::scalar(prim),
                format!("{}(&{}, {})", f, target, v.expr),
            );
        }

        // f32: compare-exchange on the bit pattern until no other
        // invocation raced the update.
        let old = format!("t{}_old", id.0);
        let current = format!("bitcast<f32>({})", old);
        let combined = match op {
            AtomicOp::Add => format!("{} + {}", current, v.expr),
            AtomicOp::Sub => format!("{} - {}", current, v.expr),
            AtomicOp::Max => format!("max({}, {})", current, v.expr),
            AtomicOp::Min => format!("min({}, {})", current, v.expr),
        };
        let new = format!("t{}_new", id.0);
        let res = format!("t{}_res", id.0);
        self.line(format!("var {}: i32 = atomicLoad(&{});", old, target));
        self.line("loop {");
        self.indent += 1;
        self.line(format!("let {}: i32 = bitcast<i32>({});", new, combined));
        self.line(format!(
            "let {} = atomicCompareExchangeWeak(&{}, {}, {});",
            res, target, old, new
        ));
        self.line(format!("if ({}.exchanged) {{", res));
        self.line("    break;");
        self.line("}");
        self.line(format!("{} = {}.old_value;", old, res));
        self.indent -= 1;
        self.line("}");
        self.define(id, ValueType::scalar(prim), current)
    }

    pub(super) fn visit_atomic_load(&mut self, id: StmtId, ptr: StmtId) -> Result<(), CodegenError> {
        let (target, prim) = self.atomic_target(id, ptr, false)?;
        self.define(
            id,
            ValueType::scalar(prim),
            from_word(&format!("atomicLoad(&{})", target), prim),
        )
    }

    pub(super) fn visit_atomic_store(
        &mut self,
        id: StmtId,
        ptr: StmtId,
        value: StmtId,
    ) -> Result<(), CodegenError> {
        let (target, prim) = self.atomic_target(id, ptr, true)?;
        let v = self.value(id, value)?;
        self.require_type(id, &v, ValueType::scalar(prim))?;
        self.line(format!(
            "atomicStore(&{}, {});",
            target,
            to_word(&v.expr, prim)
        ));
        Ok(())
    }

    /// Stores never convert: the value must already have the slot's type.
    fn require_type(&self, id: StmtId, v: &Value, expected: ValueType) -> Result<(), CodegenError> {
        if v.ty == expected {
            Ok(())
        } else {
            Err(CodegenError::mismatch(
                id,
                format!("cannot store {} into a {} slot", v.ty, expected),
            ))
        }
    }
}
