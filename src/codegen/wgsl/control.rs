//! Branches, loops, and the grid-stride root loop.

use super::expr::i32_literal;
use super::WgslCodegen;
use crate::codegen::error::CodegenError;
use crate::codegen::task::RangeHint;
use crate::ir::stmt::{BlockId, ConstValue, RangeBound, StmtId, StmtKind};
use crate::ir::types::{PrimitiveType, ValueType};

impl WgslCodegen<'_> {
    pub(super) fn visit_if(
        &mut self,
        id: StmtId,
        cond: StmtId,
        then_block: BlockId,
        else_block: BlockId,
    ) -> Result<(), CodegenError> {
        let c = self.scalar(id, cond)?;
        let zero = if c.ty.prim == PrimitiveType::F32 { "0.0f" } else { "0i" };
        self.line(format!("if ({} != {}) {{", c.expr, zero));
        self.nested(|g| g.visit_block(then_block))?;
        if !self.module.block(else_block).stmts.is_empty() {
            self.line("} else {");
            self.nested(|g| g.visit_block(else_block))?;
        }
        self.line("}");
        Ok(())
    }

    /// `while true`; exits only through `break`.
    pub(super) fn visit_while(&mut self, body: BlockId) -> Result<(), CodegenError> {
        self.line("loop {");
        self.nested(|g| g.visit_block(body))?;
        self.line("}");
        Ok(())
    }

    /// A range-for nested inside an offload runs serially in each invocation.
    pub(super) fn visit_range_for(
        &mut self,
        id: StmtId,
        bound: &RangeBound,
        body: BlockId,
    ) -> Result<(), CodegenError> {
        let end = match bound {
            RangeBound::Value(v) => {
                let v = self.scalar(id, *v)?;
                if v.ty.prim != PrimitiveType::I32 {
                    return Err(CodegenError::mismatch(
                        id,
                        format!("range bound must be i32, found {}", v.ty),
                    ));
                }
                v.expr
            }
            RangeBound::FieldElements(field) => i32_literal(self.field_elements(id, field)?),
        };
        let var = format!("t{}_i", id.0);
        self.line(format!(
            "for (var {v}: i32 = 0i; {v} < {end}; {v} = {v} + 1i) {{",
            v = var,
            end = end
        ));
        self.nested(|g| g.visit_block(body))?;
        self.line("}");
        Ok(())
    }

    pub(super) fn visit_loop_index(
        &mut self,
        id: StmtId,
        loop_stmt: StmtId,
    ) -> Result<(), CodegenError> {
        let name = if self.root_loop == Some(loop_stmt) {
            "ii".to_string()
        } else if self.is_open_loop(id, loop_stmt) {
            format!("t{}_i", loop_stmt.0)
        } else {
            return Err(CodegenError::CrossOffloadReference {
                stmt: id,
                operand: loop_stmt,
            });
        };
        self.alias(id, name, ValueType::scalar(PrimitiveType::I32));
        Ok(())
    }

    fn is_open_loop(&self, id: StmtId, loop_stmt: StmtId) -> bool {
        self.module
            .enclosing_stmts(self.module.stmt(id).block)
            .contains(&loop_stmt)
    }

    /// Root range-for of a `RangeFor` offload: every invocation strides
    /// over the iteration space by the total invocation count.
    pub(super) fn generate_range_for(&mut self, root: StmtId) -> Result<(), CodegenError> {
        let module = self.module;
        let (bound, body) = match &module.stmt(root).kind {
            StmtKind::RangeFor { bound, body, .. } => (bound, *body),
            _ => return Err(self.no_handler(root)),
        };

        let (end, hint) = match bound {
            RangeBound::Value(v) => match &module.stmt(*v).kind {
                StmtKind::Const(ConstValue::I32(n)) => {
                    let n = (*n).max(0) as u32;
                    (format!("{}i", n), RangeHint::Const(n))
                }
                StmtKind::GlobalTemporaryLoad { ptr } => {
                    let offset = match module.stmt(*ptr).kind {
                        StmtKind::GlobalTemporary {
                            ty: PrimitiveType::I32,
                            offset,
                        } => offset,
                        _ => {
                            return Err(CodegenError::mismatch(
                                root,
                                "a dynamic range bound must be an i32 global temporary",
                            ))
                        }
                    };
                    let word = self.temporary_word(*ptr, offset)?;
                    let tmps = self.global_tmps();
                    (
                        format!("{}.member[{}]", tmps, word),
                        RangeHint::Dynamic { offset },
                    )
                }
                StmtKind::Const(ConstValue::F32(_)) => {
                    return Err(CodegenError::mismatch(root, "range bound must be i32, found f32"))
                }
                _ => {
                    return Err(CodegenError::CrossOffloadReference {
                        stmt: root,
                        operand: *v,
                    })
                }
            },
            RangeBound::FieldElements(field) => {
                let count = self.field_elements(root, field)?.unsigned_abs();
                (
                    format!("{}i", count),
                    RangeHint::FieldElements {
                        field: field.id,
                        count,
                    },
                )
            }
        };

        self.num_workgroups = match hint {
            RangeHint::Const(n) | RangeHint::FieldElements { count: n, .. } => {
                self.config.workgroups_for(n)
            }
            RangeHint::Dynamic { .. } => self.config.dynamic_workgroups,
        };
        self.range = Some(hint);
        self.root_loop = Some(root);

        self.prologue_line(format!(
            "let total_invocs = i32(num_workgroups.x) * {}i;",
            self.config.workgroup_size
        ));
        self.prologue_line(format!("let range_end: i32 = {};", end));
        self.line(
            "for (var ii: i32 = i32(global_invocation_id.x); ii < range_end; ii = ii + total_invocs) {",
        );
        self.nested(|g| g.visit_block(body))?;
        self.line("}");
        Ok(())
    }
}
