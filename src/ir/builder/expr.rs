//! Literal, arithmetic, and composite factories.

use crate::ir::stmt::{BinaryOp, ConstValue, StmtId, StmtKind, UnaryOp};
use crate::ir::types::PrimitiveType;

use super::IrBuilder;

macro_rules! binary_factories {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            pub fn $name(&mut self, lhs: StmtId, rhs: StmtId) -> StmtId {
                self.create_binary_op(BinaryOp::$op, lhs, rhs)
            }
        )*
    };
}

macro_rules! unary_factories {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            pub fn $name(&mut self, operand: StmtId) -> StmtId {
                self.create_unary_op(UnaryOp::$op, operand)
            }
        )*
    };
}

impl IrBuilder {
    // ── Literals/config ───────────────────────────────────────────

    pub fn create_const_i32(&mut self, value: i32) -> StmtId {
        self.push_stmt(StmtKind::Const(ConstValue::I32(value)))
    }

    pub fn create_const_f32(&mut self, value: f32) -> StmtId {
        self.push_stmt(StmtKind::Const(ConstValue::F32(value)))
    }

    /// Current iteration index of an enclosing `range-for`.
    pub fn get_loop_index(&mut self, loop_stmt: StmtId) -> StmtId {
        self.expect_kind(loop_stmt, "a range-for", |k| {
            matches!(k, StmtKind::RangeFor { .. })
        });
        assert!(
            self.module
                .enclosing_stmts(self.current_block())
                .contains(&loop_stmt),
            "loop index of {} requested outside its body",
            loop_stmt
        );
        self.push_stmt(StmtKind::LoopIndex { loop_stmt })
    }

    /// Load the `arg_id`-th 32-bit word of the kernel argument block.
    pub fn create_arg_load(&mut self, ty: PrimitiveType, arg_id: u32) -> StmtId {
        self.push_stmt(StmtKind::ArgLoad { ty, arg_id })
    }

    pub fn create_rand(&mut self, ty: PrimitiveType) -> StmtId {
        self.push_stmt(StmtKind::Rand { ty })
    }

    // ── Arithmetic ────────────────────────────────────────────────

    pub fn create_binary_op(&mut self, op: BinaryOp, lhs: StmtId, rhs: StmtId) -> StmtId {
        self.push_stmt(StmtKind::BinaryOp { op, lhs, rhs })
    }

    pub fn create_unary_op(&mut self, op: UnaryOp, operand: StmtId) -> StmtId {
        self.push_stmt(StmtKind::UnaryOp { op, operand })
    }

    binary_factories! {
        create_mul => Mul,
        create_add => Add,
        create_sub => Sub,
        create_truediv => TrueDiv,
        create_floordiv => FloorDiv,
        create_div => Div,
        create_mod => Mod,
        create_max => Max,
        create_min => Min,
        create_bit_and => BitAnd,
        create_bit_or => BitOr,
        create_bit_xor => BitXor,
        create_bit_shl => BitShl,
        create_bit_shr => BitShr,
        create_bit_sar => BitSar,
        create_cmp_lt => CmpLt,
        create_cmp_le => CmpLe,
        create_cmp_gt => CmpGt,
        create_cmp_ge => CmpGe,
        create_cmp_eq => CmpEq,
        create_cmp_ne => CmpNe,
        create_atan2 => Atan2,
        create_pow => Pow,
        create_logical_or => LogicalOr,
        create_logical_and => LogicalAnd,
    }

    unary_factories! {
        create_neg => Neg,
        create_sqrt => Sqrt,
        create_round => Round,
        create_floor => Floor,
        create_ceil => Ceil,
        create_cast_i32_value => CastI32Value,
        create_cast_f32_value => CastF32Value,
        create_cast_i32_bits => CastI32Bits,
        create_cast_f32_bits => CastF32Bits,
        create_abs => Abs,
        create_sgn => Sgn,
        create_sin => Sin,
        create_asin => Asin,
        create_cos => Cos,
        create_acos => Acos,
        create_tan => Tan,
        create_tanh => Tanh,
        create_inv => Inv,
        create_rcp => Rcp,
        create_exp => Exp,
        create_log => Log,
        create_rsqrt => Rsqrt,
        create_bit_not => BitNot,
        create_logic_not => LogicNot,
    }

    // ── Composites ────────────────────────────────────────────────

    /// Select component `index` of a vector-valued statement.
    pub fn create_composite_extract(&mut self, composite: StmtId, index: u32) -> StmtId {
        assert!(index < 4, "composite index {} out of range", index);
        self.push_stmt(StmtKind::CompositeExtract { composite, index })
    }
}
