//! Statement kinds of the IR.
//!
//! A statement is an arena entry addressed by [`StmtId`]. Operands are
//! ids of earlier statements; control-flow statements own child blocks
//! addressed by [`BlockId`].

use std::fmt;

use serde::Serialize;

use super::field::{Field, TextureInfo};
use super::types::PrimitiveType;

/// Identity of a statement. Assignment order is definition order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StmtId(pub u32);

impl StmtId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Identity of a block inside one IR module. Block 0 is the module root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl BlockId {
    pub const ROOT: BlockId = BlockId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ─── Operator tags ────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Mul,
    Add,
    Sub,
    /// Always produces f32.
    TrueDiv,
    /// Rounds toward negative infinity.
    FloorDiv,
    /// Native division of the promoted operand type.
    Div,
    /// Result takes the sign of the divisor.
    Mod,
    Max,
    Min,
    BitAnd,
    BitOr,
    BitXor,
    BitShl,
    /// Logical shift right.
    BitShr,
    /// Arithmetic shift right.
    BitSar,
    CmpLt,
    CmpLe,
    CmpGt,
    CmpGe,
    CmpEq,
    CmpNe,
    Atan2,
    Pow,
    LogicalOr,
    LogicalAnd,
}

impl BinaryOp {
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Mul => "mul",
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::TrueDiv => "truediv",
            BinaryOp::FloorDiv => "floordiv",
            BinaryOp::Div => "div",
            BinaryOp::Mod => "mod",
            BinaryOp::Max => "max",
            BinaryOp::Min => "min",
            BinaryOp::BitAnd => "bit_and",
            BinaryOp::BitOr => "bit_or",
            BinaryOp::BitXor => "bit_xor",
            BinaryOp::BitShl => "bit_shl",
            BinaryOp::BitShr => "bit_shr",
            BinaryOp::BitSar => "bit_sar",
            BinaryOp::CmpLt => "cmp_lt",
            BinaryOp::CmpLe => "cmp_le",
            BinaryOp::CmpGt => "cmp_gt",
            BinaryOp::CmpGe => "cmp_ge",
            BinaryOp::CmpEq => "cmp_eq",
            BinaryOp::CmpNe => "cmp_ne",
            BinaryOp::Atan2 => "atan2",
            BinaryOp::Pow => "pow",
            BinaryOp::LogicalOr => "logical_or",
            BinaryOp::LogicalAnd => "logical_and",
        }
    }

    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor
                | BinaryOp::BitShl
                | BinaryOp::BitShr
                | BinaryOp::BitSar
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Sqrt,
    Round,
    Floor,
    Ceil,
    CastI32Value,
    CastF32Value,
    CastI32Bits,
    CastF32Bits,
    Abs,
    Sgn,
    Sin,
    Asin,
    Cos,
    Acos,
    Tan,
    Tanh,
    Inv,
    Rcp,
    Exp,
    Log,
    Rsqrt,
    BitNot,
    LogicNot,
}

impl UnaryOp {
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Round => "round",
            UnaryOp::Floor => "floor",
            UnaryOp::Ceil => "ceil",
            UnaryOp::CastI32Value => "cast_i32_value",
            UnaryOp::CastF32Value => "cast_f32_value",
            UnaryOp::CastI32Bits => "cast_i32_bits",
            UnaryOp::CastF32Bits => "cast_f32_bits",
            UnaryOp::Abs => "abs",
            UnaryOp::Sgn => "sgn",
            UnaryOp::Sin => "sin",
            UnaryOp::Asin => "asin",
            UnaryOp::Cos => "cos",
            UnaryOp::Acos => "acos",
            UnaryOp::Tan => "tan",
            UnaryOp::Tanh => "tanh",
            UnaryOp::Inv => "inv",
            UnaryOp::Rcp => "rcp",
            UnaryOp::Exp => "exp",
            UnaryOp::Log => "log",
            UnaryOp::Rsqrt => "rsqrt",
            UnaryOp::BitNot => "bit_not",
            UnaryOp::LogicNot => "logic_not",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AtomicOp {
    Add,
    Sub,
    Max,
    Min,
}

impl AtomicOp {
    pub fn name(self) -> &'static str {
        match self {
            AtomicOp::Add => "add",
            AtomicOp::Sub => "sub",
            AtomicOp::Max => "max",
            AtomicOp::Min => "min",
        }
    }
}

/// Discriminator carried by a `while-control` statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoopControl {
    Break,
    Continue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BuiltinInput {
    VertexIndex,
    InstanceIndex,
    /// Fragment-stage window position.
    FragCoord,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BuiltinOutput {
    Position,
    FragDepth,
    Color(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DerivativeAxis {
    X,
    Y,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureOp {
    Sample,
    SampleLod,
    Load,
    Store,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConstValue {
    I32(i32),
    F32(f32),
}

impl ConstValue {
    pub fn prim(&self) -> PrimitiveType {
        match self {
            ConstValue::I32(_) => PrimitiveType::I32,
            ConstValue::F32(_) => PrimitiveType::F32,
        }
    }
}

/// Iteration bound of a `range-for`.
#[derive(Clone, Debug, PartialEq)]
pub enum RangeBound {
    /// Loop runs `0..value`.
    Value(StmtId),
    /// Loop runs over every element of a field.
    FieldElements(Field),
}

// ─── Statements ───────────────────────────────────────────────────

/// Statement payload. 35 variants in five groups:
///
/// **Literals/config**: `Const`, `LoopIndex`, `ArgLoad`, `Rand`
///
/// **Arithmetic**: `UnaryOp`, `BinaryOp` (operator is a tag)
///
/// **Control flow**: `If`, `While`, `WhileControl`, `Continue`,
/// `RangeFor`, `VertexFor`, `FragmentFor`
///
/// **Memory**: `Alloca`, `LocalLoad`, `LocalStore`, `GlobalPtr`,
/// `GlobalLoad`, `GlobalStore`, `GlobalTemporary`, `GlobalTemporaryLoad`,
/// `GlobalTemporaryStore`, `AtomicOp`, `AtomicLoad`, `AtomicStore`
///
/// **Stage I/O**: `VertexInput`, `VertexOutput`, `FragmentInput`,
/// `BuiltinInput`, `BuiltinOutput`, `FragmentDerivative`, `Discard`,
/// `TextureFunction`, `CompositeExtract`, `Return`
#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    // ── Literals/config ──
    Const(ConstValue),
    LoopIndex {
        loop_stmt: StmtId,
    },
    ArgLoad {
        ty: PrimitiveType,
        arg_id: u32,
    },
    Rand {
        ty: PrimitiveType,
    },

    // ── Arithmetic ──
    UnaryOp {
        op: UnaryOp,
        operand: StmtId,
    },
    BinaryOp {
        op: BinaryOp,
        lhs: StmtId,
        rhs: StmtId,
    },

    // ── Control flow ──
    If {
        cond: StmtId,
        then_block: BlockId,
        else_block: BlockId,
    },
    While {
        body: BlockId,
    },
    WhileControl {
        control: LoopControl,
    },
    Continue,
    RangeFor {
        bound: RangeBound,
        strictly_serialize: bool,
        body: BlockId,
    },
    VertexFor {
        body: BlockId,
    },
    FragmentFor {
        body: BlockId,
    },

    // ── Memory ──
    Alloca {
        ty: PrimitiveType,
    },
    LocalLoad {
        ptr: StmtId,
    },
    LocalStore {
        ptr: StmtId,
        value: StmtId,
    },
    GlobalPtr {
        field: Field,
        indices: Vec<StmtId>,
        element_offset: u32,
    },
    GlobalLoad {
        ptr: StmtId,
    },
    GlobalStore {
        ptr: StmtId,
        value: StmtId,
    },
    GlobalTemporary {
        ty: PrimitiveType,
        offset: u32,
    },
    GlobalTemporaryLoad {
        ptr: StmtId,
    },
    GlobalTemporaryStore {
        ptr: StmtId,
        value: StmtId,
    },
    AtomicOp {
        op: AtomicOp,
        dest: StmtId,
        value: StmtId,
    },
    AtomicLoad {
        ptr: StmtId,
    },
    AtomicStore {
        ptr: StmtId,
        value: StmtId,
    },

    // ── Stage I/O ──
    VertexInput {
        ty: PrimitiveType,
        location: u32,
    },
    VertexOutput {
        value: StmtId,
        location: u32,
    },
    FragmentInput {
        ty: PrimitiveType,
        location: u32,
    },
    BuiltinInput {
        builtin: BuiltinInput,
    },
    BuiltinOutput {
        builtin: BuiltinOutput,
        values: Vec<StmtId>,
    },
    FragmentDerivative {
        axis: DerivativeAxis,
        operand: StmtId,
    },
    Discard,
    TextureFunction {
        op: TextureOp,
        texture: TextureInfo,
        coords: Vec<StmtId>,
        /// Level of detail for `SampleLod`, texel components for `Store`.
        operands: Vec<StmtId>,
    },
    CompositeExtract {
        composite: StmtId,
        index: u32,
    },
    Return {
        values: Vec<StmtId>,
    },
}

/// One IR node.
#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub id: StmtId,
    /// Block this statement was appended to.
    pub block: BlockId,
    pub kind: StmtKind,
}

impl Stmt {
    /// Statements this one reads, in operand order.
    pub fn operands(&self) -> Vec<StmtId> {
        match &self.kind {
            StmtKind::Const(_)
            | StmtKind::ArgLoad { .. }
            | StmtKind::Rand { .. }
            | StmtKind::While { .. }
            | StmtKind::WhileControl { .. }
            | StmtKind::Continue
            | StmtKind::VertexFor { .. }
            | StmtKind::FragmentFor { .. }
            | StmtKind::Alloca { .. }
            | StmtKind::GlobalTemporary { .. }
            | StmtKind::VertexInput { .. }
            | StmtKind::FragmentInput { .. }
            | StmtKind::BuiltinInput { .. }
            | StmtKind::Discard => Vec::new(),
            StmtKind::LoopIndex { loop_stmt } => vec![*loop_stmt],
            StmtKind::UnaryOp { operand, .. } => vec![*operand],
            StmtKind::BinaryOp { lhs, rhs, .. } => vec![*lhs, *rhs],
            StmtKind::If { cond, .. } => vec![*cond],
            StmtKind::RangeFor { bound, .. } => match bound {
                RangeBound::Value(v) => vec![*v],
                RangeBound::FieldElements(_) => Vec::new(),
            },
            StmtKind::LocalLoad { ptr }
            | StmtKind::GlobalLoad { ptr }
            | StmtKind::GlobalTemporaryLoad { ptr }
            | StmtKind::AtomicLoad { ptr } => vec![*ptr],
            StmtKind::LocalStore { ptr, value }
            | StmtKind::GlobalStore { ptr, value }
            | StmtKind::GlobalTemporaryStore { ptr, value }
            | StmtKind::AtomicStore { ptr, value } => vec![*ptr, *value],
            StmtKind::GlobalPtr { indices, .. } => indices.clone(),
            StmtKind::AtomicOp { dest, value, .. } => vec![*dest, *value],
            StmtKind::VertexOutput { value, .. } => vec![*value],
            StmtKind::BuiltinOutput { values, .. } | StmtKind::Return { values } => {
                values.clone()
            }
            StmtKind::FragmentDerivative { operand, .. } => vec![*operand],
            StmtKind::TextureFunction {
                coords, operands, ..
            } => coords.iter().chain(operands.iter()).copied().collect(),
            StmtKind::CompositeExtract { composite, .. } => vec![*composite],
        }
    }

    /// Nested blocks owned by this statement.
    pub fn child_blocks(&self) -> Vec<BlockId> {
        match &self.kind {
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            StmtKind::While { body }
            | StmtKind::RangeFor { body, .. }
            | StmtKind::VertexFor { body }
            | StmtKind::FragmentFor { body } => vec![*body],
            _ => Vec::new(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            StmtKind::Const(_) => "const",
            StmtKind::LoopIndex { .. } => "loop_index",
            StmtKind::ArgLoad { .. } => "arg_load",
            StmtKind::Rand { .. } => "rand",
            StmtKind::UnaryOp { .. } => "unary_op",
            StmtKind::BinaryOp { .. } => "binary_op",
            StmtKind::If { .. } => "if",
            StmtKind::While { .. } => "while",
            StmtKind::WhileControl { .. } => "while_control",
            StmtKind::Continue => "continue",
            StmtKind::RangeFor { .. } => "range_for",
            StmtKind::VertexFor { .. } => "vertex_for",
            StmtKind::FragmentFor { .. } => "fragment_for",
            StmtKind::Alloca { .. } => "alloca",
            StmtKind::LocalLoad { .. } => "local_load",
            StmtKind::LocalStore { .. } => "local_store",
            StmtKind::GlobalPtr { .. } => "global_ptr",
            StmtKind::GlobalLoad { .. } => "global_load",
            StmtKind::GlobalStore { .. } => "global_store",
            StmtKind::GlobalTemporary { .. } => "global_temporary",
            StmtKind::GlobalTemporaryLoad { .. } => "global_temporary_load",
            StmtKind::GlobalTemporaryStore { .. } => "global_temporary_store",
            StmtKind::AtomicOp { .. } => "atomic_op",
            StmtKind::AtomicLoad { .. } => "atomic_load",
            StmtKind::AtomicStore { .. } => "atomic_store",
            StmtKind::VertexInput { .. } => "vertex_input",
            StmtKind::VertexOutput { .. } => "vertex_output",
            StmtKind::FragmentInput { .. } => "fragment_input",
            StmtKind::BuiltinInput { .. } => "builtin_input",
            StmtKind::BuiltinOutput { .. } => "builtin_output",
            StmtKind::FragmentDerivative { .. } => "fragment_derivative",
            StmtKind::Discard => "discard",
            StmtKind::TextureFunction { .. } => "texture_function",
            StmtKind::CompositeExtract { .. } => "composite_extract",
            StmtKind::Return { .. } => "return",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmt(id: u32, kind: StmtKind) -> Stmt {
        Stmt {
            id: StmtId(id),
            block: BlockId::ROOT,
            kind,
        }
    }

    #[test]
    fn test_stmt_id_display() {
        assert_eq!(StmtId(7).to_string(), "%7");
    }

    #[test]
    fn test_operands_in_order() {
        let s = stmt(
            3,
            StmtKind::BinaryOp {
                op: BinaryOp::Sub,
                lhs: StmtId(2),
                rhs: StmtId(0),
            },
        );
        assert_eq!(s.operands(), vec![StmtId(2), StmtId(0)]);

        let s = stmt(
            9,
            StmtKind::TextureFunction {
                op: TextureOp::SampleLod,
                texture: TextureInfo::new(
                    0,
                    super::super::field::TextureDimension::D2,
                    super::super::field::TextureFormat::Rgba8Unorm,
                ),
                coords: vec![StmtId(4), StmtId(5)],
                operands: vec![StmtId(6)],
            },
        );
        assert_eq!(s.operands(), vec![StmtId(4), StmtId(5), StmtId(6)]);
    }

    #[test]
    fn test_control_flow_blocks() {
        let s = stmt(
            1,
            StmtKind::If {
                cond: StmtId(0),
                then_block: BlockId(1),
                else_block: BlockId(2),
            },
        );
        assert_eq!(s.child_blocks(), vec![BlockId(1), BlockId(2)]);
        assert!(stmt(2, StmtKind::Discard).child_blocks().is_empty());
    }

    #[test]
    fn test_operator_classes() {
        assert!(BinaryOp::BitSar.is_bitwise());
        assert_eq!(UnaryOp::Rsqrt.name(), "rsqrt");
        assert_eq!(AtomicOp::Max.name(), "max");
    }

    #[test]
    fn test_const_value_types() {
        assert_eq!(ConstValue::I32(-3).prim(), PrimitiveType::I32);
        assert_eq!(ConstValue::F32(0.5).prim(), PrimitiveType::F32);
        assert_ne!(ConstValue::F32(f32::NAN), ConstValue::F32(f32::NAN));
        assert_ne!(ConstValue::F32(1.0), ConstValue::I32(1));
    }
}
