//! Literals and arithmetic.

use super::{Value, WgslCodegen};
use crate::codegen::error::CodegenError;
use crate::ir::stmt::{BinaryOp, ConstValue, StmtId, UnaryOp};
use crate::ir::types::{PrimitiveType, ValueType};

use PrimitiveType::{F32, I32};

/// Typed WGSL literal for a constant.
pub(super) fn const_value(c: ConstValue) -> Value {
    match c {
        ConstValue::I32(v) => Value::new(i32_literal(v), ValueType::scalar(I32)),
        ConstValue::F32(v) => Value::new(f32_literal(v), ValueType::scalar(F32)),
    }
}

pub(super) fn i32_literal(v: i32) -> String {
    if v == i32::MIN {
        // -2147483648i does not parse: the negation applies to an out-of-range literal
        format!("i32({})", v)
    } else {
        format!("{}i", v)
    }
}

pub(super) fn f32_literal(v: f32) -> String {
    if v.is_finite() {
        format!("{:?}f", v)
    } else {
        format!("bitcast<f32>({:#010x}u)", v.to_bits())
    }
}

fn zero(prim: PrimitiveType) -> &'static str {
    match prim {
        F32 => "0.0f",
        _ => "0i",
    }
}

fn scalar_name(prim: PrimitiveType) -> &'static str {
    match prim {
        F32 => "f32",
        _ => "i32",
    }
}

/// `prim` constructor of the given width: `f32` or `vec3<f32>`.
fn constructor(prim: &str, components: u32) -> String {
    if components == 1 {
        prim.to_string()
    } else {
        format!("vec{}<{}>", components, prim)
    }
}

/// `v` converted to `prim`, splatted to `components` when it is a scalar.
pub(super) fn coerce(v: &Value, prim: PrimitiveType, components: u32) -> String {
    let converted = if v.ty.prim == prim {
        v.expr.clone()
    } else {
        format!("{}({})", constructor(scalar_name(prim), v.ty.components), v.expr)
    };
    if v.ty.components == components {
        converted
    } else {
        format!("{}({})", constructor(scalar_name(prim), components), converted)
    }
}

/// Scalar `v` as a 32-bit word suitable for an `i32` buffer slot.
pub(super) fn to_word(v: &str, prim: PrimitiveType) -> String {
    match prim {
        F32 => format!("bitcast<i32>({})", v),
        _ => v.to_string(),
    }
}

pub(super) fn from_word(word: &str, prim: PrimitiveType) -> String {
    match prim {
        F32 => format!("bitcast<f32>({})", word),
        _ => word.to_string(),
    }
}

impl WgslCodegen<'_> {
    pub(super) fn visit_unary(
        &mut self,
        id: StmtId,
        op: UnaryOp,
        operand: StmtId,
    ) -> Result<(), CodegenError> {
        let x = self.value(id, operand)?;
        self.check_prim(id, x.ty.prim)?;
        let n = x.ty.components;
        let fty = ValueType::vector(F32, n);
        let ity = ValueType::vector(I32, n);
        let xf = coerce(&x, F32, n);
        let float_call = |f: &str| (fty, format!("{}({})", f, xf));

        let (ty, expr) = match op {
            UnaryOp::Neg => (x.ty, format!("-({})", x.expr)),
            UnaryOp::Round | UnaryOp::Floor | UnaryOp::Ceil if x.ty.prim == I32 => {
                (x.ty, x.expr.clone())
            }
            UnaryOp::Round => float_call("round"),
            UnaryOp::Floor => float_call("floor"),
            UnaryOp::Ceil => float_call("ceil"),
            UnaryOp::CastI32Value => (ity, coerce(&x, I32, n)),
            UnaryOp::CastF32Value => (fty, xf.clone()),
            UnaryOp::CastI32Bits => (
                ity,
                format!("bitcast<{}>({})", constructor("i32", n), x.expr),
            ),
            UnaryOp::CastF32Bits => (
                fty,
                format!("bitcast<{}>({})", constructor("f32", n), x.expr),
            ),
            UnaryOp::Abs => (x.ty, format!("abs({})", x.expr)),
            UnaryOp::Sgn => (x.ty, format!("sign({})", x.expr)),
            UnaryOp::Sqrt => float_call("sqrt"),
            UnaryOp::Sin => float_call("sin"),
            UnaryOp::Asin => float_call("asin"),
            UnaryOp::Cos => float_call("cos"),
            UnaryOp::Acos => float_call("acos"),
            UnaryOp::Tan => float_call("tan"),
            UnaryOp::Tanh => float_call("tanh"),
            UnaryOp::Exp => float_call("exp"),
            UnaryOp::Log => float_call("log"),
            UnaryOp::Rsqrt => float_call("inverseSqrt"),
            UnaryOp::Inv | UnaryOp::Rcp => (fty, format!("1.0f / {}", xf)),
            UnaryOp::BitNot => {
                self.require_int(id, op.name(), &x)?;
                (x.ty, format!("~{}", x.expr))
            }
            UnaryOp::LogicNot => {
                self.require_scalar(id, op.name(), &x)?;
                (ity, format!("i32({} == {})", x.expr, zero(x.ty.prim)))
            }
        };
        self.define(id, ty, expr)
    }

    pub(super) fn visit_binary(
        &mut self,
        id: StmtId,
        op: BinaryOp,
        lhs: StmtId,
        rhs: StmtId,
    ) -> Result<(), CodegenError> {
        let a = self.value(id, lhs)?;
        let b = self.value(id, rhs)?;
        self.check_prim(id, a.ty.prim)?;
        self.check_prim(id, b.ty.prim)?;

        let n = if a.ty.components == b.ty.components || b.ty.is_scalar() {
            a.ty.components
        } else if a.ty.is_scalar() {
            b.ty.components
        } else {
            return Err(CodegenError::mismatch(
                id,
                format!("{} operands have shapes {} and {}", op.name(), a.ty, b.ty),
            ));
        };
        let prim = if a.ty.prim == F32 || b.ty.prim == F32 {
            F32
        } else {
            I32
        };
        let ty = ValueType::vector(prim, n);
        let fty = ValueType::vector(F32, n);
        let ity = ValueType::vector(I32, n);
        let (pa, pb) = (coerce(&a, prim, n), coerce(&b, prim, n));
        let (fa, fb) = (coerce(&a, F32, n), coerce(&b, F32, n));

        if op.is_bitwise() {
            self.require_int(id, op.name(), &a)?;
            self.require_int(id, op.name(), &b)?;
        }

        let (ty, expr) = match op {
            BinaryOp::Mul => (ty, format!("{} * {}", pa, pb)),
            BinaryOp::Add => (ty, format!("{} + {}", pa, pb)),
            BinaryOp::Sub => (ty, format!("{} - {}", pa, pb)),
            BinaryOp::Div => (ty, format!("{} / {}", pa, pb)),
            BinaryOp::TrueDiv => (fty, format!("{} / {}", fa, fb)),
            BinaryOp::FloorDiv if prim == F32 => (ty, format!("floor({} / {})", pa, pb)),
            BinaryOp::FloorDiv => {
                self.require_scalar(id, op.name(), &a)?;
                self.require_scalar(id, op.name(), &b)?;
                (
                    ty,
                    format!(
                        "select({a} / {b}, {a} / {b} - 1i, ({a} % {b} != 0i) && (({a} < 0i) != ({b} < 0i)))",
                        a = pa,
                        b = pb
                    ),
                )
            }
            BinaryOp::Mod if prim == F32 => (
                ty,
                format!("{a} - {b} * floor({a} / {b})", a = pa, b = pb),
            ),
            BinaryOp::Mod => {
                self.require_scalar(id, op.name(), &a)?;
                self.require_scalar(id, op.name(), &b)?;
                let r = format!("t{}_r", id.0);
                self.line(format!("let {}: i32 = {} % {};", r, pa, pb));
                (
                    ty,
                    format!(
                        "select({r}, {r} + {b}, ({r} != 0i) && (({r} < 0i) != ({b} < 0i)))",
                        r = r,
                        b = pb
                    ),
                )
            }
            BinaryOp::Max => (ty, format!("max({}, {})", pa, pb)),
            BinaryOp::Min => (ty, format!("min({}, {})", pa, pb)),
            BinaryOp::BitAnd => (ty, format!("{} & {}", pa, pb)),
            BinaryOp::BitOr => (ty, format!("{} | {}", pa, pb)),
            BinaryOp::BitXor => (ty, format!("{} ^ {}", pa, pb)),
            BinaryOp::BitShl => (
                ty,
                format!("{} << {}({})", pa, constructor("u32", n), pb),
            ),
            BinaryOp::BitShr => (
                ty,
                format!(
                    "{}({u}({}) >> {u}({}))",
                    constructor("i32", n),
                    pa,
                    pb,
                    u = constructor("u32", n)
                ),
            ),
            BinaryOp::BitSar => (
                ty,
                format!("{} >> {}({})", pa, constructor("u32", n), pb),
            ),
            BinaryOp::CmpLt
            | BinaryOp::CmpLe
            | BinaryOp::CmpGt
            | BinaryOp::CmpGe
            | BinaryOp::CmpEq
            | BinaryOp::CmpNe => {
                let sym = match op {
                    BinaryOp::CmpLt => "<",
                    BinaryOp::CmpLe => "<=",
                    BinaryOp::CmpGt => ">",
                    BinaryOp::CmpGe => ">=",
                    BinaryOp::CmpEq => "==",
                    _ => "!=",
                };
                (
                    ity,
                    format!("{}({} {} {})", constructor("i32", n), pa, sym, pb),
                )
            }
            BinaryOp::Atan2 => (fty, format!("atan2({}, {})", fa, fb)),
            BinaryOp::Pow if prim == F32 => (ty, format!("pow({}, {})", pa, pb)),
            BinaryOp::Pow => (
                ty,
                format!("{}(round(pow({}, {})))", constructor("i32", n), fa, fb),
            ),
            BinaryOp::LogicalOr | BinaryOp::LogicalAnd => {
                self.require_scalar(id, op.name(), &a)?;
                self.require_scalar(id, op.name(), &b)?;
                let sym = if op == BinaryOp::LogicalOr { "||" } else { "&&" };
                (
                    ity,
                    format!(
                        "i32(({} != {}) {} ({} != {}))",
                        a.expr,
                        zero(a.ty.prim),
                        sym,
                        b.expr,
                        zero(b.ty.prim)
                    ),
                )
            }
        };
        self.define(id, ty, expr)
    }

    pub(super) fn visit_composite_extract(
        &mut self,
        id: StmtId,
        composite: StmtId,
        index: u32,
    ) -> Result<(), CodegenError> {
        let v = self.value(id, composite)?;
        if index >= v.ty.components || v.ty.is_scalar() {
            return Err(CodegenError::mismatch(
                id,
                format!("component {} of a {} value", index, v.ty),
            ));
        }
        let swizzle = ["x", "y", "z", "w"][index as usize];
        self.define(
            id,
            ValueType::scalar(v.ty.prim),
            format!("{}.{}", v.expr, swizzle),
        )
    }

    fn require_int(&self, id: StmtId, what: &str, v: &Value) -> Result<(), CodegenError> {
        if v.ty.prim == I32 {
            Ok(())
        } else {
            Err(CodegenError::mismatch(
                id,
                format!("{} needs integer operands, found {}", what, v.ty),
            ))
        }
    }

    fn require_scalar(&self, id: StmtId, what: &str, v: &Value) -> Result<(), CodegenError> {
        if v.ty.is_scalar() {
            Ok(())
        } else {
            Err(CodegenError::mismatch(
                id,
                format!("{} needs scalar operands, found {}", what, v.ty),
            ))
        }
    }
}
