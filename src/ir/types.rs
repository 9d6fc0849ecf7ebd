//! Primitive type system: element kinds and their WGSL spellings.
//!
//! Every IR value is a scalar or a short vector of one primitive kind.
//! Only 32-bit kinds have a WGSL representation; the 64-bit kinds exist
//! so a front end can describe host values faithfully, and codegen rejects
//! them with [`TypeError::Unsupported`] instead of emitting malformed text.

use std::fmt;

use serde::Serialize;

/// Scalar element kind of an IR value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    I32,
    F32,
    I64,
    F64,
}

impl PrimitiveType {
    pub fn is_float(self) -> bool {
        matches!(self, PrimitiveType::F32 | PrimitiveType::F64)
    }

    pub fn is_integer(self) -> bool {
        !self.is_float()
    }

    /// Size of one element in bytes.
    pub fn byte_size(self) -> u32 {
        match self {
            PrimitiveType::I32 | PrimitiveType::F32 => 4,
            PrimitiveType::I64 | PrimitiveType::F64 => 8,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::I32 => write!(f, "i32"),
            PrimitiveType::F32 => write!(f, "f32"),
            PrimitiveType::I64 => write!(f, "i64"),
            PrimitiveType::F64 => write!(f, "f64"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("primitive type `{0}` has no WGSL representation")]
    Unsupported(PrimitiveType),
    #[error("cannot form a {0}-component value")]
    BadComponentCount(u32),
}

/// WGSL name of a primitive kind.
pub fn primitive_type_name(dt: PrimitiveType) -> Result<&'static str, TypeError> {
    match dt {
        PrimitiveType::I32 => Ok("i32"),
        PrimitiveType::F32 => Ok("f32"),
        other => Err(TypeError::Unsupported(other)),
    }
}

/// WGSL name of a scalar (`n == 1`) or `vecN` (`n` in 2..=4) value.
pub fn scalar_or_vector_type_name(dt: PrimitiveType, n: u32) -> Result<String, TypeError> {
    let scalar = primitive_type_name(dt)?;
    match n {
        1 => Ok(scalar.to_string()),
        2..=4 => Ok(format!("vec{}<{}>", n, scalar)),
        _ => Err(TypeError::BadComponentCount(n)),
    }
}

/// Byte size of a scalar or vector value (no trailing padding).
pub fn scalar_or_vector_byte_size(dt: PrimitiveType, n: u32) -> Result<u32, TypeError> {
    primitive_type_name(dt)?;
    match n {
        1..=4 => Ok(dt.byte_size() * n),
        _ => Err(TypeError::BadComponentCount(n)),
    }
}

/// WGSL name of a `cols x rows` matrix. WGSL matrices are float-only.
pub fn matrix_type_name(dt: PrimitiveType, cols: u32, rows: u32) -> Result<String, TypeError> {
    if dt != PrimitiveType::F32 {
        return Err(TypeError::Unsupported(dt));
    }
    for n in [cols, rows] {
        if !(2..=4).contains(&n) {
            return Err(TypeError::BadComponentCount(n));
        }
    }
    Ok(format!("mat{}x{}<f32>", cols, rows))
}

/// Byte size of a matrix; each column is padded to its vector alignment,
/// so a three-row column occupies 16 bytes.
pub fn matrix_byte_size(dt: PrimitiveType, cols: u32, rows: u32) -> Result<u32, TypeError> {
    matrix_type_name(dt, cols, rows)?;
    let column_stride = if rows == 3 { 16 } else { rows * 4 };
    Ok(cols * column_stride)
}

/// Type of one IR value: a primitive kind and a component count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueType {
    pub prim: PrimitiveType,
    pub components: u32,
}

impl ValueType {
    pub fn scalar(prim: PrimitiveType) -> Self {
        Self {
            prim,
            components: 1,
        }
    }

    pub fn vector(prim: PrimitiveType, components: u32) -> Self {
        Self { prim, components }
    }

    pub fn is_scalar(&self) -> bool {
        self.components == 1
    }

    pub fn name(&self) -> Result<String, TypeError> {
        scalar_or_vector_type_name(self.prim, self.components)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components == 1 {
            write!(f, "{}", self.prim)
        } else {
            write!(f, "{}x{}", self.prim, self.components)
        }
    }
}
