//! Resource descriptors consumed by the IR: fields and textures.
//!
//! The runtime owns the GPU objects behind these; the IR only records
//! the layout facts codegen needs (shape, element type, writability).

use serde::Serialize;

use super::types::PrimitiveType;

/// A dense N-dimensional array living inside a root buffer.
///
/// Root buffers are raw arrays of 32-bit words. A field occupies
/// `element_count() * components` words starting at `offset_words`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Field {
    pub id: u32,
    /// Root buffer holding this field.
    pub buffer: u32,
    /// Word offset of the first element inside the root buffer.
    pub offset_words: u32,
    /// Dimension extents, outermost first.
    pub shape: Vec<u32>,
    /// 32-bit words per element (1 for scalars, N for vectors).
    pub components: u32,
    pub dtype: PrimitiveType,
    pub writable: bool,
}

impl Field {
    /// A writable scalar field occupying its own root buffer.
    pub fn new(id: u32, shape: Vec<u32>, dtype: PrimitiveType) -> Self {
        Self {
            id,
            buffer: id,
            offset_words: 0,
            shape,
            components: 1,
            dtype,
            writable: true,
        }
    }

    pub fn with_components(mut self, components: u32) -> Self {
        self.components = components;
        self
    }

    pub fn in_buffer(mut self, buffer: u32, offset_words: u32) -> Self {
        self.buffer = buffer;
        self.offset_words = offset_words;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Number of elements, or `None` if it overflows `u32`.
    pub fn element_count(&self) -> Option<u32> {
        self.shape.iter().try_fold(1u32, |acc, &d| acc.checked_mul(d))
    }

    /// Total words occupied inside the root buffer.
    pub fn size_words(&self) -> Option<u32> {
        self.element_count()?.checked_mul(self.components)
    }

    /// Row-major word strides, one per dimension.
    pub fn strides(&self) -> Option<Vec<u32>> {
        let mut strides = vec![0; self.shape.len()];
        let mut acc = self.components;
        for (dim, stride) in self.shape.iter().zip(strides.iter_mut()).rev() {
            *stride = acc;
            acc = acc.checked_mul(*dim)?;
        }
        Some(strides)
    }

    /// Whether every word of the field can be indexed with an `i32`.
    pub fn is_addressable(&self) -> bool {
        self.size_words()
            .and_then(|n| n.checked_add(self.offset_words))
            .is_some_and(|end| i32::try_from(end).is_ok())
    }

    /// Word index inside the root buffer for `indices` plus a component offset.
    pub fn linear_index(&self, indices: &[i64], element_offset: u32) -> Option<i64> {
        debug_assert_eq!(indices.len(), self.shape.len());
        let body: i64 = indices
            .iter()
            .zip(self.strides()?)
            .map(|(i, s)| i * s as i64)
            .sum();
        Some(self.offset_words as i64 + body + element_offset as i64)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TextureDimension {
    D2,
    D3,
    Cube,
}

impl TextureDimension {
    /// Number of coordinate components addressing one texel.
    pub fn coord_count(self) -> usize {
        match self {
            TextureDimension::D2 => 2,
            TextureDimension::D3 | TextureDimension::Cube => 3,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            TextureDimension::D2 => "2d",
            TextureDimension::D3 => "3d",
            TextureDimension::Cube => "cube",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba16Float,
    Rgba32Float,
    Depth32Float,
}

impl TextureFormat {
    pub fn is_depth(self) -> bool {
        self == TextureFormat::Depth32Float
    }

    /// Texel format spelling for storage-texture declarations.
    pub fn storage_name(self) -> Option<&'static str> {
        match self {
            TextureFormat::Rgba8Unorm => Some("rgba8unorm"),
            TextureFormat::Rgba16Float => Some("rgba16float"),
            TextureFormat::Rgba32Float => Some("rgba32float"),
            TextureFormat::Depth32Float => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TextureInfo {
    pub id: u32,
    pub dimension: TextureDimension,
    pub format: TextureFormat,
}

impl TextureInfo {
    pub fn new(id: u32, dimension: TextureDimension, format: TextureFormat) -> Self {
        Self {
            id,
            dimension,
            format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strides_row_major() {
        let f = Field::new(0, vec![4, 3, 2], PrimitiveType::I32);
        assert_eq!(f.strides(), Some(vec![6, 2, 1]));
        assert_eq!(f.element_count(), Some(24));
    }

    #[test]
    fn test_strides_with_components() {
        let f = Field::new(0, vec![8, 5], PrimitiveType::F32).with_components(4);
        assert_eq!(f.strides(), Some(vec![20, 4]));
        assert_eq!(f.size_words(), Some(160));
    }

    #[test]
    fn test_linear_index_exhaustive() {
        let f = Field::new(0, vec![3, 4, 5], PrimitiveType::I32);
        let mut expected = 0;
        for i in 0..3 {
            for j in 0..4 {
                for k in 0..5 {
                    assert_eq!(f.linear_index(&[i, j, k], 0), Some(expected));
                    expected += 1;
                }
            }
        }
    }

    #[test]
    fn test_linear_index_with_offsets() {
        let f = Field::new(7, vec![3, 3], PrimitiveType::F32)
            .with_components(2)
            .in_buffer(1, 100);
        // (2 * 6) + (1 * 2) + 1 + base 100
        assert_eq!(f.linear_index(&[2, 1], 1), Some(115));
        assert_eq!(f.buffer, 1);
    }

    #[test]
    fn test_oversized_shapes() {
        let f = Field::new(0, vec![50000, 50000], PrimitiveType::I32);
        assert_eq!(f.element_count(), Some(2_500_000_000));
        assert!(!f.is_addressable());

        let f = Field::new(0, vec![1 << 20, 1 << 20], PrimitiveType::F32);
        assert_eq!(f.element_count(), None);
        assert_eq!(f.strides(), None);
        assert_eq!(f.linear_index(&[0, 0], 0), None);

        let f = Field::new(0, vec![1 << 20], PrimitiveType::I32).with_components(4096);
        assert_eq!(f.element_count(), Some(1 << 20));
        assert_eq!(f.size_words(), None);

        let f = Field::new(0, vec![16], PrimitiveType::I32).in_buffer(2, i32::MAX as u32 - 16);
        assert!(f.is_addressable());
        let f = f.in_buffer(2, i32::MAX as u32 - 15);
        assert!(!f.is_addressable());
    }

    #[test]
    fn test_texture_dimension() {
        assert_eq!(TextureDimension::D2.coord_count(), 2);
        assert_eq!(TextureDimension::Cube.coord_count(), 3);
        assert_eq!(TextureFormat::Rgba32Float.storage_name(), Some("rgba32float"));
        assert!(TextureFormat::Depth32Float.storage_name().is_none());
    }
}
