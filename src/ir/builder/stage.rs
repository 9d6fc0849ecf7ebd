//! Stage I/O, texture, and return factories.

use crate::ir::field::TextureInfo;
use crate::ir::stmt::{BuiltinInput, BuiltinOutput, DerivativeAxis, StmtId, StmtKind, TextureOp};
use crate::ir::types::PrimitiveType;

use super::IrBuilder;

impl IrBuilder {
    // ── Vertex/fragment varyings ──────────────────────────────────

    pub fn create_vertex_input(&mut self, ty: PrimitiveType, location: u32) -> StmtId {
        self.push_stmt(StmtKind::VertexInput { ty, location })
    }

    pub fn create_vertex_output(&mut self, value: StmtId, location: u32) -> StmtId {
        self.push_stmt(StmtKind::VertexOutput { value, location })
    }

    pub fn create_fragment_input(&mut self, ty: PrimitiveType, location: u32) -> StmtId {
        self.push_stmt(StmtKind::FragmentInput { ty, location })
    }

    // ── Built-ins ─────────────────────────────────────────────────

    pub fn create_vertex_index_input(&mut self) -> StmtId {
        self.push_stmt(StmtKind::BuiltinInput {
            builtin: BuiltinInput::VertexIndex,
        })
    }

    pub fn create_instance_index_input(&mut self) -> StmtId {
        self.push_stmt(StmtKind::BuiltinInput {
            builtin: BuiltinInput::InstanceIndex,
        })
    }

    pub fn create_frag_coord_input(&mut self) -> StmtId {
        self.push_stmt(StmtKind::BuiltinInput {
            builtin: BuiltinInput::FragCoord,
        })
    }

    /// Clip-space position: exactly four components.
    pub fn create_position_output(&mut self, values: &[StmtId]) -> StmtId {
        assert_eq!(values.len(), 4, "position output takes 4 components");
        self.push_stmt(StmtKind::BuiltinOutput {
            builtin: BuiltinOutput::Position,
            values: values.to_vec(),
        })
    }

    /// Color for render target `location`: exactly four components.
    pub fn create_color_output(&mut self, location: u32, values: &[StmtId]) -> StmtId {
        assert_eq!(values.len(), 4, "color output takes 4 components");
        self.push_stmt(StmtKind::BuiltinOutput {
            builtin: BuiltinOutput::Color(location),
            values: values.to_vec(),
        })
    }

    pub fn create_depth_output(&mut self, value: StmtId) -> StmtId {
        self.push_stmt(StmtKind::BuiltinOutput {
            builtin: BuiltinOutput::FragDepth,
            values: vec![value],
        })
    }

    // ── Fragment-only operations ──────────────────────────────────

    pub fn create_discard(&mut self) -> StmtId {
        self.push_stmt(StmtKind::Discard)
    }

    pub fn create_dpdx(&mut self, operand: StmtId) -> StmtId {
        self.push_stmt(StmtKind::FragmentDerivative {
            axis: DerivativeAxis::X,
            operand,
        })
    }

    pub fn create_dpdy(&mut self, operand: StmtId) -> StmtId {
        self.push_stmt(StmtKind::FragmentDerivative {
            axis: DerivativeAxis::Y,
            operand,
        })
    }

    // ── Textures ──────────────────────────────────────────────────

    pub fn create_texture_sample(&mut self, texture: &TextureInfo, coords: &[StmtId]) -> StmtId {
        self.texture_function(TextureOp::Sample, texture, coords, &[])
    }

    pub fn create_texture_sample_lod(
        &mut self,
        texture: &TextureInfo,
        coords: &[StmtId],
        lod: StmtId,
    ) -> StmtId {
        self.texture_function(TextureOp::SampleLod, texture, coords, &[lod])
    }

    pub fn create_texture_load(&mut self, texture: &TextureInfo, coords: &[StmtId]) -> StmtId {
        self.texture_function(TextureOp::Load, texture, coords, &[])
    }

    pub fn create_texture_store(
        &mut self,
        texture: &TextureInfo,
        coords: &[StmtId],
        values: &[StmtId],
    ) -> StmtId {
        assert_eq!(values.len(), 4, "texture store takes 4 components");
        self.texture_function(TextureOp::Store, texture, coords, values)
    }

    fn texture_function(
        &mut self,
        op: TextureOp,
        texture: &TextureInfo,
        coords: &[StmtId],
        operands: &[StmtId],
    ) -> StmtId {
        assert_eq!(
            coords.len(),
            texture.dimension.coord_count(),
            "texture {} ({:?}) needs {} coordinate(s), got {}",
            texture.id,
            texture.dimension,
            texture.dimension.coord_count(),
            coords.len()
        );
        self.push_stmt(StmtKind::TextureFunction {
            op,
            texture: *texture,
            coords: coords.to_vec(),
            operands: operands.to_vec(),
        })
    }

    // ── Return ────────────────────────────────────────────────────

    pub fn create_return(&mut self, value: StmtId) -> StmtId {
        self.push_stmt(StmtKind::Return {
            values: vec![value],
        })
    }

    pub fn create_return_vec(&mut self, values: &[StmtId]) -> StmtId {
        assert!(!values.is_empty(), "return needs at least one value");
        self.push_stmt(StmtKind::Return {
            values: values.to_vec(),
        })
    }
}
