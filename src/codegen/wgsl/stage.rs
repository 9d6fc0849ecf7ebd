//! Kernel arguments and returns, stage I/O, derivatives, and textures.

use super::expr::{coerce, to_word};
use super::{Stage, Value, WgslCodegen};
use crate::codegen::bindings::ResourceInfo;
use crate::codegen::error::CodegenError;
use crate::codegen::task::{MemberSlot, StageMember};
use crate::ir::field::{TextureDimension, TextureInfo};
use crate::ir::stmt::{BuiltinInput, BuiltinOutput, DerivativeAxis, StmtId, TextureOp};
use crate::ir::types::{PrimitiveType, ValueType};

use PrimitiveType::{F32, I32};

fn location(name: String, type_name: String, location: u32, prim: PrimitiveType) -> StageMember {
    StageMember {
        name,
        type_name,
        slot: MemberSlot::Location {
            location,
            flat: prim.is_integer(),
        },
    }
}

fn builtin(name: &str, type_name: &str, builtin: &'static str) -> StageMember {
    StageMember {
        name: name.to_string(),
        type_name: type_name.to_string(),
        slot: MemberSlot::Builtin(builtin),
    }
}

impl WgslCodegen<'_> {
    // ── Kernel arguments ──────────────────────────────────────────

    pub(super) fn visit_arg_load(
        &mut self,
        id: StmtId,
        ty: PrimitiveType,
        arg_id: u32,
    ) -> Result<(), CodegenError> {
        self.check_prim(id, ty)?;
        if (u64::from(arg_id) + 1) * 4 > u64::from(self.signature.arg_bytes) {
            return Err(CodegenError::UndeclaredResource {
                stmt: id,
                message: format!(
                    "argument {} is outside the {}-byte argument block",
                    arg_id, self.signature.arg_bytes
                ),
            });
        }
        let args = self.args();
        let word = format!("{}.member[{}]", args, arg_id);
        let expr = match ty {
            F32 => format!("bitcast<f32>({})", word),
            _ => word,
        };
        self.define(id, ValueType::scalar(ty), expr)
    }

    pub(super) fn visit_return(&mut self, id: StmtId, values: &[StmtId]) -> Result<(), CodegenError> {
        self.require_stage(id, Stage::Compute)?;
        if values.len() as u64 * 4 > u64::from(self.signature.ret_bytes) {
            return Err(CodegenError::UndeclaredResource {
                stmt: id,
                message: format!(
                    "{} return value(s) do not fit the {}-byte return block",
                    values.len(),
                    self.signature.ret_bytes
                ),
            });
        }
        let mut words = Vec::with_capacity(values.len());
        for &v in values {
            let v = self.scalar(id, v)?;
            self.check_prim(id, v.ty.prim)?;
            words.push(to_word(&v.expr, v.ty.prim));
        }
        if words.is_empty() {
            return Ok(());
        }
        let rets = self.rets();
        for (k, word) in words.iter().enumerate() {
            self.line(format!("{}.member[{}] = {};", rets, k, word));
        }
        Ok(())
    }

    // ── Stage inputs and outputs ──────────────────────────────────

    pub(super) fn visit_vertex_input(
        &mut self,
        id: StmtId,
        ty: PrimitiveType,
        loc: u32,
    ) -> Result<(), CodegenError> {
        self.require_stage(id, Stage::Vertex)?;
        let vt = ValueType::scalar(ty);
        let type_name = self.type_name(id, vt)?;
        let name = format!("attribute_{}", loc);
        self.add_input(id, location(name.clone(), type_name, loc, ty))?;
        self.define(id, vt, format!("stage_input.{}", name))
    }

    pub(super) fn visit_vertex_output(
        &mut self,
        id: StmtId,
        value: StmtId,
        loc: u32,
    ) -> Result<(), CodegenError> {
        self.require_stage(id, Stage::Vertex)?;
        let v = self.value(id, value)?;
        let type_name = self.type_name(id, v.ty)?;
        let name = format!("varying_{}", loc);
        self.add_output(id, location(name.clone(), type_name, loc, v.ty.prim))?;
        self.line(format!("stage_output.{} = {};", name, v.expr));
        Ok(())
    }

    pub(super) fn visit_fragment_input(
        &mut self,
        id: StmtId,
        ty: PrimitiveType,
        loc: u32,
    ) -> Result<(), CodegenError> {
        self.require_stage(id, Stage::Fragment)?;
        let vt = ValueType::scalar(ty);
        let type_name = self.type_name(id, vt)?;
        let name = format!("varying_{}", loc);
        let member = location(name.clone(), type_name, loc, ty);
        self.check_varying(id, &member, loc)?;
        self.add_input(id, member)?;
        self.define(id, vt, format!("stage_input.{}", name))
    }

    /// A fragment input must be written by the vertex stage with the same type.
    fn check_varying(&self, id: StmtId, member: &StageMember, loc: u32) -> Result<(), CodegenError> {
        let written = self.varyings.iter().find(|m| {
            matches!(m.slot, MemberSlot::Location { location, .. } if location == loc)
        });
        match written {
            None => Err(CodegenError::UndeclaredResource {
                stmt: id,
                message: format!("no vertex stage output at location {}", loc),
            }),
            Some(out) if out.type_name != member.type_name => Err(CodegenError::mismatch(
                id,
                format!(
                    "fragment input at location {} is {}, but the vertex stage writes {}",
                    loc, member.type_name, out.type_name
                ),
            )),
            Some(_) => Ok(()),
        }
    }

    pub(super) fn visit_builtin_input(
        &mut self,
        id: StmtId,
        input: BuiltinInput,
    ) -> Result<(), CodegenError> {
        match input {
            BuiltinInput::VertexIndex | BuiltinInput::InstanceIndex => {
                self.require_stage(id, Stage::Vertex)?;
                let name = if input == BuiltinInput::VertexIndex {
                    "vertex_index"
                } else {
                    "instance_index"
                };
                self.add_input(id, builtin(name, "u32", name))?;
                self.define(
                    id,
                    ValueType::scalar(I32),
                    format!("i32(stage_input.{})", name),
                )
            }
            BuiltinInput::FragCoord => {
                self.require_stage(id, Stage::Fragment)?;
                self.add_frag_coord(id)?;
                self.define(
                    id,
                    ValueType::vector(F32, 4),
                    "stage_input.frag_coord".to_string(),
                )
            }
        }
    }

    pub(super) fn add_frag_coord(&mut self, id: StmtId) -> Result<(), CodegenError> {
        self.add_input(id, builtin("frag_coord", "vec4<f32>", "position"))
    }

    pub(super) fn visit_builtin_output(
        &mut self,
        id: StmtId,
        output: BuiltinOutput,
        values: &[StmtId],
    ) -> Result<(), CodegenError> {
        let floats = self.floats(id, values)?;
        match output {
            BuiltinOutput::Position => {
                self.require_stage(id, Stage::Vertex)?;
                self.require_components(id, "position", &floats, 4)?;
                self.line(format!(
                    "stage_output.position = vec4<f32>({});",
                    floats.join(", ")
                ));
            }
            BuiltinOutput::Color(loc) => {
                self.require_stage(id, Stage::Fragment)?;
                self.require_components(id, "color", &floats, 4)?;
                let name = format!("color_{}", loc);
                self.add_output(id, location(name.clone(), "vec4<f32>".to_string(), loc, F32))?;
                self.line(format!(
                    "stage_output.{} = vec4<f32>({});",
                    name,
                    floats.join(", ")
                ));
            }
            BuiltinOutput::FragDepth => {
                self.require_stage(id, Stage::Fragment)?;
                self.require_components(id, "depth", &floats, 1)?;
                self.add_output(id, builtin("frag_depth", "f32", "frag_depth"))?;
                self.line(format!("stage_output.frag_depth = {};", floats[0]));
            }
        }
        Ok(())
    }

    /// Scalar operands converted to f32 expressions.
    fn floats(&self, id: StmtId, values: &[StmtId]) -> Result<Vec<String>, CodegenError> {
        values
            .iter()
            .map(|&v| {
                let v = self.scalar(id, v)?;
                self.check_prim(id, v.ty.prim)?;
                Ok(coerce(&v, F32, 1))
            })
            .collect()
    }

    fn require_components(
        &self,
        id: StmtId,
        what: &str,
        values: &[String],
        n: usize,
    ) -> Result<(), CodegenError> {
        if values.len() == n {
            Ok(())
        } else {
            Err(CodegenError::mismatch(
                id,
                format!("{} output takes {} value(s), got {}", what, n, values.len()),
            ))
        }
    }

    pub(super) fn visit_derivative(
        &mut self,
        id: StmtId,
        axis: DerivativeAxis,
        operand: StmtId,
    ) -> Result<(), CodegenError> {
        self.require_stage(id, Stage::Fragment)?;
        let v = self.value(id, operand)?;
        self.check_prim(id, v.ty.prim)?;
        let f = match axis {
            DerivativeAxis::X => "dpdx",
            DerivativeAxis::Y => "dpdy",
        };
        let n = v.ty.components;
        self.define(
            id,
            ValueType::vector(F32, n),
            format!("{}({})", f, coerce(&v, F32, n)),
        )
    }

    pub(super) fn visit_discard(&mut self, id: StmtId) -> Result<(), CodegenError> {
        self.require_stage(id, Stage::Fragment)?;
        self.line("discard;");
        Ok(())
    }

    // ── Textures ──────────────────────────────────────────────────

    pub(super) fn visit_texture_function(
        &mut self,
        id: StmtId,
        op: TextureOp,
        texture: &TextureInfo,
        coords: &[StmtId],
        operands: &[StmtId],
    ) -> Result<(), CodegenError> {
        let coords: Vec<Value> = coords
            .iter()
            .map(|&c| self.scalar(id, c))
            .collect::<Result<_, _>>()?;
        let depth = texture.format.is_depth();
        let texel = if depth {
            ValueType::scalar(F32)
        } else {
            ValueType::vector(F32, 4)
        };

        match op {
            TextureOp::Sample | TextureOp::SampleLod => {
                let uv = vector_of(&coords, F32);
                let level = match (op, operands.first()) {
                    (TextureOp::SampleLod, Some(&lod)) => Some(self.scalar(id, lod)?),
                    (TextureOp::SampleLod, None) => {
                        return Err(CodegenError::mismatch(id, "sample_lod needs a level operand"))
                    }
                    _ => None,
                };
                let (tex, sampler) = self.sampled_texture(id, texture)?;
                let expr = match level {
                    None if self.stage == Stage::Fragment => {
                        format!("textureSample({}, {}, {})", tex, sampler, uv)
                    }
                    // implicit-derivative sampling only exists in fragment shaders
                    None => format!(
                        "textureSampleLevel({}, {}, {}, {})",
                        tex,
                        sampler,
                        uv,
                        if depth { "0i" } else { "0.0f" }
                    ),
                    Some(lod) => format!(
                        "textureSampleLevel({}, {}, {}, {})",
                        tex,
                        sampler,
                        uv,
                        coerce(&lod, if depth { I32 } else { F32 }, 1)
                    ),
                };
                self.define(id, texel, expr)
            }
            TextureOp::Load => {
                if texture.dimension == TextureDimension::Cube {
                    return Err(CodegenError::mismatch(
                        id,
                        format!("cube texture {} cannot be loaded by texel", texture.id),
                    ));
                }
                let tex = self.texture(id, texture)?;
                let expr = format!("textureLoad({}, {}, 0i)", tex, vector_of(&coords, I32));
                self.define(id, texel, expr)
            }
            TextureOp::Store => {
                self.check_writable(id, ResourceInfo::storage_texture(texture.id))?;
                let texels = self.floats(id, operands)?;
                self.require_components(id, "texture store", &texels, 4)?;
                let tex = self.storage_texture(id, texture)?;
                self.line(format!(
                    "textureStore({}, {}, vec4<f32>({}));",
                    tex,
                    vector_of(&coords, I32),
                    texels.join(", ")
                ));
                Ok(())
            }
        }
    }
}

/// Scalars packed into one `prim` vector (or a bare scalar for one value).
fn vector_of(values: &[Value], prim: PrimitiveType) -> String {
    let parts: Vec<String> = values.iter().map(|v| coerce(v, prim, 1)).collect();
    match parts.len() {
        1 => parts[0].clone(),
        n => format!("vec{}<{}>({})", n, prim, parts.join(", ")),
    }
}
