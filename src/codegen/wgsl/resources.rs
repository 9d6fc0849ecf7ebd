//! Resource declarations and first-use binding allocation.

use log::debug;

use super::{Stage, WgslCodegen};
use crate::codegen::bindings::{ResourceBinding, ResourceInfo, ResourceType};
use crate::codegen::error::CodegenError;
use crate::ir::field::{TextureDimension, TextureInfo};
use crate::ir::stmt::StmtId;

/// Shader-side shape of a resource.
enum Declaration {
    /// Storage buffer of 32-bit words; `length` is `None` for runtime-sized arrays.
    Buffer {
        element: &'static str,
        length: Option<u32>,
        writable: bool,
    },
    /// Texture or sampler handle of the given WGSL type.
    Handle(String),
}

impl WgslCodegen<'_> {
    /// Name of `info`, declaring it on first use.
    ///
    /// A resource already in the binding map (seeded from an earlier stage)
    /// keeps its slot; anything else takes the next free one.
    fn use_resource(&mut self, info: ResourceInfo, decl: Declaration) -> String {
        let name = info.name();
        if self.declared.iter().any(|b| b.info == info) {
            return name;
        }
        let binding = match self.bindings.get(&info) {
            Some(slot) => slot,
            None => {
                let slot = self.bindings.next_slot();
                self.bindings.add(info, slot);
                debug!("bound {} at slot {}", name, slot);
                slot
            }
        };

        match decl {
            Declaration::Buffer {
                element,
                length,
                writable,
            } => {
                let array = match length {
                    Some(n) => format!("array<{}, {}>", element, n),
                    None => format!("array<{}>", element),
                };
                let access = if writable { "read_write" } else { "read" };
                self.global_decls.push_str(&format!(
                    "struct {name}_type {{\n    member: {array},\n}}\n\
                     @group(0) @binding({binding}) var<storage, {access}> {name}: {name}_type;\n\n",
                    name = name,
                    array = array,
                    binding = binding,
                    access = access,
                ));
            }
            Declaration::Handle(ty) => {
                self.global_decls.push_str(&format!(
                    "@group(0) @binding({}) var {}: {};\n\n",
                    binding, name, ty
                ));
            }
        }
        self.declared.push(ResourceBinding { info, binding });
        name
    }

    fn buffer_writable(&self) -> bool {
        self.stage == Stage::Compute
    }

    pub(super) fn root_buffer(&mut self, buffer: u32) -> String {
        let writable = self.buffer_writable();
        self.use_resource(
            ResourceInfo::root(buffer),
            Declaration::Buffer {
                element: "i32",
                length: None,
                writable,
            },
        )
    }

    pub(super) fn root_buffer_atomic(&mut self, buffer: u32) -> String {
        self.use_resource(
            ResourceInfo::root_atomic(buffer),
            Declaration::Buffer {
                element: "atomic<i32>",
                length: None,
                writable: true,
            },
        )
    }

    pub(super) fn global_tmps(&mut self) -> String {
        let writable = self.buffer_writable();
        let length = Some(self.config.global_tmps_words());
        self.use_resource(
            ResourceInfo::global_tmps(),
            Declaration::Buffer {
                element: "i32",
                length,
                writable,
            },
        )
    }

    pub(super) fn global_tmps_atomic(&mut self) -> String {
        let length = Some(self.config.global_tmps_words());
        self.use_resource(
            ResourceInfo::global_tmps_atomic(),
            Declaration::Buffer {
                element: "atomic<i32>",
                length,
                writable: true,
            },
        )
    }

    pub(super) fn args(&mut self) -> String {
        let length = Some(self.signature.arg_bytes.div_ceil(4));
        self.use_resource(
            ResourceInfo::args(),
            Declaration::Buffer {
                element: "i32",
                length,
                writable: false,
            },
        )
    }

    pub(super) fn rets(&mut self) -> String {
        let length = Some(self.signature.ret_bytes.div_ceil(4));
        self.use_resource(
            ResourceInfo::rets(),
            Declaration::Buffer {
                element: "i32",
                length,
                writable: true,
            },
        )
    }

    /// Sampled texture plus its sampler, in that order.
    pub(super) fn sampled_texture(
        &mut self,
        stmt: StmtId,
        texture: &TextureInfo,
    ) -> Result<(String, String), CodegenError> {
        let tex = self.texture(stmt, texture)?;
        let sampler = self.use_resource(
            ResourceInfo::sampler(texture.id),
            Declaration::Handle("sampler".to_string()),
        );
        Ok((tex, sampler))
    }

    pub(super) fn texture(
        &mut self,
        stmt: StmtId,
        texture: &TextureInfo,
    ) -> Result<String, CodegenError> {
        let ty = if texture.format.is_depth() {
            match texture.dimension {
                TextureDimension::D2 => "texture_depth_2d".to_string(),
                TextureDimension::Cube => "texture_depth_cube".to_string(),
                TextureDimension::D3 => {
                    return Err(CodegenError::mismatch(
                        stmt,
                        format!("depth texture {} cannot be 3d", texture.id),
                    ))
                }
            }
        } else {
            format!("texture_{}<f32>", texture.dimension.suffix())
        };
        Ok(self.use_resource(ResourceInfo::texture(texture.id), Declaration::Handle(ty)))
    }

    pub(super) fn storage_texture(
        &mut self,
        stmt: StmtId,
        texture: &TextureInfo,
    ) -> Result<String, CodegenError> {
        let format = texture.format.storage_name().ok_or_else(|| {
            CodegenError::mismatch(
                stmt,
                format!("texture {} has a depth format and cannot be stored to", texture.id),
            )
        })?;
        if texture.dimension == TextureDimension::Cube {
            return Err(CodegenError::mismatch(
                stmt,
                format!("cube texture {} cannot be stored to", texture.id),
            ));
        }
        let ty = format!(
            "texture_storage_{}<{}, write>",
            texture.dimension.suffix(),
            format
        );
        Ok(self.use_resource(
            ResourceInfo::storage_texture(texture.id),
            Declaration::Handle(ty),
        ))
    }

    /// Error for a write to `info` from a stage that only reads.
    pub(super) fn check_writable(&self, stmt: StmtId, info: ResourceInfo) -> Result<(), CodegenError> {
        if self.stage.is_graphics() {
            let resource = match info.resource_type {
                ResourceType::Texture | ResourceType::StorageTexture => {
                    format!("texture {}", info.resource_id.unwrap_or(0))
                }
                _ => info.name(),
            };
            return Err(CodegenError::ReadOnlyResource {
                stmt,
                resource,
                stage: self.stage.name(),
            });
        }
        Ok(())
    }
}
