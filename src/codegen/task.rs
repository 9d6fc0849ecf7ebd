//! Task descriptors: what a runtime needs to dispatch generated shaders.

use serde::Serialize;

use super::bindings::ResourceBinding;
use crate::ir::offload::OffloadKind;

/// Byte sizes of a kernel's argument and return blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct KernelSignature {
    pub arg_bytes: u32,
    pub ret_bytes: u32,
}

impl KernelSignature {
    pub fn new(arg_bytes: u32, ret_bytes: u32) -> Self {
        Self {
            arg_bytes,
            ret_bytes,
        }
    }
}

/// Where a parallel loop's iteration count comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeHint {
    /// Literal bound known at generation time.
    Const(u32),
    /// Read at dispatch time from the global-temporary buffer.
    Dynamic { offset: u32 },
    /// Element count of a field.
    FieldElements { field: u32, count: u32 },
}

/// How a stage I/O member is wired.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberSlot {
    Location { location: u32, flat: bool },
    Builtin(&'static str),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StageMember {
    pub name: String,
    pub type_name: String,
    pub slot: MemberSlot,
}

impl StageMember {
    /// Member declaration inside a WGSL struct body.
    pub fn declaration(&self) -> String {
        match &self.slot {
            MemberSlot::Location {
                location,
                flat: true,
            } => format!(
                "@location({}) @interpolate(flat) {}: {}",
                location, self.name, self.type_name
            ),
            MemberSlot::Location {
                location,
                flat: false,
            } => format!("@location({}) {}: {}", location, self.name, self.type_name),
            MemberSlot::Builtin(builtin) => {
                format!("@builtin({}) {}: {}", builtin, self.name, self.type_name)
            }
        }
    }
}

/// Inputs and outputs of a vertex or fragment entry point.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StageLayout {
    pub inputs: Vec<StageMember>,
    pub outputs: Vec<StageMember>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dispatch {
    Compute {
        workgroup_size: u32,
        num_workgroups: u32,
        range: Option<RangeHint>,
    },
    Vertex(StageLayout),
    Fragment(StageLayout),
}

/// One generated shader and everything needed to run it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TaskParams {
    pub kind: OffloadKind,
    pub entry_point: String,
    pub code: String,
    /// BLAKE3 of `code`, hex encoded.
    pub code_hash: String,
    /// Bindings declared by this shader, in declaration order.
    pub bindings: Vec<ResourceBinding>,
    pub arg_bytes: u32,
    pub ret_bytes: u32,
    pub dispatch: Dispatch,
}

impl TaskParams {
    pub fn stage_layout(&self) -> Option<&StageLayout> {
        match &self.dispatch {
            Dispatch::Vertex(layout) | Dispatch::Fragment(layout) => Some(layout),
            Dispatch::Compute { .. } => None,
        }
    }

    /// Short form of the shader hash for display.
    pub fn short_hash(&self) -> &str {
        &self.code_hash[..self.code_hash.len().min(16)]
    }
}

/// A whole compiled module: its tasks in dispatch order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KernelParams {
    pub tasks: Vec<TaskParams>,
    pub arg_bytes: u32,
    pub ret_bytes: u32,
}

impl KernelParams {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub(crate) fn hash_code(code: &str) -> String {
    blake3::hash(code.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_declarations() {
        let m = StageMember {
            name: "varying_0".to_string(),
            type_name: "i32".to_string(),
            slot: MemberSlot::Location {
                location: 0,
                flat: true,
            },
        };
        assert_eq!(
            m.declaration(),
            "@location(0) @interpolate(flat) varying_0: i32"
        );
        let p = StageMember {
            name: "position".to_string(),
            type_name: "vec4<f32>".to_string(),
            slot: MemberSlot::Builtin("position"),
        };
        assert_eq!(p.declaration(), "@builtin(position) position: vec4<f32>");
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash_code("fn main() {}"), hash_code("fn main() {}"));
        assert_ne!(hash_code("a"), hash_code("b"));
        assert_eq!(hash_code("").len(), 64);
    }

    #[test]
    fn test_dispatch_json_shape() {
        let d = Dispatch::Compute {
            workgroup_size: 128,
            num_workgroups: 1,
            range: Some(RangeHint::Const(100)),
        };
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["compute"]["workgroup_size"], 128);
        assert_eq!(v["compute"]["range"]["const"], 100);
    }
}
