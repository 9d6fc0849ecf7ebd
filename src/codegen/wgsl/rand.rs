//! Per-invocation xorshift128 random numbers.
//!
//! The state is private to each invocation and seeded once, in the
//! prologue, from the invocation id and a seed word the host writes into
//! the global-temporary buffer.

use super::{Stage, WgslCodegen};
use crate::codegen::error::CodegenError;
use crate::codegen::task::{MemberSlot, StageMember};
use crate::ir::stmt::StmtId;
use crate::ir::types::{PrimitiveType, ValueType};

const RAND_HELPERS: &str = "\
struct RandState {
    x: u32,
    y: u32,
    z: u32,
    w: u32,
}

var<private> rand_state: RandState;

fn rand_u32() -> u32 {
    let t = rand_state.x ^ (rand_state.x << 11u);
    rand_state.x = rand_state.y;
    rand_state.y = rand_state.z;
    rand_state.z = rand_state.w;
    rand_state.w = (rand_state.w ^ (rand_state.w >> 19u)) ^ (t ^ (t >> 8u));
    return rand_state.w * 1000000007u;
}

fn rand_f32() -> f32 {
    return f32(rand_u32() >> 8u) * (1.0 / 16777216.0);
}

";

impl WgslCodegen<'_> {
    pub(super) fn visit_rand(&mut self, id: StmtId, ty: PrimitiveType) -> Result<(), CodegenError> {
        self.check_prim(id, ty)?;
        self.init_rand(id)?;
        let expr = match ty {
            PrimitiveType::F32 => "rand_f32()",
            _ => "i32(rand_u32())",
        };
        self.define(id, ValueType::scalar(ty), expr.to_string())
    }

    fn init_rand(&mut self, id: StmtId) -> Result<(), CodegenError> {
        if self.rand_initiated {
            return Ok(());
        }
        self.rand_initiated = true;

        let rand_id = match self.stage {
            Stage::Compute => "global_invocation_id.x",
            Stage::Vertex => {
                self.add_input(
                    id,
                    StageMember {
                        name: "vertex_index".to_string(),
                        type_name: "u32".to_string(),
                        slot: MemberSlot::Builtin("vertex_index"),
                    },
                )?;
                "stage_input.vertex_index"
            }
            Stage::Fragment => {
                self.add_frag_coord(id)?;
                "u32(stage_input.frag_coord.x) + u32(stage_input.frag_coord.y) * 65536u"
            }
        };
        let tmps = self.global_tmps();
        let seed_word = self.config.rand_seed_word();

        self.helper_decls.push_str(RAND_HELPERS);
        self.prologue_line(format!("let rand_id: u32 = {};", rand_id));
        self.prologue_line("rand_state.x = 123456789u * rand_id * 1000000007u;");
        self.prologue_line("rand_state.y = 362436069u;");
        self.prologue_line("rand_state.z = 521288629u;");
        self.prologue_line(format!(
            "rand_state.w = 88675123u ^ u32({}.member[{}]);",
            tmps, seed_word
        ));
        Ok(())
    }
}
