//! WGSL generation for one offload.
//!
//! A single walk over the offload's statements writes the shader body,
//! declares every resource at its first use, and collects stage I/O
//! members. Assembly then glues the pieces together in a fixed order:
//! resource declarations, helpers, stage structs, entry signature,
//! prologue, body.

mod control;
mod expr;
mod memory;
mod rand;
mod resources;
mod stage;

use std::collections::HashMap;

use log::debug;

use super::bindings::{ResourceBinding, ResourceBindingMap};
use super::error::CodegenError;
use super::task::{hash_code, Dispatch, KernelSignature, RangeHint, StageLayout, StageMember, TaskParams};
use crate::config::CodegenConfig;
use crate::ir::module::IrModule;
use crate::ir::offload::{OffloadKind, OffloadedModule};
use crate::ir::stmt::{BlockId, LoopControl, StmtId, StmtKind};
use crate::ir::types::{PrimitiveType, ValueType};

const INDENT: &str = "    ";

/// Pipeline stage an offload is generated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Stage {
    Compute,
    Vertex,
    Fragment,
}

impl Stage {
    fn of(kind: OffloadKind) -> Self {
        match kind {
            OffloadKind::Serial | OffloadKind::RangeFor => Stage::Compute,
            OffloadKind::VertexFor => Stage::Vertex,
            OffloadKind::FragmentFor => Stage::Fragment,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Stage::Compute => "compute",
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
        }
    }

    fn is_graphics(self) -> bool {
        self != Stage::Compute
    }
}

/// A generated value: the expression naming it and its type.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Value {
    pub expr: String,
    pub ty: ValueType,
}

impl Value {
    fn new(expr: impl Into<String>, ty: ValueType) -> Self {
        Self {
            expr: expr.into(),
            ty,
        }
    }
}

/// Generate the shader for `offload`.
///
/// A fragment stage passes its vertex task as `previous`: the vertex
/// bindings seed the binding map so shared resources keep their slots, and
/// every fragment input must match a vertex output at the same location.
pub fn generate(
    module: &IrModule,
    offload: &OffloadedModule,
    signature: KernelSignature,
    config: &CodegenConfig,
    previous: Option<&TaskParams>,
) -> Result<TaskParams, CodegenError> {
    WgslCodegen::new(module, offload, signature, config, previous).run()
}

pub(crate) struct WgslCodegen<'a> {
    module: &'a IrModule,
    offload: &'a OffloadedModule,
    config: &'a CodegenConfig,
    signature: KernelSignature,
    stage: Stage,

    bindings: ResourceBindingMap,
    /// Resources declared by this shader, in declaration order.
    declared: Vec<ResourceBinding>,
    values: HashMap<StmtId, Value>,

    global_decls: String,
    helper_decls: String,
    stage_inputs: Vec<StageMember>,
    stage_outputs: Vec<StageMember>,
    /// Outputs of the vertex stage feeding this fragment stage.
    varyings: Vec<StageMember>,
    prologue: String,
    body: String,
    indent: usize,

    rand_initiated: bool,
    /// The range-for whose iterations are spread over invocations.
    root_loop: Option<StmtId>,
    range: Option<RangeHint>,
    num_workgroups: u32,
}

impl<'a> WgslCodegen<'a> {
    fn new(
        module: &'a IrModule,
        offload: &'a OffloadedModule,
        signature: KernelSignature,
        config: &'a CodegenConfig,
        previous: Option<&TaskParams>,
    ) -> Self {
        let bindings = previous.map_or(&[][..], |task| &task.bindings[..]);
        let varyings = previous
            .and_then(TaskParams::stage_layout)
            .map(|layout| layout.outputs.clone())
            .unwrap_or_default();
        Self {
            module,
            offload,
            config,
            signature,
            stage: Stage::of(offload.kind),
            bindings: ResourceBindingMap::seeded(bindings),
            declared: Vec::new(),
            values: HashMap::new(),
            global_decls: String::new(),
            helper_decls: String::new(),
            stage_inputs: Vec::new(),
            stage_outputs: Vec::new(),
            varyings,
            prologue: String::new(),
            body: String::new(),
            indent: 1,
            rand_initiated: false,
            root_loop: None,
            range: None,
            num_workgroups: 1,
        }
    }

    fn run(mut self) -> Result<TaskParams, CodegenError> {
        debug!(
            "generating {} offload over {:?}",
            self.offload.kind.name(),
            self.offload.stmts
        );
        let offload = self.offload;
        match (offload.kind, offload.root()) {
            (OffloadKind::RangeFor, Some(root)) => self.generate_range_for(root)?,
            (OffloadKind::VertexFor | OffloadKind::FragmentFor, Some(root)) => {
                self.generate_graphics(root)?
            }
            _ => {
                for &id in &offload.stmts {
                    self.visit(id)?;
                }
            }
        }
        Ok(self.assemble())
    }

    fn generate_graphics(&mut self, root: StmtId) -> Result<(), CodegenError> {
        let module = self.module;
        let body = match &module.stmt(root).kind {
            StmtKind::VertexFor { body } if self.stage == Stage::Vertex => *body,
            StmtKind::FragmentFor { body } if self.stage == Stage::Fragment => *body,
            _ => return Err(self.no_handler(root)),
        };
        if self.stage == Stage::Vertex {
            self.add_output(
                root,
                StageMember {
                    name: "position".to_string(),
                    type_name: "vec4<f32>".to_string(),
                    slot: super::task::MemberSlot::Builtin("position"),
                },
            )?;
        }
        self.visit_block(body)
    }

    // ── Walk ──────────────────────────────────────────────────────

    pub(crate) fn visit_block(&mut self, block: BlockId) -> Result<(), CodegenError> {
        let module = self.module;
        for &id in &module.block(block).stmts {
            self.visit(id)?;
        }
        Ok(())
    }

    fn visit(&mut self, id: StmtId) -> Result<(), CodegenError> {
        let module = self.module;
        match &module.stmt(id).kind {
            StmtKind::Const(c) => {
                let v = expr::const_value(*c);
                self.values.insert(id, v);
                Ok(())
            }
            StmtKind::LoopIndex { loop_stmt } => self.visit_loop_index(id, *loop_stmt),
            StmtKind::ArgLoad { ty, arg_id } => self.visit_arg_load(id, *ty, *arg_id),
            StmtKind::Rand { ty } => self.visit_rand(id, *ty),

            StmtKind::UnaryOp { op, operand } => self.visit_unary(id, *op, *operand),
            StmtKind::BinaryOp { op, lhs, rhs } => self.visit_binary(id, *op, *lhs, *rhs),

            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => self.visit_if(id, *cond, *then_block, *else_block),
            StmtKind::While { body } => self.visit_while(*body),
            StmtKind::WhileControl { control } => {
                self.line(match control {
                    LoopControl::Break => "break;",
                    LoopControl::Continue => "continue;",
                });
                Ok(())
            }
            StmtKind::Continue => {
                self.line("continue;");
                Ok(())
            }
            StmtKind::RangeFor { bound, body, .. } => self.visit_range_for(id, bound, *body),
            StmtKind::VertexFor { .. } | StmtKind::FragmentFor { .. } => {
                Err(self.no_handler(id))
            }

            StmtKind::Alloca { ty } => self.visit_alloca(id, *ty),
            StmtKind::LocalLoad { ptr } => self.visit_local_load(id, *ptr),
            StmtKind::LocalStore { ptr, value } => self.visit_local_store(id, *ptr, *value),
            StmtKind::GlobalPtr {
                field,
                indices,
                element_offset,
            } => self.visit_global_ptr(id, field, indices, *element_offset),
            StmtKind::GlobalLoad { ptr } => self.visit_global_load(id, *ptr),
            StmtKind::GlobalStore { ptr, value } => self.visit_global_store(id, *ptr, *value),
            StmtKind::GlobalTemporary { ty, offset } => {
                self.visit_global_temporary(id, *ty, *offset)
            }
            StmtKind::GlobalTemporaryLoad { ptr } => self.visit_global_temporary_load(id, *ptr),
            StmtKind::GlobalTemporaryStore { ptr, value } => {
                self.visit_global_temporary_store(id, *ptr, *value)
            }
            StmtKind::AtomicOp { op, dest, value } => {
                self.visit_atomic_op(id, *op, *dest, *value)
            }
            StmtKind::AtomicLoad { ptr } => self.visit_atomic_load(id, *ptr),
            StmtKind::AtomicStore { ptr, value } => self.visit_atomic_store(id, *ptr, *value),

            StmtKind::VertexInput { ty, location } => {
                self.visit_vertex_input(id, *ty, *location)
            }
            StmtKind::VertexOutput { value, location } => {
                self.visit_vertex_output(id, *value, *location)
            }
            StmtKind::FragmentInput { ty, location } => {
                self.visit_fragment_input(id, *ty, *location)
            }
            StmtKind::BuiltinInput { builtin } => self.visit_builtin_input(id, *builtin),
            StmtKind::BuiltinOutput { builtin, values } => {
                self.visit_builtin_output(id, *builtin, values)
            }
            StmtKind::FragmentDerivative { axis, operand } => {
                self.visit_derivative(id, *axis, *operand)
            }
            StmtKind::Discard => self.visit_discard(id),
            StmtKind::TextureFunction {
                op,
                texture,
                coords,
                operands,
            } => self.visit_texture_function(id, *op, texture, coords, operands),
            StmtKind::CompositeExtract { composite, index } => {
                self.visit_composite_extract(id, *composite, *index)
            }
            StmtKind::Return { values } => self.visit_return(id, values),
        }
    }

    // ── Values ────────────────────────────────────────────────────

    /// The generated value of `operand` as read by `user`.
    ///
    /// Constants defined outside the offload are inlined as literals.
    pub(crate) fn value(&self, user: StmtId, operand: StmtId) -> Result<Value, CodegenError> {
        if let Some(v) = self.values.get(&operand) {
            return Ok(v.clone());
        }
        match &self.module.stmt(operand).kind {
            StmtKind::Const(c) => Ok(expr::const_value(*c)),
            _ => Err(CodegenError::CrossOffloadReference {
                stmt: user,
                operand,
            }),
        }
    }

    /// A scalar operand of a supported primitive type.
    pub(crate) fn scalar(&self, user: StmtId, operand: StmtId) -> Result<Value, CodegenError> {
        let v = self.value(user, operand)?;
        if !v.ty.is_scalar() {
            return Err(CodegenError::mismatch(
                user,
                format!("{} must be a scalar, found {}", operand, v.ty),
            ));
        }
        Ok(v)
    }

    pub(crate) fn type_name(&self, stmt: StmtId, ty: ValueType) -> Result<String, CodegenError> {
        ty.name().map_err(|e| CodegenError::unsupported(stmt, e))
    }

    pub(crate) fn check_prim(&self, stmt: StmtId, prim: PrimitiveType) -> Result<(), CodegenError> {
        crate::ir::types::primitive_type_name(prim)
            .map(|_| ())
            .map_err(|e| CodegenError::unsupported(stmt, e))
    }

    /// Bind `expr` to the temporary of `id`.
    pub(crate) fn define(
        &mut self,
        id: StmtId,
        ty: ValueType,
        expr: String,
    ) -> Result<(), CodegenError> {
        let ty_name = self.type_name(id, ty)?;
        let name = format!("t{}", id.0);
        self.line(format!("let {}: {} = {};", name, ty_name, expr));
        self.values.insert(id, Value::new(name, ty));
        Ok(())
    }

    /// Make `id` stand for an existing expression without emitting code.
    pub(crate) fn alias(&mut self, id: StmtId, expr: impl Into<String>, ty: ValueType) {
        self.values.insert(id, Value::new(expr, ty));
    }

    pub(crate) fn no_handler(&self, id: StmtId) -> CodegenError {
        CodegenError::NoHandler {
            stmt: id,
            kind: self.module.stmt(id).kind_name(),
            stage: self.stage.name(),
        }
    }

    pub(crate) fn require_stage(&self, id: StmtId, stage: Stage) -> Result<(), CodegenError> {
        if self.stage == stage {
            Ok(())
        } else {
            Err(self.no_handler(id))
        }
    }

    // ── Emission ──────────────────────────────────────────────────

    pub(crate) fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.body.push_str(INDENT);
        }
        self.body.push_str(text.as_ref());
        self.body.push('\n');
    }

    pub(crate) fn prologue_line(&mut self, text: impl AsRef<str>) {
        self.prologue.push_str(INDENT);
        self.prologue.push_str(text.as_ref());
        self.prologue.push('\n');
    }

    /// Emit `f`'s lines one level deeper.
    pub(crate) fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<(), CodegenError>,
    ) -> Result<(), CodegenError> {
        self.indent += 1;
        let result = f(self);
        self.indent -= 1;
        result
    }

    fn add_member(
        members: &mut Vec<StageMember>,
        stmt: StmtId,
        member: StageMember,
    ) -> Result<(), CodegenError> {
        match members.iter().find(|m| m.name == member.name) {
            Some(existing) if *existing == member => Ok(()),
            Some(existing) => Err(CodegenError::mismatch(
                stmt,
                format!(
                    "stage member `{}` used as {} and {}",
                    member.name, existing.type_name, member.type_name
                ),
            )),
            None => {
                members.push(member);
                Ok(())
            }
        }
    }

    pub(crate) fn add_input(&mut self, stmt: StmtId, member: StageMember) -> Result<(), CodegenError> {
        Self::add_member(&mut self.stage_inputs, stmt, member)
    }

    pub(crate) fn add_output(&mut self, stmt: StmtId, member: StageMember) -> Result<(), CodegenError> {
        Self::add_member(&mut self.stage_outputs, stmt, member)
    }

    // ── Assembly ──────────────────────────────────────────────────

    fn assemble(self) -> TaskParams {
        let mut code = String::new();
        code.push_str(&self.global_decls);
        code.push_str(&self.helper_decls);
        for (name, members) in [
            ("StageInput", &self.stage_inputs),
            ("StageOutput", &self.stage_outputs),
        ] {
            if members.is_empty() {
                continue;
            }
            code.push_str(&format!("struct {} {{\n", name));
            for m in members {
                code.push_str(&format!("{}{},\n", INDENT, m.declaration()));
            }
            code.push_str("}\n\n");
        }

        let input_param = if self.stage_inputs.is_empty() {
            ""
        } else {
            "stage_input: StageInput"
        };
        let has_output = !self.stage_outputs.is_empty();
        let workgroup_size = match self.offload.kind {
            OffloadKind::RangeFor => self.config.workgroup_size,
            _ => 1,
        };
        match self.stage {
            Stage::Compute => {
                code.push_str(&format!("@compute @workgroup_size({})\n", workgroup_size));
                code.push_str(
                    "fn main(@builtin(global_invocation_id) global_invocation_id: vec3<u32>, \
                     @builtin(num_workgroups) num_workgroups: vec3<u32>) {\n",
                );
            }
            Stage::Vertex | Stage::Fragment => {
                code.push_str(&format!("@{}\n", self.stage.name()));
                if has_output {
                    code.push_str(&format!("fn main({}) -> StageOutput {{\n", input_param));
                    code.push_str(&format!("{}var stage_output: StageOutput;\n", INDENT));
                } else {
                    code.push_str(&format!("fn main({}) {{\n", input_param));
                }
            }
        }
        code.push_str(&self.prologue);
        code.push_str(&self.body);
        if self.stage.is_graphics() && has_output {
            code.push_str(&format!("{}return stage_output;\n", INDENT));
        }
        code.push_str("}\n");

        let layout = StageLayout {
            inputs: self.stage_inputs,
            outputs: self.stage_outputs,
        };
        let dispatch = match self.stage {
            Stage::Compute => Dispatch::Compute {
                workgroup_size,
                num_workgroups: self.num_workgroups,
                range: self.range,
            },
            Stage::Vertex => Dispatch::Vertex(layout),
            Stage::Fragment => Dispatch::Fragment(layout),
        };
        let code_hash = hash_code(&code);
        debug!(
            "{} shader: {} bytes, {} binding(s), hash {}",
            self.offload.kind.name(),
            code.len(),
            self.declared.len(),
            &code_hash[..16]
        );
        TaskParams {
            kind: self.offload.kind,
            entry_point: "main".to_string(),
            code,
            code_hash,
            bindings: self.declared,
            arg_bytes: self.signature.arg_bytes,
            ret_bytes: self.signature.ret_bytes,
            dispatch,
        }
    }
}
