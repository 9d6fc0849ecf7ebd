//! Textual IR listing.
//!
//! One statement header per line, child blocks indented two spaces.
//! The listing records the byte span of every statement's header so
//! diagnostics can point at the offending line.

use std::fmt::{self, Write};

use super::module::IrModule;
use super::stmt::{
    BlockId, BuiltinInput, BuiltinOutput, ConstValue, DerivativeAxis, LoopControl, RangeBound,
    StmtId, StmtKind, TextureOp,
};
use crate::span::Span;

/// Rendered listing of one module.
#[derive(Clone, Debug)]
pub struct Listing {
    pub text: String,
    spans: Vec<Span>,
}

impl Listing {
    /// Span of the header line of `id`; dummy for unknown ids.
    pub fn span(&self, id: StmtId) -> Span {
        self.spans.get(id.index()).copied().unwrap_or_default()
    }
}

pub fn listing(module: &IrModule) -> Listing {
    let mut printer = Printer {
        module,
        text: String::new(),
        spans: vec![Span::dummy(); module.len()],
    };
    printer.block(BlockId::ROOT, 0);
    Listing {
        text: printer.text,
        spans: printer.spans,
    }
}

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&listing(self).text)
    }
}

struct Printer<'a> {
    module: &'a IrModule,
    text: String,
    spans: Vec<Span>,
}

impl Printer<'_> {
    fn block(&mut self, block: BlockId, depth: usize) {
        for &id in &self.module.block(block).stmts {
            self.stmt(id, depth);
        }
    }

    fn line(&mut self, depth: usize, content: &str) -> Span {
        for _ in 0..depth {
            self.text.push_str("  ");
        }
        let start = self.text.len() as u32;
        self.text.push_str(content);
        let end = self.text.len() as u32;
        self.text.push('\n');
        Span::new(start, end)
    }

    fn stmt(&mut self, id: StmtId, depth: usize) {
        let stmt = self.module.stmt(id);
        let header = format!("{} = {}", id, describe(&stmt.kind));
        match &stmt.kind {
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => {
                self.spans[id.index()] = self.line(depth, &format!("{} {{", header));
                self.block(*then_block, depth + 1);
                if !self.module.block(*else_block).stmts.is_empty() {
                    self.line(depth, "} else {");
                    self.block(*else_block, depth + 1);
                }
                self.line(depth, "}");
            }
            StmtKind::While { body }
            | StmtKind::RangeFor { body, .. }
            | StmtKind::VertexFor { body }
            | StmtKind::FragmentFor { body } => {
                self.spans[id.index()] = self.line(depth, &format!("{} {{", header));
                self.block(*body, depth + 1);
                self.line(depth, "}");
            }
            _ => {
                self.spans[id.index()] = self.line(depth, &header);
            }
        }
    }
}

fn list(ids: &[StmtId]) -> String {
    let parts: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// Right-hand side of a statement header.
fn describe(kind: &StmtKind) -> String {
    let mut s = String::new();
    let _ = match kind {
        StmtKind::Const(ConstValue::I32(v)) => write!(s, "const i32 {}", v),
        StmtKind::Const(ConstValue::F32(v)) => write!(s, "const f32 {:?}", v),
        StmtKind::LoopIndex { loop_stmt } => write!(s, "loop_index {}", loop_stmt),
        StmtKind::ArgLoad { ty, arg_id } => write!(s, "arg_load {} #{}", ty, arg_id),
        StmtKind::Rand { ty } => write!(s, "rand {}", ty),
        StmtKind::UnaryOp { op, operand } => write!(s, "{} {}", op.name(), operand),
        StmtKind::BinaryOp { op, lhs, rhs } => write!(s, "{} {} {}", op.name(), lhs, rhs),
        StmtKind::If { cond, .. } => write!(s, "if {}", cond),
        StmtKind::While { .. } => write!(s, "while"),
        StmtKind::WhileControl {
            control: LoopControl::Break,
        } => write!(s, "break"),
        StmtKind::WhileControl {
            control: LoopControl::Continue,
        }
        | StmtKind::Continue => write!(s, "continue"),
        StmtKind::RangeFor {
            bound,
            strictly_serialize,
            ..
        } => {
            let _ = match bound {
                RangeBound::Value(v) => write!(s, "range_for {}", v),
                RangeBound::FieldElements(f) => write!(s, "range_for field{}", f.id),
            };
            if *strictly_serialize {
                s.push_str(" serial");
            }
            Ok(())
        }
        StmtKind::VertexFor { .. } => write!(s, "vertex_for"),
        StmtKind::FragmentFor { .. } => write!(s, "fragment_for"),
        StmtKind::Alloca { ty } => write!(s, "alloca {}", ty),
        StmtKind::LocalLoad { ptr } => write!(s, "local_load {}", ptr),
        StmtKind::LocalStore { ptr, value } => write!(s, "local_store {} {}", ptr, value),
        StmtKind::GlobalPtr {
            field,
            indices,
            element_offset,
        } => write!(
            s,
            "global_ptr field{}{} +{}",
            field.id,
            list(indices),
            element_offset
        ),
        StmtKind::GlobalLoad { ptr } => write!(s, "global_load {}", ptr),
        StmtKind::GlobalStore { ptr, value } => write!(s, "global_store {} {}", ptr, value),
        StmtKind::GlobalTemporary { ty, offset } => {
            write!(s, "global_temporary {} @{}", ty, offset)
        }
        StmtKind::GlobalTemporaryLoad { ptr } => write!(s, "global_temporary_load {}", ptr),
        StmtKind::GlobalTemporaryStore { ptr, value } => {
            write!(s, "global_temporary_store {} {}", ptr, value)
        }
        StmtKind::AtomicOp { op, dest, value } => {
            write!(s, "atomic_{} {} {}", op.name(), dest, value)
        }
        StmtKind::AtomicLoad { ptr } => write!(s, "atomic_load {}", ptr),
        StmtKind::AtomicStore { ptr, value } => write!(s, "atomic_store {} {}", ptr, value),
        StmtKind::VertexInput { ty, location } => {
            write!(s, "vertex_input {} @{}", ty, location)
        }
        StmtKind::VertexOutput { value, location } => {
            write!(s, "vertex_output {} @{}", value, location)
        }
        StmtKind::FragmentInput { ty, location } => {
            write!(s, "fragment_input {} @{}", ty, location)
        }
        StmtKind::BuiltinInput { builtin } => {
            let name = match builtin {
                BuiltinInput::VertexIndex => "vertex_index",
                BuiltinInput::InstanceIndex => "instance_index",
                BuiltinInput::FragCoord => "frag_coord",
            };
            write!(s, "builtin_input {}", name)
        }
        StmtKind::BuiltinOutput { builtin, values } => {
            let _ = match builtin {
                BuiltinOutput::Position => write!(s, "builtin_output position"),
                BuiltinOutput::FragDepth => write!(s, "builtin_output frag_depth"),
                BuiltinOutput::Color(loc) => write!(s, "builtin_output color@{}", loc),
            };
            write!(s, " {}", list(values))
        }
        StmtKind::FragmentDerivative { axis, operand } => {
            let name = match axis {
                DerivativeAxis::X => "dpdx",
                DerivativeAxis::Y => "dpdy",
            };
            write!(s, "{} {}", name, operand)
        }
        StmtKind::Discard => write!(s, "discard"),
        StmtKind::TextureFunction {
            op,
            texture,
            coords,
            operands,
        } => {
            let name = match op {
                TextureOp::Sample => "texture_sample",
                TextureOp::SampleLod => "texture_sample_lod",
                TextureOp::Load => "texture_load",
                TextureOp::Store => "texture_store",
            };
            let _ = write!(s, "{} texture{} {}", name, texture.id, list(coords));
            if !operands.is_empty() {
                let _ = write!(s, " {}", list(operands));
            }
            Ok(())
        }
        StmtKind::CompositeExtract { composite, index } => {
            write!(s, "extract {}.{}", composite, index)
        }
        StmtKind::Return { values } => write!(s, "return {}", list(values)),
    };
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::IrBuilder;
    use crate::ir::field::Field;
    use crate::ir::types::PrimitiveType;

    fn fill_module() -> IrModule {
        let f = Field::new(0, vec![100], PrimitiveType::I32);
        let mut b = IrBuilder::new();
        let n = b.create_const_i32(100);
        let lp = b.create_range_for(n, false);
        let g = b.get_range_loop_guard(lp);
        let i = b.get_loop_index(lp);
        let p = b.create_global_ptr(&f, &[i], 0);
        b.create_global_store(p, i);
        b.close_guard(g);
        b.finish()
    }

    #[test]
    fn test_listing_snapshot() {
        let m = fill_module();
        insta::assert_snapshot!(m.to_string(), @r###"
        %0 = const i32 100
        %1 = range_for %0 {
          %2 = loop_index %1
          %3 = global_ptr field0[%2] +0
          %4 = global_store %3 %2
        }
        "###);
    }

    #[test]
    fn test_spans_cover_headers() {
        let m = fill_module();
        let l = listing(&m);
        let span = l.span(StmtId(3));
        assert_eq!(&l.text[span.range()], "%3 = global_ptr field0[%2] +0");
        let span = l.span(StmtId(1));
        assert_eq!(&l.text[span.range()], "%1 = range_for %0 {");
        assert_eq!(l.span(StmtId(99)), Span::dummy());
    }

    #[test]
    fn test_if_else_listing() {
        let mut b = IrBuilder::new();
        let c = b.create_const_i32(1);
        let branch = b.create_if(c);
        let g = b.get_if_guard(branch, true);
        b.create_discard();
        b.close_guard(g);
        let text = b.finish().to_string();
        assert!(text.contains("%1 = if %0 {\n  %2 = discard\n}\n"));
        assert!(!text.contains("else"));
    }
}
