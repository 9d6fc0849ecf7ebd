//! Offload detection and partitioning.
//!
//! Every top-level parallel `range-for`, `vertex-for`, and `fragment-for`
//! is its own dispatch. Maximal runs of the remaining top-level statements
//! form serial dispatches. Top-level constants belong to no offload:
//! codegen inlines them wherever they are referenced.

use std::collections::HashSet;

use log::debug;
use serde::Serialize;

use super::module::IrModule;
use super::stmt::{RangeBound, StmtId, StmtKind};
use crate::codegen::CodegenError;

/// Assembly strategy of one offload, chosen from its root statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OffloadKind {
    Serial,
    RangeFor,
    VertexFor,
    FragmentFor,
}

impl OffloadKind {
    pub fn is_compute(self) -> bool {
        matches!(self, OffloadKind::Serial | OffloadKind::RangeFor)
    }

    pub fn name(self) -> &'static str {
        match self {
            OffloadKind::Serial => "serial",
            OffloadKind::RangeFor => "range_for",
            OffloadKind::VertexFor => "vertex_for",
            OffloadKind::FragmentFor => "fragment_for",
        }
    }
}

/// One independently dispatchable slice of a module's root block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OffloadedModule {
    pub kind: OffloadKind,
    /// Top-level statements, in order. Exactly one for non-serial kinds.
    pub stmts: Vec<StmtId>,
}

impl OffloadedModule {
    pub fn new(module: &IrModule, stmts: Vec<StmtId>) -> Self {
        let kind = detect_kind(module, &stmts);
        Self { kind, stmts }
    }

    /// The root statement of a non-serial offload.
    pub fn root(&self) -> Option<StmtId> {
        match self.kind {
            OffloadKind::Serial => None,
            _ => self.stmts.first().copied(),
        }
    }
}

/// Kind of the offload rooted in `stmts`.
pub fn detect_kind(module: &IrModule, stmts: &[StmtId]) -> OffloadKind {
    match stmts {
        [single] => standalone_kind(&module.stmt(*single).kind).unwrap_or(OffloadKind::Serial),
        _ => OffloadKind::Serial,
    }
}

/// Kinds that always get a dispatch of their own.
fn standalone_kind(kind: &StmtKind) -> Option<OffloadKind> {
    match kind {
        StmtKind::RangeFor {
            strictly_serialize: false,
            ..
        } => Some(OffloadKind::RangeFor),
        StmtKind::VertexFor { .. } => Some(OffloadKind::VertexFor),
        StmtKind::FragmentFor { .. } => Some(OffloadKind::FragmentFor),
        _ => None,
    }
}

/// Split the root block into offloads and check that none of them reads
/// a value computed by another.
pub fn partition(module: &IrModule) -> Result<Vec<OffloadedModule>, CodegenError> {
    let mut offloads = Vec::new();
    let mut serial: Vec<StmtId> = Vec::new();

    for &id in &module.root().stmts {
        let kind = &module.stmt(id).kind;
        if matches!(kind, StmtKind::Const(_)) {
            continue;
        }
        match standalone_kind(kind) {
            Some(k) => {
                if !serial.is_empty() {
                    offloads.push(OffloadedModule {
                        kind: OffloadKind::Serial,
                        stmts: std::mem::take(&mut serial),
                    });
                }
                offloads.push(OffloadedModule {
                    kind: k,
                    stmts: vec![id],
                });
            }
            None => serial.push(id),
        }
    }
    if !serial.is_empty() {
        offloads.push(OffloadedModule {
            kind: OffloadKind::Serial,
            stmts: serial,
        });
    }

    for offload in &offloads {
        check_self_contained(module, offload)?;
        debug!("offload {} over {:?}", offload.kind.name(), offload.stmts);
    }
    Ok(offloads)
}

fn check_self_contained(module: &IrModule, offload: &OffloadedModule) -> Result<(), CodegenError> {
    let members: HashSet<StmtId> = module.collect_nested(&offload.stmts).into_iter().collect();
    let mut ids: Vec<StmtId> = members.iter().copied().collect();
    ids.sort();

    for id in ids {
        let stmt = module.stmt(id);
        for op in stmt.operands() {
            if members.contains(&op) || matches!(module.stmt(op).kind, StmtKind::Const(_)) {
                continue;
            }
            if offload.root() == Some(id) && is_dynamic_bound(module, &stmt.kind, op) {
                continue;
            }
            return Err(CodegenError::CrossOffloadReference { stmt: id, operand: op });
        }
    }
    Ok(())
}

/// A root `range-for` may take its bound from a global temporary written
/// by an earlier dispatch.
fn is_dynamic_bound(module: &IrModule, kind: &StmtKind, op: StmtId) -> bool {
    match kind {
        StmtKind::RangeFor {
            bound: RangeBound::Value(v),
            ..
        } if *v == op => match module.stmt(op).kind {
            StmtKind::GlobalTemporaryLoad { ptr } => {
                matches!(module.stmt(ptr).kind, StmtKind::GlobalTemporary { .. })
            }
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::IrBuilder;
    use crate::ir::field::Field;
    use crate::ir::types::PrimitiveType;

    #[test]
    fn test_partition_kinds() {
        let f = Field::new(0, vec![8], PrimitiveType::I32);
        let mut b = IrBuilder::new();
        let n = b.create_const_i32(8);
        let zero = b.create_const_i32(0);
        let p = b.create_global_ptr(&f, &[zero], 0);
        b.create_global_store(p, n);
        let lp = b.create_range_for(n, false);
        let g = b.get_range_loop_guard(lp);
        b.close_guard(g);
        let serial_loop = b.create_range_for(n, true);
        let vf = b.create_vertex_for();
        let ff = b.create_fragment_for();
        let m = b.finish();

        let offloads = partition(&m).unwrap();
        let kinds: Vec<OffloadKind> = offloads.iter().map(|o| o.kind).collect();
        assert_eq!(
            kinds,
            vec![
                OffloadKind::Serial,
                OffloadKind::RangeFor,
                OffloadKind::Serial,
                OffloadKind::VertexFor,
                OffloadKind::FragmentFor,
            ]
        );
        assert_eq!(offloads[0].stmts, vec![p, StmtId(3)]);
        assert_eq!(offloads[1].root(), Some(lp));
        assert_eq!(offloads[2].stmts, vec![serial_loop]);
        assert_eq!(offloads[3].stmts, vec![vf]);
        assert_eq!(offloads[4].stmts, vec![ff]);
        let compute: Vec<bool> = kinds.iter().map(|k| k.is_compute()).collect();
        assert_eq!(compute, vec![true, true, true, false, false]);
    }

    #[test]
    fn test_detect_kind_single_root() {
        let mut b = IrBuilder::new();
        let n = b.create_const_i32(4);
        let lp = b.create_range_for(n, false);
        let serial = b.create_range_for(n, true);
        let m = b.finish();
        assert_eq!(detect_kind(&m, &[lp]), OffloadKind::RangeFor);
        assert_eq!(detect_kind(&m, &[serial]), OffloadKind::Serial);
        assert_eq!(detect_kind(&m, &[lp, serial]), OffloadKind::Serial);
    }

    #[test]
    fn test_cross_offload_reference_rejected() {
        let f = Field::new(0, vec![4], PrimitiveType::I32);
        let mut b = IrBuilder::new();
        let zero = b.create_const_i32(0);
        let p = b.create_global_ptr(&f, &[zero], 0);
        let v = b.create_global_load(p);
        let lp = b.create_range_for(v, false);
        let m = b.finish();
        let err = partition(&m).unwrap_err();
        assert_eq!(
            err,
            CodegenError::CrossOffloadReference {
                stmt: lp,
                operand: v
            }
        );
    }

    #[test]
    fn test_dynamic_bound_allowed() {
        let mut b = IrBuilder::new();
        let t = b.create_global_temporary(PrimitiveType::I32, 0);
        let n = b.create_global_temporary_load(t);
        let lp = b.create_range_for(n, false);
        let m = b.finish();
        let offloads = partition(&m).unwrap();
        assert_eq!(offloads.len(), 2);
        assert_eq!(offloads[1].root(), Some(lp));
    }
}
