use super::*;
use crate::ir::field::{Field, TextureDimension, TextureFormat, TextureInfo};
use crate::ir::types::PrimitiveType;

#[test]
fn test_ids_strictly_increase() {
    let mut b = IrBuilder::new();
    let a = b.create_const_i32(1);
    let c = b.create_const_i32(2);
    let s = b.create_add(a, c);
    assert_eq!((a, c, s), (StmtId(0), StmtId(1), StmtId(2)));
    let m = b.finish();
    assert_eq!(m.root().stmts, vec![a, c, s]);
}

#[test]
fn test_guard_nests_statements() {
    let mut b = IrBuilder::new();
    let n = b.create_const_i32(100);
    let lp = b.create_range_for(n, false);
    let g = b.get_range_loop_guard(lp);
    let i = b.get_loop_index(lp);
    let two = b.create_const_i32(2);
    let x = b.create_mul(i, two);
    assert_eq!(b.open_guard_count(), 1);
    b.close_guard(g);
    let after = b.create_const_i32(0);
    assert_eq!(b.open_guard_count(), 0);

    let m = b.finish();
    assert_eq!(m.root().stmts, vec![n, lp, after]);
    let body = m.stmt(lp).child_blocks()[0];
    assert_eq!(m.block(body).stmts, vec![i, two, x]);
    assert_eq!(m.block(body).owner, Some(lp));
}

#[test]
fn test_if_else_blocks() {
    let mut b = IrBuilder::new();
    let c = b.create_const_i32(1);
    let cond = b.create_cmp_gt(c, c);
    let branch = b.create_if(cond);
    let g = b.get_if_guard(branch, true);
    let then_val = b.with_guard(g, |b| b.create_const_f32(1.0));
    let g = b.get_if_guard(branch, false);
    let else_val = b.create_const_f32(2.0);
    b.close_guard(g);

    let m = b.finish();
    let blocks = m.stmt(branch).child_blocks();
    assert_eq!(m.block(blocks[0]).stmts, vec![then_val]);
    assert_eq!(m.block(blocks[1]).stmts, vec![else_val]);
}

#[test]
fn test_nested_guards_form_ancestor_chain() {
    let mut b = IrBuilder::new();
    let w = b.create_while_true();
    let outer = b.get_while_loop_guard(w);
    let one = b.create_const_i32(1);
    let branch = b.create_if(one);
    let inner = b.get_if_guard(branch, true);
    b.create_break();
    assert_eq!(b.open_guard_count(), 2);
    let chain = b.module().enclosing_stmts(b.current_block());
    assert_eq!(chain, vec![branch, w]);
    b.close_guard(inner);
    b.close_guard(outer);
    assert_eq!(b.current_block(), BlockId::ROOT);
}

#[test]
#[should_panic(expected = "closed out of order")]
fn test_close_out_of_order_panics() {
    let mut b = IrBuilder::new();
    let w = b.create_while_true();
    let outer = b.get_while_loop_guard(w);
    let w2 = b.create_while_true();
    let _inner = b.get_while_loop_guard(w2);
    b.close_guard(outer);
}

#[test]
#[should_panic(expected = "is not a range-for")]
fn test_guard_on_wrong_kind_panics() {
    let mut b = IrBuilder::new();
    let c = b.create_const_i32(3);
    let _ = b.get_range_loop_guard(c);
}

#[test]
#[should_panic(expected = "guards must nest")]
fn test_guard_on_sibling_scope_panics() {
    let mut b = IrBuilder::new();
    let w1 = b.create_while_true();
    let w2 = b.create_while_true();
    let _g1 = b.get_while_loop_guard(w1);
    // w2 lives in the root, not in w1's body
    let _g2 = b.get_while_loop_guard(w2);
}

#[test]
#[should_panic(expected = "open guard")]
fn test_finish_with_open_guard_panics() {
    let mut b = IrBuilder::new();
    let w = b.create_while_true();
    let _g = b.get_while_loop_guard(w);
    b.finish();
}

#[test]
#[should_panic(expected = "outside its scope")]
fn test_operand_out_of_scope_panics() {
    let mut b = IrBuilder::new();
    let w = b.create_while_true();
    let g = b.get_while_loop_guard(w);
    let inner = b.create_const_i32(7);
    b.create_break();
    b.close_guard(g);
    b.create_neg(inner);
}

#[test]
#[should_panic(expected = "break outside of a while loop")]
fn test_break_in_range_for_panics() {
    let mut b = IrBuilder::new();
    let n = b.create_const_i32(4);
    let lp = b.create_range_for(n, true);
    let _g = b.get_range_loop_guard(lp);
    b.create_break();
}

#[test]
fn test_continue_in_range_for() {
    let mut b = IrBuilder::new();
    let n = b.create_const_i32(4);
    let lp = b.create_range_for(n, false);
    let g = b.get_range_loop_guard(lp);
    let c = b.create_continue();
    b.close_guard(g);
    assert_eq!(b.module().stmt(c).kind, StmtKind::Continue);
}

#[test]
#[should_panic(expected = "outside its body")]
fn test_loop_index_outside_body_panics() {
    let mut b = IrBuilder::new();
    let n = b.create_const_i32(4);
    let first = b.create_range_for(n, false);
    let second = b.create_range_for(n, false);
    let _g = b.get_range_loop_guard(second);
    b.get_loop_index(first);
}

#[test]
fn test_global_ptr_checks_arity() {
    let f = Field::new(0, vec![4, 4], PrimitiveType::F32);
    let mut b = IrBuilder::new();
    let i = b.create_const_i32(1);
    let p = b.create_global_ptr(&f, &[i, i], 0);
    let v = b.create_global_load(p);
    b.create_global_store(p, v);
    assert_eq!(b.module().stmt(p).operands(), vec![i, i]);
}

#[test]
#[should_panic(expected = "has 2 dimension(s), got 1 index(es)")]
fn test_global_ptr_wrong_index_count_panics() {
    let f = Field::new(0, vec![4, 4], PrimitiveType::F32);
    let mut b = IrBuilder::new();
    let i = b.create_const_i32(1);
    b.create_global_ptr(&f, &[i], 0);
}

#[test]
#[should_panic(expected = "expected %0 to be an alloca")]
fn test_local_load_requires_alloca() {
    let mut b = IrBuilder::new();
    let c = b.create_const_i32(1);
    b.create_local_load(c);
}

#[test]
fn test_atomics_on_temporary() {
    let mut b = IrBuilder::new();
    let t = b.create_global_temporary(PrimitiveType::I32, 8);
    let one = b.create_const_i32(1);
    let old = b.create_atomic_add(t, one);
    assert!(matches!(
        b.module().stmt(old).kind,
        StmtKind::AtomicOp { dest, .. } if dest == t
    ));
}

#[test]
#[should_panic(expected = "needs 2 coordinate(s), got 3")]
fn test_texture_coord_count_checked() {
    let tex = TextureInfo::new(0, TextureDimension::D2, TextureFormat::Rgba8Unorm);
    let mut b = IrBuilder::new();
    let c = b.create_const_f32(0.5);
    b.create_texture_sample(&tex, &[c, c, c]);
}

#[test]
#[should_panic(expected = "position output takes 4 components")]
fn test_position_output_arity() {
    let mut b = IrBuilder::new();
    let c = b.create_const_f32(0.0);
    b.create_position_output(&[c, c, c]);
}

#[test]
fn test_vertex_fragment_bodies() {
    let mut b = IrBuilder::new();
    let vf = b.create_vertex_for();
    let g = b.get_vertex_loop_guard(vf);
    b.with_guard(g, |b| {
        let x = b.create_vertex_input(PrimitiveType::F32, 0);
        let one = b.create_const_f32(1.0);
        b.create_position_output(&[x, x, x, one]);
        b.create_vertex_output(x, 0);
    });
    let ff = b.create_fragment_for();
    let g = b.get_fragment_loop_guard(ff);
    b.with_guard(g, |b| {
        let v = b.create_fragment_input(PrimitiveType::F32, 0);
        b.create_color_output(0, &[v, v, v, v]);
    });
    let m = b.finish();
    assert_eq!(m.root().stmts, vec![vf, ff]);
    assert_eq!(m.len(), 8);
}
