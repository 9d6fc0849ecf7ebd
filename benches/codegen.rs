//! Code generation throughput.
//!
//! Measures the stages between a built IR module and shader text:
//! 1. Offload partitioning
//! 2. WGSL generation for a wide straight-line range-for body
//! 3. Whole-kernel compilation of every demo

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use lumen::codegen::{compile_kernel, KernelSignature};
use lumen::config::CodegenConfig;
use lumen::demos;
use lumen::ir::builder::IrBuilder;
use lumen::ir::field::Field;
use lumen::ir::module::IrModule;
use lumen::ir::offload::partition;
use lumen::ir::types::PrimitiveType;

/// A range-for whose body is a chain of `n` arithmetic statements.
fn synthetic_kernel(n: usize) -> IrModule {
    let f = Field::new(0, vec![4096], PrimitiveType::F32);
    let mut b = IrBuilder::new();
    let lp = b.create_range_for_field(&f, false);
    let g = b.get_range_loop_guard(lp);
    b.with_guard(g, |b| {
        let i = b.get_loop_index(lp);
        let p = b.create_global_ptr(&f, &[i], 0);
        let mut acc = b.create_global_load(p);
        for k in 0..n {
            let c = b.create_const_f32(k as f32 * 0.5);
            acc = match k % 4 {
                0 => b.create_add(acc, c),
                1 => b.create_mul(acc, c),
                2 => b.create_max(acc, c),
                _ => b.create_sin(acc),
            };
        }
        b.create_global_store(p, acc);
    });
    b.finish()
}

fn bench_partition(c: &mut Criterion) {
    let small = synthetic_kernel(50);
    let large = synthetic_kernel(500);

    let mut group = c.benchmark_group("partition");
    group.bench_function("50_stmts", |b| b.iter(|| partition(black_box(&small))));
    group.bench_function("500_stmts", |b| b.iter(|| partition(black_box(&large))));
    group.finish();
}

fn bench_generate(c: &mut Criterion) {
    let config = CodegenConfig::default();
    let module = synthetic_kernel(500);

    c.bench_function("generate_500_stmts", |b| {
        b.iter(|| compile_kernel(black_box(&module), KernelSignature::default(), &config))
    });
}

fn bench_demos(c: &mut Criterion) {
    let config = CodegenConfig::default();
    let programs: Vec<_> = demos::all().iter().map(|d| (d.build)()).collect();

    c.bench_function("compile_all_demos", |b| {
        b.iter(|| {
            for p in &programs {
                let _ = compile_kernel(black_box(&p.module), p.signature, &config);
            }
        })
    });
}

criterion_group!(benches, bench_partition, bench_generate, bench_demos);
criterion_main!(benches);
