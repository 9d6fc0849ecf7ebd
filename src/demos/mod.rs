//! Reference programs built through the IR builder.
//!
//! Each demo is a complete kernel: an IR module, its argument/return
//! block sizes, and the root buffers a runtime has to allocate for it.

use crate::codegen::KernelSignature;
use crate::ir::builder::IrBuilder;
use crate::ir::field::Field;
use crate::ir::module::IrModule;
use crate::ir::types::PrimitiveType::{F32, I32};

/// A root buffer the demo reads or writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferSpec {
    pub id: u32,
    pub size_words: u32,
}

impl BufferSpec {
    fn of(field: &Field) -> Self {
        Self {
            id: field.buffer,
            size_words: field
                .size_words()
                .map_or(u32::MAX, |n| n.saturating_add(field.offset_words)),
        }
    }
}

pub struct DemoProgram {
    pub module: IrModule,
    pub signature: KernelSignature,
    pub buffers: Vec<BufferSpec>,
    /// 32-bit words passed as kernel arguments by `lumen run`.
    pub args: Vec<u32>,
}

pub struct Demo {
    pub name: &'static str,
    pub description: &'static str,
    pub build: fn() -> DemoProgram,
}

const DEMOS: &[Demo] = &[
    Demo {
        name: "fill",
        description: "x[i] = i over a 1-D i32 field",
        build: fill,
    },
    Demo {
        name: "field2d",
        description: "x[i, j] = i * 10 + j over a 16x8 f32 field",
        build: field2d,
    },
    Demo {
        name: "local_var",
        description: "serial sum of 0..n into a local variable, returned to the host",
        build: local_var,
    },
    Demo {
        name: "random",
        description: "uniform random floats plus an atomic count of values below 0.5",
        build: random,
    },
    Demo {
        name: "fractal",
        description: "julia set escape times over a 64x32 f32 field",
        build: fractal,
    },
    Demo {
        name: "graphics",
        description: "compute pass writing a triangle, drawn by a vertex/fragment pair",
        build: graphics,
    },
];

pub fn all() -> &'static [Demo] {
    DEMOS
}

pub fn find(name: &str) -> Option<&'static Demo> {
    DEMOS.iter().find(|d| d.name == name)
}

// --- fill ---

fn fill() -> DemoProgram {
    let x = Field::new(0, vec![1000], I32);
    let mut b = IrBuilder::new();
    let n = b.create_const_i32(1000);
    let lp = b.create_range_for(n, false);
    let g = b.get_range_loop_guard(lp);
    b.with_guard(g, |b| {
        let i = b.get_loop_index(lp);
        let p = b.create_global_ptr(&x, &[i], 0);
        b.create_global_store(p, i);
    });
    DemoProgram {
        module: b.finish(),
        signature: KernelSignature::default(),
        buffers: vec![BufferSpec::of(&x)],
        args: Vec::new(),
    }
}

// --- field2d ---

fn field2d() -> DemoProgram {
    let x = Field::new(0, vec![16, 8], F32);
    let mut b = IrBuilder::new();
    let lp = b.create_range_for_field(&x, false);
    let g = b.get_range_loop_guard(lp);
    b.with_guard(g, |b| {
        let idx = b.get_loop_index(lp);
        let cols = b.create_const_i32(8);
        let i = b.create_floordiv(idx, cols);
        let j = b.create_mod(idx, cols);
        let ten = b.create_const_i32(10);
        let row = b.create_mul(i, ten);
        let v = b.create_add(row, j);
        let v = b.create_cast_f32_value(v);
        let p = b.create_global_ptr(&x, &[i, j], 0);
        b.create_global_store(p, v);
    });
    DemoProgram {
        module: b.finish(),
        signature: KernelSignature::default(),
        buffers: vec![BufferSpec::of(&x)],
        args: Vec::new(),
    }
}

// --- local_var ---

fn local_var() -> DemoProgram {
    let mut b = IrBuilder::new();
    let n = b.create_arg_load(I32, 0);
    let sum = b.create_local_var(I32);
    let zero = b.create_const_i32(0);
    b.create_local_store(sum, zero);
    let lp = b.create_range_for(n, true);
    let g = b.get_range_loop_guard(lp);
    b.with_guard(g, |b| {
        let i = b.get_loop_index(lp);
        let acc = b.create_local_load(sum);
        let next = b.create_add(acc, i);
        b.create_local_store(sum, next);
    });
    let total = b.create_local_load(sum);
    b.create_return(total);
    DemoProgram {
        module: b.finish(),
        signature: KernelSignature::new(4, 4),
        buffers: Vec::new(),
        args: vec![100],
    }
}

// --- random ---

fn random() -> DemoProgram {
    let x = Field::new(0, vec![4096], F32);
    let mut b = IrBuilder::new();
    let counter = b.create_global_temporary(I32, 0);
    let zero = b.create_const_i32(0);
    b.create_global_temporary_store(counter, zero);

    let lp = b.create_range_for_field(&x, false);
    let g = b.get_range_loop_guard(lp);
    b.with_guard(g, |b| {
        let i = b.get_loop_index(lp);
        let r = b.create_rand(F32);
        let p = b.create_global_ptr(&x, &[i], 0);
        b.create_global_store(p, r);
        let half = b.create_const_f32(0.5);
        let below = b.create_cmp_lt(r, half);
        let tmp = b.create_global_temporary(I32, 0);
        b.create_atomic_add(tmp, below);
    });

    let tmp = b.create_global_temporary(I32, 0);
    let count = b.create_global_temporary_load(tmp);
    b.create_return(count);
    DemoProgram {
        module: b.finish(),
        signature: KernelSignature::new(0, 4),
        buffers: vec![BufferSpec::of(&x)],
        args: Vec::new(),
    }
}

// --- fractal ---

const FRACTAL_N: i32 = 32;
const FRACTAL_MAX_ITERS: i32 = 50;

fn fractal() -> DemoProgram {
    let pixels = Field::new(0, vec![FRACTAL_N as u32 * 2, FRACTAL_N as u32], F32);
    let mut b = IrBuilder::new();
    let lp = b.create_range_for_field(&pixels, false);
    let g = b.get_range_loop_guard(lp);
    b.with_guard(g, |b| {
        let idx = b.get_loop_index(lp);
        let n = b.create_const_i32(FRACTAL_N);
        let i = b.create_floordiv(idx, n);
        let j = b.create_mod(idx, n);

        // c = (-0.8, 0.2 cos t)
        let t = b.create_arg_load(F32, 0);
        let cos_t = b.create_cos(t);
        let scale = b.create_const_f32(0.2);
        let c_im = b.create_mul(cos_t, scale);
        let c_re = b.create_const_f32(-0.8);

        // z = (i / n - 1, j / n - 0.5) * 2
        let nf = b.create_const_f32(FRACTAL_N as f32);
        let fi = b.create_cast_f32_value(i);
        let fj = b.create_cast_f32_value(j);
        let two = b.create_const_f32(2.0);
        let one = b.create_const_f32(1.0);
        let half = b.create_const_f32(0.5);
        let zr0 = b.create_truediv(fi, nf);
        let zr0 = b.create_sub(zr0, one);
        let zr0 = b.create_mul(zr0, two);
        let zi0 = b.create_truediv(fj, nf);
        let zi0 = b.create_sub(zi0, half);
        let zi0 = b.create_mul(zi0, two);

        let zr = b.create_local_var(F32);
        let zi = b.create_local_var(F32);
        let iters = b.create_local_var(I32);
        b.create_local_store(zr, zr0);
        b.create_local_store(zi, zi0);
        let zero = b.create_const_i32(0);
        b.create_local_store(iters, zero);

        let w = b.create_while_true();
        let g = b.get_while_loop_guard(w);
        b.with_guard(g, |b| {
            let x = b.create_local_load(zr);
            let y = b.create_local_load(zi);
            let k = b.create_local_load(iters);
            let xx = b.create_mul(x, x);
            let yy = b.create_mul(y, y);
            let norm = b.create_add(xx, yy);
            let four = b.create_const_f32(4.0);
            let escaped = b.create_cmp_ge(norm, four);
            let limit = b.create_const_i32(FRACTAL_MAX_ITERS);
            let exhausted = b.create_cmp_ge(k, limit);
            let done = b.create_logical_or(escaped, exhausted);
            let branch = b.create_if(done);
            let g = b.get_if_guard(branch, true);
            b.with_guard(g, |b| b.create_break());

            let re = b.create_sub(xx, yy);
            let re = b.create_add(re, c_re);
            let xy = b.create_mul(x, y);
            let two = b.create_const_f32(2.0);
            let im = b.create_mul(xy, two);
            let im = b.create_add(im, c_im);
            b.create_local_store(zr, re);
            b.create_local_store(zi, im);
            let step = b.create_const_i32(1);
            let k = b.create_add(k, step);
            b.create_local_store(iters, k);
        });

        let k = b.create_local_load(iters);
        let k = b.create_cast_f32_value(k);
        let per_iter = b.create_const_f32(1.0 / FRACTAL_MAX_ITERS as f32);
        let shade = b.create_mul(k, per_iter);
        let one = b.create_const_f32(1.0);
        let v = b.create_sub(one, shade);
        let p = b.create_global_ptr(&pixels, &[i, j], 0);
        b.create_global_store(p, v);
    });
    DemoProgram {
        module: b.finish(),
        signature: KernelSignature::new(4, 0),
        buffers: vec![BufferSpec::of(&pixels)],
        args: vec![0.0f32.to_bits()],
    }
}

// --- graphics ---

fn graphics() -> DemoProgram {
    let vertices = Field::new(0, vec![3], F32).with_components(2);
    let mut b = IrBuilder::new();

    // Corners of a triangle, one per invocation.
    let n = b.create_const_i32(3);
    let lp = b.create_range_for(n, false);
    let g = b.get_range_loop_guard(lp);
    b.with_guard(g, |b| {
        let i = b.get_loop_index(lp);
        let fi = b.create_cast_f32_value(i);
        let step = b.create_const_f32(2.094_395);
        let angle = b.create_mul(fi, step);
        let x = b.create_sin(angle);
        let y = b.create_cos(angle);
        let scale = b.create_const_f32(0.75);
        let x = b.create_mul(x, scale);
        let y = b.create_mul(y, scale);
        let px = b.create_global_ptr(&vertices, &[i], 0);
        b.create_global_store(px, x);
        let py = b.create_global_ptr(&vertices, &[i], 1);
        b.create_global_store(py, y);
    });

    let vf = b.create_vertex_for();
    let g = b.get_vertex_loop_guard(vf);
    b.with_guard(g, |b| {
        let vid = b.create_vertex_index_input();
        let three = b.create_const_i32(3);
        let i = b.create_mod(vid, three);
        let px = b.create_global_ptr(&vertices, &[i], 0);
        let x = b.create_global_load(px);
        let py = b.create_global_ptr(&vertices, &[i], 1);
        let y = b.create_global_load(py);
        let z = b.create_const_f32(0.0);
        let w = b.create_const_f32(1.0);
        b.create_position_output(&[x, y, z, w]);
        let fi = b.create_cast_f32_value(i);
        let half = b.create_const_f32(0.5);
        let t = b.create_mul(fi, half);
        b.create_vertex_output(t, 0);
    });

    let ff = b.create_fragment_for();
    let g = b.get_fragment_loop_guard(ff);
    b.with_guard(g, |b| {
        let t = b.create_fragment_input(F32, 0);
        // tint from the first corner, through the binding the vertex stage declared
        let zero = b.create_const_i32(0);
        let px = b.create_global_ptr(&vertices, &[zero], 0);
        let tint = b.create_global_load(px);
        let tint = b.create_abs(tint);
        let one = b.create_const_f32(1.0);
        let inv = b.create_sub(one, t);
        b.create_color_output(0, &[t, tint, inv, one]);
    });

    DemoProgram {
        module: b.finish(),
        signature: KernelSignature::default(),
        buffers: vec![BufferSpec::of(&vertices)],
        args: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{compile_kernel, Dispatch, RangeHint};
    use crate::config::CodegenConfig;
    use crate::ir::offload::OffloadKind;

    fn validate(code: &str) {
        let module = match naga::front::wgsl::parse_str(code) {
            Ok(m) => m,
            Err(e) => panic!("{}\n--- shader ---\n{}", e.emit_to_string(code), code),
        };
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        if let Err(e) = validator.validate(&module) {
            panic!("{}\n--- shader ---\n{}", e.emit_to_string(code), code);
        }
    }

    #[test]
    fn test_every_demo_compiles_to_valid_wgsl() {
        let config = CodegenConfig::default();
        for demo in all() {
            let program = (demo.build)();
            let kernel = compile_kernel(&program.module, program.signature, &config)
                .unwrap_or_else(|e| panic!("demo {}: {}", demo.name, e));
            assert!(!kernel.tasks.is_empty(), "demo {} has no tasks", demo.name);
            for task in &kernel.tasks {
                validate(&task.code);
            }
            assert_eq!(
                program.args.len() * 4,
                program.signature.arg_bytes as usize,
                "demo {} argument count",
                demo.name
            );
        }
    }

    #[test]
    fn test_find() {
        assert_eq!(find("fractal").map(|d| d.name), Some("fractal"));
        assert!(find("mandelbrot").is_none());
        let names: Vec<&str> = all().iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec!["fill", "field2d", "local_var", "random", "fractal", "graphics"]
        );
    }

    #[test]
    fn test_field2d_uses_field_bound() {
        let program = field2d();
        let kernel =
            compile_kernel(&program.module, program.signature, &CodegenConfig::default()).unwrap();
        assert_eq!(
            kernel.tasks[0].dispatch,
            Dispatch::Compute {
                workgroup_size: 128,
                num_workgroups: 1,
                range: Some(RangeHint::FieldElements {
                    field: 0,
                    count: 128
                }),
            }
        );
    }

    #[test]
    fn test_random_task_sequence() {
        let program = random();
        let kernel =
            compile_kernel(&program.module, program.signature, &CodegenConfig::default()).unwrap();
        let kinds: Vec<OffloadKind> = kernel.tasks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![OffloadKind::Serial, OffloadKind::RangeFor, OffloadKind::Serial]
        );
        assert!(kernel.tasks[1].code.contains("atomicAdd("));
        assert!(kernel.tasks[2].code.contains("rets_.member[0]"));
    }

    #[test]
    fn test_graphics_fragment_shares_vertex_slot() {
        let program = graphics();
        let kernel =
            compile_kernel(&program.module, program.signature, &CodegenConfig::default()).unwrap();
        let kinds: Vec<OffloadKind> = kernel.tasks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                OffloadKind::RangeFor,
                OffloadKind::VertexFor,
                OffloadKind::FragmentFor
            ]
        );
        let vertex = &kernel.tasks[1].bindings;
        let fragment = &kernel.tasks[2].bindings;
        assert_eq!(vertex.len(), 1);
        assert_eq!(fragment, vertex);
        assert!(kernel.tasks[1]
            .code
            .contains("var<storage, read> root_buffer_0_"));
    }

    #[test]
    fn test_buffer_specs() {
        let program = graphics();
        assert_eq!(
            program.buffers,
            vec![BufferSpec {
                id: 0,
                size_words: 6
            }]
        );
        assert!(local_var().buffers.is_empty());
    }
}
