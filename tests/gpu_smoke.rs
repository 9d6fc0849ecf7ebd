use lumen::codegen::compile_kernel;
use lumen::config::CodegenConfig;
use lumen::demos;
use lumen::gpu::{KernelRunner, LaunchInputs, LaunchOutput};

/// Compile a demo and run its compute tasks, or None without an adapter.
fn run_demo(name: &str, rand_seed: u32) -> Option<LaunchOutput> {
    let runner = match KernelRunner::new() {
        Ok(r) => r,
        Err(_) => {
            eprintln!("No GPU available, skipping test");
            return None;
        }
    };
    let config = CodegenConfig::default();
    let program = (demos::find(name).expect("demo exists").build)();
    let kernel = compile_kernel(&program.module, program.signature, &config)
        .unwrap_or_else(|e| panic!("{} should compile: {}", name, e));
    let inputs = LaunchInputs {
        buffers: &program.buffers,
        args: &program.args,
        rand_seed,
    };
    Some(
        runner
            .launch(&kernel, &inputs, &config)
            .unwrap_or_else(|e| panic!("{} should run: {}", name, e)),
    )
}

#[test]
fn test_field2d_values() {
    let Some(out) = run_demo("field2d", 0) else {
        return;
    };
    let words = &out.roots[0].1;
    assert_eq!(words.len(), 128);
    for i in 0..16 {
        for j in 0..8 {
            let v = f32::from_bits(words[i * 8 + j]);
            assert_eq!(v, (i * 10 + j) as f32, "x[{}, {}]", i, j);
        }
    }
}

#[test]
fn test_local_var_sum() {
    let Some(out) = run_demo("local_var", 0) else {
        return;
    };
    // sum of 0..100
    assert_eq!(out.rets, vec![4950]);
}

#[test]
fn test_random_counts_agree() {
    let Some(out) = run_demo("random", 7) else {
        return;
    };
    let values: Vec<f32> = out.roots[0].1.iter().map(|w| f32::from_bits(*w)).collect();
    assert!(values.iter().all(|v| (0.0..1.0).contains(v)));
    let below = values.iter().filter(|v| **v < 0.5).count() as u32;
    assert_eq!(out.rets, vec![below]);
    assert!(below > 1024 && below < 3072, "{} of 4096 below 0.5", below);
}

#[test]
fn test_fractal_shades_in_range() {
    let Some(out) = run_demo("fractal", 0) else {
        return;
    };
    let shades: Vec<f32> = out.roots[0].1.iter().map(|w| f32::from_bits(*w)).collect();
    assert_eq!(shades.len(), 64 * 32);
    assert!(shades.iter().all(|s| (0.0..=1.0).contains(s)));
    assert!(shades.iter().any(|s| *s != shades[0]), "flat image");
}

#[test]
fn test_graphics_compute_pass_runs() {
    let Some(out) = run_demo("graphics", 0) else {
        return;
    };
    let corners: Vec<f32> = out.roots[0].1.iter().map(|w| f32::from_bits(*w)).collect();
    assert_eq!(corners.len(), 6);
    for k in 0..3 {
        let (x, y) = (corners[2 * k], corners[2 * k + 1]);
        assert!(((x * x + y * y).sqrt() - 0.75).abs() < 1e-4);
    }
}
