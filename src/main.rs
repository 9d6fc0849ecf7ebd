use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

use lumen::codegen::{compile_kernel, KernelParams};
use lumen::config::CodegenConfig;
use lumen::demos::{self, Demo, DemoProgram};
use lumen::diagnostic::Diagnostic;
use lumen::gpu::{KernelRunner, LaunchInputs};
use lumen::ir::display::listing;

#[derive(Parser)]
#[command(
    name = "lumen",
    version,
    about = "Lumen: statement-graph IR to WGSL compute and render shaders"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the built-in demo kernels
    List,
    /// Print the IR listing of a demo
    Ir {
        /// Demo name (see `lumen list`)
        demo: String,
    },
    /// Generate WGSL for a demo
    Emit {
        /// Demo name (see `lumen list`)
        demo: String,
        /// Print task descriptors as JSON instead of shader text
        #[arg(long)]
        json: bool,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Codegen config file (TOML)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Dispatch a demo's compute tasks on the GPU and print the results
    Run {
        /// Demo name (see `lumen list`)
        demo: String,
        /// Codegen config file (TOML)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Seed word for random number generation
        #[arg(long, default_value_t = 0)]
        seed: u32,
        /// Number of buffer words to print
        #[arg(long, default_value_t = 16)]
        limit: usize,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::List => cmd_list(),
        Command::Ir { demo } => cmd_ir(&demo),
        Command::Emit {
            demo,
            json,
            output,
            config,
        } => cmd_emit(&demo, json, output, config.as_deref()),
        Command::Run {
            demo,
            config,
            seed,
            limit,
        } => cmd_run(&demo, config.as_deref(), seed, limit),
    }
}

// --- helpers ---

fn find_demo(name: &str) -> &'static Demo {
    match demos::find(name) {
        Some(d) => d,
        None => {
            eprintln!("error: unknown demo '{}'", name);
            eprintln!("available: {}", demo_names().join(", "));
            process::exit(1);
        }
    }
}

fn demo_names() -> Vec<&'static str> {
    demos::all().iter().map(|d| d.name).collect()
}

fn load_config(path: Option<&Path>) -> CodegenConfig {
    let Some(path) = path else {
        return CodegenConfig::default();
    };
    match CodegenConfig::load(path) {
        Ok(c) => c,
        Err(diag) => {
            report(&diag);
            process::exit(1);
        }
    }
}

/// Print a diagnostic that has no source text to point into.
fn report(diag: &Diagnostic) {
    eprintln!("error: {}", diag.message);
    for note in &diag.notes {
        eprintln!("  note: {}", note);
    }
    if let Some(help) = &diag.help {
        eprintln!("  help: {}", help);
    }
}

/// Compile a demo, rendering codegen failures against its IR listing.
fn compile_demo(demo: &Demo, config: &CodegenConfig) -> (DemoProgram, KernelParams) {
    let program = (demo.build)();
    match compile_kernel(&program.module, program.signature, config) {
        Ok(kernel) => (program, kernel),
        Err(e) => {
            let l = listing(&program.module);
            let filename = format!("{}.ir", demo.name);
            Diagnostic::from_codegen_error(&e, &l).render(&filename, &l.text);
            process::exit(1);
        }
    }
}

// --- lumen list ---

fn cmd_list() {
    let width = demo_names().iter().map(|n| n.len()).max().unwrap_or(0);
    for demo in demos::all() {
        println!("  {:<width$}  {}", demo.name, demo.description, width = width);
    }
}

// --- lumen ir ---

fn cmd_ir(name: &str) {
    let demo = find_demo(name);
    let program = (demo.build)();
    print!("{}", program.module);
}

// --- lumen emit ---

fn cmd_emit(name: &str, json: bool, output: Option<PathBuf>, config: Option<&Path>) {
    let demo = find_demo(name);
    let config = load_config(config);
    let (_, kernel) = compile_demo(demo, &config);

    let text = if json {
        match kernel.to_json() {
            Ok(s) => s + "\n",
            Err(e) => {
                eprintln!("error: cannot serialize task descriptors: {}", e);
                process::exit(1);
            }
        }
    } else {
        let mut out = String::new();
        for (i, task) in kernel.tasks.iter().enumerate() {
            out.push_str(&format!(
                "// task {}: {} {}\n",
                i,
                task.kind.name(),
                task.short_hash()
            ));
            out.push_str(&task.code);
            out.push('\n');
        }
        out
    };

    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, &text) {
                eprintln!("error: cannot write '{}': {}", path.display(), e);
                process::exit(1);
            }
            eprintln!(
                "Wrote {} task(s) to {}",
                kernel.tasks.len(),
                path.display()
            );
        }
        None => print!("{}", text),
    }
}

// --- lumen run ---

fn cmd_run(name: &str, config: Option<&Path>, seed: u32, limit: usize) {
    let demo = find_demo(name);
    let config = load_config(config);
    let (program, kernel) = compile_demo(demo, &config);

    let runner = match KernelRunner::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };
    let inputs = LaunchInputs {
        buffers: &program.buffers,
        args: &program.args,
        rand_seed: seed,
    };
    let out = match runner.launch(&kernel, &inputs, &config) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let float_buffers: Vec<u32> = program
        .module
        .stmts()
        .iter()
        .filter_map(|s| match &s.kind {
            lumen::ir::StmtKind::GlobalPtr { field, .. } if field.dtype.is_float() => {
                Some(field.buffer)
            }
            _ => None,
        })
        .collect();

    if let Some((id, words)) = out.roots.first() {
        let shown: Vec<String> = words
            .iter()
            .take(limit)
            .map(|w| {
                if float_buffers.contains(id) {
                    format!("{}", f32::from_bits(*w))
                } else {
                    format!("{}", *w as i32)
                }
            })
            .collect();
        println!("root buffer {} ({} words):", id, words.len());
        println!("  [{}{}]", shown.join(", "), if words.len() > limit { ", ..." } else { "" });
    }
    if !out.rets.is_empty() {
        let rets: Vec<String> = out.rets.iter().map(|w| (*w as i32).to_string()).collect();
        println!("returns: [{}]", rets.join(", "));
    }
}
