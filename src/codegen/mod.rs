//! WGSL code generation: offload partitioning, per-offload shader
//! generation, and the task descriptors a runtime dispatches.

pub mod bindings;
pub mod error;
pub mod task;
pub mod wgsl;

use log::info;
use rayon::prelude::*;

pub use bindings::{ResourceBinding, ResourceBindingMap, ResourceInfo, ResourceType};
pub use error::CodegenError;
pub use task::{
    Dispatch, KernelParams, KernelSignature, MemberSlot, RangeHint, StageLayout, StageMember,
    TaskParams,
};

use crate::config::CodegenConfig;
use crate::ir::module::IrModule;
use crate::ir::offload::{partition, OffloadKind};

/// Compile a whole module into its dispatch sequence.
///
/// Offloads are generated in parallel except fragment stages, which start
/// from the bindings of the closest preceding vertex stage and read its
/// outputs. The first
/// failing offload, in dispatch order, is reported.
pub fn compile_kernel(
    module: &IrModule,
    signature: KernelSignature,
    config: &CodegenConfig,
) -> Result<KernelParams, CodegenError> {
    let offloads = partition(module)?;

    let mut results: Vec<Option<Result<TaskParams, CodegenError>>> = offloads
        .par_iter()
        .map(|offload| match offload.kind {
            OffloadKind::FragmentFor => None,
            _ => Some(wgsl::generate(module, offload, signature, config, None)),
        })
        .collect();

    for (i, offload) in offloads.iter().enumerate() {
        if offload.kind != OffloadKind::FragmentFor {
            continue;
        }
        let previous = results[..i]
            .iter()
            .rev()
            .find_map(|r| match r {
                Some(Ok(task)) if task.kind == OffloadKind::VertexFor => Some(task),
                _ => None,
            });
        let task = wgsl::generate(module, offload, signature, config, previous);
        results[i] = Some(task);
    }

    let tasks = results
        .into_iter()
        .flatten()
        .collect::<Result<Vec<_>, _>>()?;
    for (i, task) in tasks.iter().enumerate() {
        info!(
            "task {}: {} shader {} ({} binding(s))",
            i,
            task.kind.name(),
            task.short_hash(),
            task.bindings.len()
        );
    }
    Ok(KernelParams {
        tasks,
        arg_bytes: signature.arg_bytes,
        ret_bytes: signature.ret_bytes,
    })
}
