//! GPU execution of compiled kernels.
//!
//! Uses wgpu for cross-platform dispatch (Metal, Vulkan, DX12). Only
//! compute tasks (serial and range-for) are run here; render stages need
//! a surface and pipeline state the harness does not build.

use std::collections::HashMap;

use log::{debug, warn};
use wgpu::util::DeviceExt;

use crate::codegen::{Dispatch, KernelParams, ResourceType, TaskParams};
use crate::config::CodegenConfig;
use crate::demos::BufferSpec;

#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("no GPU adapter available")]
    NoAdapter,
    #[error("task {task} binds root buffer {buffer}, which was not provided")]
    UnknownBuffer { task: usize, buffer: u32 },
    #[error("task {task} binds a {kind:?} resource, which the harness cannot provide")]
    UnsupportedResource { task: usize, kind: ResourceType },
    #[error("buffer readback failed: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),
    #[error("buffer readback channel closed")]
    ChannelClosed,
}

/// Try to create a wgpu device and queue.
/// Returns None if no GPU adapter is available.
pub fn try_create_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))?;
    let (device, queue) = pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("lumen-gpu"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::Performance,
        },
        None,
    ))
    .ok()?;
    Some((device, queue))
}

/// Host-side inputs of one kernel launch.
pub struct LaunchInputs<'a> {
    pub buffers: &'a [BufferSpec],
    /// Argument words, written to the argument block in order.
    pub args: &'a [u32],
    /// Value stored at the RNG seed word before the first task.
    pub rand_seed: u32,
}

/// Contents of every buffer after the last task finished.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LaunchOutput {
    pub roots: Vec<(u32, Vec<u32>)>,
    pub rets: Vec<u32>,
}

/// Dispatches the compute tasks of a compiled kernel and reads back
/// root buffers and return words.
pub struct KernelRunner {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl KernelRunner {
    pub fn new() -> Result<Self, GpuError> {
        let (device, queue) = try_create_device().ok_or(GpuError::NoAdapter)?;
        Ok(Self { device, queue })
    }

    pub fn launch(
        &self,
        kernel: &KernelParams,
        inputs: &LaunchInputs,
        config: &CodegenConfig,
    ) -> Result<LaunchOutput, GpuError> {
        let roots: HashMap<u32, (wgpu::Buffer, u64)> = inputs
            .buffers
            .iter()
            .map(|spec| {
                let size = u64::from(spec.size_words.max(1)) * 4;
                let buf = self.storage_buffer(&format!("root_buffer_{}", spec.id), size);
                (spec.id, (buf, size))
            })
            .collect();

        let mut tmps = vec![0u32; config.global_tmps_words() as usize];
        tmps[config.rand_seed_word() as usize] = inputs.rand_seed;
        let tmps_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("global_tmps"),
            contents: bytemuck::cast_slice(&tmps),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let mut arg_words = vec![0u32; kernel.arg_bytes.div_ceil(4).max(1) as usize];
        for (slot, word) in arg_words.iter_mut().zip(inputs.args) {
            *slot = *word;
        }
        let args_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("args"),
            contents: bytemuck::cast_slice(&arg_words),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let rets_size = u64::from(kernel.ret_bytes.div_ceil(4).max(1)) * 4;
        let rets_buf = self.storage_buffer("rets", rets_size);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lumen_encoder"),
            });

        for (index, task) in kernel.tasks.iter().enumerate() {
            if !task.kind.is_compute() {
                warn!("skipping {} task {}", task.kind.name(), index);
                continue;
            }
            let Dispatch::Compute { num_workgroups, .. } = task.dispatch else {
                continue;
            };

            let mut entries = Vec::with_capacity(task.bindings.len());
            for b in &task.bindings {
                let buffer = match b.info.resource_type {
                    ResourceType::Root | ResourceType::RootAtomic => {
                        let id = b.info.resource_id.unwrap_or(0);
                        let (buf, _) = roots
                            .get(&id)
                            .ok_or(GpuError::UnknownBuffer {
                                task: index,
                                buffer: id,
                            })?;
                        buf
                    }
                    ResourceType::GlobalTmps | ResourceType::GlobalTmpsAtomic => &tmps_buf,
                    ResourceType::Args => &args_buf,
                    ResourceType::Rets => &rets_buf,
                    kind => return Err(GpuError::UnsupportedResource { task: index, kind }),
                };
                entries.push(wgpu::BindGroupEntry {
                    binding: b.binding,
                    resource: buffer.as_entire_binding(),
                });
            }

            let pipeline = self.pipeline(task);
            let bind_group = (!entries.is_empty()).then(|| {
                self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("lumen_bind_group"),
                    layout: &pipeline.get_bind_group_layout(0),
                    entries: &entries,
                })
            });

            debug!(
                "dispatching task {} ({}) over {} workgroup(s)",
                index,
                task.short_hash(),
                num_workgroups
            );
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("lumen_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&pipeline);
            if let Some(bind_group) = &bind_group {
                pass.set_bind_group(0, bind_group, &[]);
            }
            pass.dispatch_workgroups(num_workgroups, 1, 1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        let mut output = LaunchOutput::default();
        for spec in inputs.buffers {
            if let Some((buf, size)) = roots.get(&spec.id) {
                let words = self.read_back(buf, *size)?;
                output.roots.push((spec.id, words));
            }
        }
        let mut rets = self.read_back(&rets_buf, rets_size)?;
        rets.truncate(kernel.ret_bytes.div_ceil(4) as usize);
        output.rets = rets;
        Ok(output)
    }

    fn storage_buffer(&self, label: &str, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        })
    }

    fn pipeline(&self, task: &TaskParams) -> wgpu::ComputePipeline {
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(task.short_hash()),
                source: wgpu::ShaderSource::Wgsl(task.code.as_str().into()),
            });
        self.device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(task.short_hash()),
                layout: None,
                module: &module,
                entry_point: Some(task.entry_point.as_str()),
                compilation_options: Default::default(),
                cache: None,
            })
    }

    fn read_back(&self, buffer: &wgpu::Buffer, size: u64) -> Result<Vec<u32>, GpuError> {
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lumen_staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lumen_readback"),
            });
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv().map_err(|_| GpuError::ChannelClosed)??;

        let data = slice.get_mapped_range();
        let words: Vec<u32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging.unmap();
        Ok(words)
    }
}
