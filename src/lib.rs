//! Lumen: a statement-graph IR for data-parallel kernels and its WGSL
//! code generator.
//!
//! Build a module with [`ir::IrBuilder`], then hand it to
//! [`codegen::compile_kernel`] to get one WGSL shader per dispatch.

pub mod codegen;
pub mod config;
pub mod demos;
pub mod diagnostic;
pub mod gpu;
pub mod ir;
pub mod span;

pub use codegen::{compile_kernel, CodegenError, KernelParams, KernelSignature, TaskParams};
pub use config::CodegenConfig;
