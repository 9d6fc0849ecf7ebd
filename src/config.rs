use std::path::Path;

use crate::diagnostic::Diagnostic;
use crate::span::Span;

/// Codegen knobs. Every value has a built-in default; a config file only
/// needs to name what it changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodegenConfig {
    /// Invocations per workgroup for range-for dispatches.
    pub workgroup_size: u32,
    /// Upper bound on dispatched workgroups along x.
    pub max_workgroups: u32,
    /// Workgroups dispatched when the loop bound is only known on the GPU.
    pub dynamic_workgroups: u32,
    /// Size of the global-temporary buffer in bytes.
    pub global_tmps_bytes: u32,
    /// Byte offset of the RNG seed inside the global-temporary buffer.
    pub rand_seed_offset: u32,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            workgroup_size: 128,
            max_workgroups: 65535,
            dynamic_workgroups: 512,
            global_tmps_bytes: 65536,
            rand_seed_offset: 4096,
        }
    }
}

impl CodegenConfig {
    /// Workgroups needed to cover `n` iterations, at least one.
    pub fn workgroups_for(&self, n: u32) -> u32 {
        n.div_ceil(self.workgroup_size).clamp(1, self.max_workgroups)
    }

    /// Word index of the RNG seed.
    pub fn rand_seed_word(&self) -> u32 {
        self.rand_seed_offset / 4
    }

    pub fn global_tmps_words(&self) -> u32 {
        self.global_tmps_bytes / 4
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, Diagnostic> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Diagnostic::error(
                format!("cannot read codegen config '{}': {}", path.display(), e),
                Span::dummy(),
            )
        })?;
        Self::parse_toml(&content, path)
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self, Diagnostic> {
        let err =
            |msg: String| Diagnostic::error(format!("{}: {}", path.display(), msg), Span::dummy());
        let parse = |key: &str, value: &str| -> Result<u32, Diagnostic> {
            value
                .parse()
                .map_err(|_| err(format!("invalid {}: {}", key, value)))
        };

        let mut config = Self::default();
        let mut section = String::new();

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                section = trimmed[1..trimmed.len() - 1].trim().to_string();
                continue;
            }
            if let Some((key, value)) = trimmed.split_once('=') {
                let key = key.trim();
                let value = value.trim();
                match (section.as_str(), key) {
                    ("compute", "workgroup_size") => {
                        config.workgroup_size = parse("compute.workgroup_size", value)?;
                    }
                    ("compute", "max_workgroups") => {
                        config.max_workgroups = parse("compute.max_workgroups", value)?;
                    }
                    ("compute", "dynamic_workgroups") => {
                        config.dynamic_workgroups = parse("compute.dynamic_workgroups", value)?;
                    }
                    ("memory", "global_tmps_bytes") => {
                        config.global_tmps_bytes = parse("memory.global_tmps_bytes", value)?;
                    }
                    ("memory", "rand_seed_offset") => {
                        config.rand_seed_offset = parse("memory.rand_seed_offset", value)?;
                    }
                    _ => {}
                }
            }
        }

        if config.workgroup_size == 0 || config.workgroup_size > 256 {
            return Err(err(format!(
                "compute.workgroup_size must be in 1..=256, got {}",
                config.workgroup_size
            )));
        }
        if config.max_workgroups == 0 {
            return Err(err("compute.max_workgroups must be > 0".to_string()));
        }
        if config.dynamic_workgroups == 0 || config.dynamic_workgroups > config.max_workgroups {
            return Err(err(
                "compute.dynamic_workgroups must be in 1..=max_workgroups".to_string()
            ));
        }
        if config.global_tmps_bytes % 4 != 0 || config.rand_seed_offset % 4 != 0 {
            return Err(err("memory sizes and offsets must be multiples of 4".to_string()));
        }
        let seed_end = config.rand_seed_offset.checked_add(4);
        if seed_end.is_none_or(|end| end > config.global_tmps_bytes) {
            return Err(err(format!(
                "memory.rand_seed_offset {} lies outside the {}-byte global temporary buffer",
                config.rand_seed_offset, config.global_tmps_bytes
            ))
            .with_help("raise memory.global_tmps_bytes or lower the seed offset".to_string()));
        }
        Ok(config)
    }
}
