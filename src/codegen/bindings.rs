//! Resource descriptors and the per-offload binding allocator.
//!
//! The allocator only records and deduplicates; the codegen walk decides
//! slot numbers (next free slot at first use). A fragment stage starts
//! from the bindings of its vertex stage so shared resources keep their
//! slots across the pair.

use std::collections::HashMap;

use serde::Serialize;

/// Category of a shader-visible resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// A root buffer viewed as plain 32-bit words.
    Root,
    /// The same root buffer viewed as atomic words.
    RootAtomic,
    GlobalTmps,
    GlobalTmpsAtomic,
    Args,
    Rets,
    Texture,
    StorageTexture,
    Sampler,
}

/// Identity of one resource: its category plus the owning buffer or
/// texture id where the category has several instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceInfo {
    pub resource_type: ResourceType,
    pub resource_id: Option<u32>,
}

impl ResourceInfo {
    pub fn new(resource_type: ResourceType, resource_id: Option<u32>) -> Self {
        Self {
            resource_type,
            resource_id,
        }
    }

    pub fn root(buffer: u32) -> Self {
        Self::new(ResourceType::Root, Some(buffer))
    }

    pub fn root_atomic(buffer: u32) -> Self {
        Self::new(ResourceType::RootAtomic, Some(buffer))
    }

    pub fn global_tmps() -> Self {
        Self::new(ResourceType::GlobalTmps, None)
    }

    pub fn global_tmps_atomic() -> Self {
        Self::new(ResourceType::GlobalTmpsAtomic, None)
    }

    pub fn args() -> Self {
        Self::new(ResourceType::Args, None)
    }

    pub fn rets() -> Self {
        Self::new(ResourceType::Rets, None)
    }

    pub fn texture(id: u32) -> Self {
        Self::new(ResourceType::Texture, Some(id))
    }

    pub fn storage_texture(id: u32) -> Self {
        Self::new(ResourceType::StorageTexture, Some(id))
    }

    pub fn sampler(id: u32) -> Self {
        Self::new(ResourceType::Sampler, Some(id))
    }

    /// Shader identifier of the resource. Unique per identity.
    pub fn name(&self) -> String {
        let id = self.resource_id.unwrap_or(0);
        match self.resource_type {
            ResourceType::Root => format!("root_buffer_{}_", id),
            ResourceType::RootAtomic => format!("root_buffer_atomic_{}_", id),
            ResourceType::GlobalTmps => "global_tmps_".to_string(),
            ResourceType::GlobalTmpsAtomic => "global_tmps_atomic_".to_string(),
            ResourceType::Args => "args_".to_string(),
            ResourceType::Rets => "rets_".to_string(),
            ResourceType::Texture => format!("texture_{}_", id),
            ResourceType::StorageTexture => format!("storage_texture_{}_", id),
            ResourceType::Sampler => format!("sampler_{}_", id),
        }
    }
}

/// A resource attached at a binding slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceBinding {
    pub info: ResourceInfo,
    pub binding: u32,
}

/// Resource → slot map for one offload or vertex/fragment pair.
#[derive(Clone, Debug, Default)]
pub struct ResourceBindingMap {
    bindings: Vec<ResourceBinding>,
    slots: HashMap<ResourceInfo, u32>,
}

impl ResourceBindingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the bindings of an earlier stage.
    pub fn seeded(previous: &[ResourceBinding]) -> Self {
        let mut map = Self::new();
        for b in previous {
            map.add(b.info, b.binding);
        }
        map
    }

    pub fn has(&self, info: &ResourceInfo) -> bool {
        self.slots.contains_key(info)
    }

    /// Record `info` at `binding`. Both the resource and the slot must be
    /// new to this map.
    pub fn add(&mut self, info: ResourceInfo, binding: u32) {
        assert!(!self.has(&info), "{} is already bound", info.name());
        assert!(
            self.bindings.iter().all(|b| b.binding != binding),
            "binding slot {} is already taken",
            binding
        );
        self.slots.insert(info, binding);
        self.bindings.push(ResourceBinding { info, binding });
    }

    pub fn get(&self, info: &ResourceInfo) -> Option<u32> {
        self.slots.get(info).copied()
    }

    /// Lowest slot above every slot in use.
    pub fn next_slot(&self) -> u32 {
        self.bindings
            .iter()
            .map(|b| b.binding + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceBinding> {
        self.bindings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_use_slots() {
        let mut map = ResourceBindingMap::new();
        for info in [ResourceInfo::root(3), ResourceInfo::root(1), ResourceInfo::args()] {
            if !map.has(&info) {
                map.add(info, map.next_slot());
            }
        }
        assert_eq!(map.get(&ResourceInfo::root(3)), Some(0));
        assert_eq!(map.get(&ResourceInfo::root(1)), Some(1));
        assert_eq!(map.get(&ResourceInfo::args()), Some(2));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_seeded_map_continues_after_previous() {
        let previous = [
            ResourceBinding {
                info: ResourceInfo::root(0),
                binding: 0,
            },
            ResourceBinding {
                info: ResourceInfo::global_tmps(),
                binding: 1,
            },
        ];
        let map = ResourceBindingMap::seeded(&previous);
        assert!(map.has(&ResourceInfo::root(0)));
        assert!(!map.has(&ResourceInfo::root_atomic(0)));
        assert_eq!(map.next_slot(), 2);
    }

    #[test]
    #[should_panic(expected = "already taken")]
    fn test_duplicate_slot_panics() {
        let mut map = ResourceBindingMap::new();
        map.add(ResourceInfo::root(0), 0);
        map.add(ResourceInfo::root(1), 0);
    }

    #[test]
    fn test_names_are_distinct() {
        let infos = [
            ResourceInfo::root(0),
            ResourceInfo::root_atomic(0),
            ResourceInfo::global_tmps(),
            ResourceInfo::global_tmps_atomic(),
            ResourceInfo::args(),
            ResourceInfo::rets(),
            ResourceInfo::texture(0),
            ResourceInfo::storage_texture(0),
            ResourceInfo::sampler(0),
        ];
        let names: std::collections::HashSet<String> = infos.iter().map(|i| i.name()).collect();
        assert_eq!(names.len(), infos.len());
    }
}
