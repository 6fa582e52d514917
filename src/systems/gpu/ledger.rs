//! GPU Resource Ledger
//!
//! Byte-accurate registry of every texture and buffer the core asks the
//! device to create. Records are keyed by a caller-chosen string id; creating
//! an id that already exists releases the old object first, and deleting an
//! absent id is a no-op. `memory_usage` always equals the sum of live record
//! sizes, and `max_memory_usage` is a high-water mark that never goes down.

use std::collections::HashMap;

use super::{BufferTarget, GpuDevice, GpuHandle, TexelType, TextureDesc, TextureFormat};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Texture(TextureDesc),
    Buffer { target: BufferTarget },
}

impl ResourceKind {
    pub fn is_texture(&self) -> bool {
        matches!(self, ResourceKind::Texture(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceRecord {
    pub id: String,
    pub kind: ResourceKind,
    pub byte_size: u64,
    pub handle: GpuHandle,
}

/// A resource to be created, used for budget projection before allocating
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceSpec {
    pub id: String,
    pub kind: ResourceKind,
    pub byte_size: u64,
}

impl ResourceSpec {
    pub fn texture(id: &str, desc: TextureDesc) -> Self {
        Self {
            id: id.to_string(),
            kind: ResourceKind::Texture(desc),
            byte_size: ResourceLedger::calculate_memory(desc.width, desc.height, desc.format, desc.texel_type),
        }
    }

    pub fn buffer(id: &str, target: BufferTarget, byte_size: u64) -> Self {
        Self { id: id.to_string(), kind: ResourceKind::Buffer { target }, byte_size }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MemoryInfo {
    pub current: u64,
    pub max: u64,
    pub current_mb: f64,
    pub max_mb: f64,
}

#[derive(Default)]
pub struct ResourceLedger {
    records: HashMap<String, ResourceRecord>,
    memory_usage: u64,
    max_memory_usage: u64,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes for a `width x height` texture: channels(format) * bytes(type) per texel.
    /// RGBA is 4 bytes per texel, doubled for half floats and quadrupled for floats.
    pub fn calculate_memory(width: u32, height: u32, format: TextureFormat, texel_type: TexelType) -> u64 {
        width as u64 * height as u64 * format.channels() * texel_type.bytes_per_channel()
    }

    pub fn create_texture<D: GpuDevice + ?Sized>(
        &mut self,
        device: &mut D,
        id: &str,
        width: u32,
        height: u32,
        format: TextureFormat,
        texel_type: TexelType,
    ) -> GpuHandle {
        let desc = TextureDesc { width, height, format, texel_type };
        self.create(device, &ResourceSpec::texture(id, desc))
    }

    pub fn create_buffer<D: GpuDevice + ?Sized>(
        &mut self,
        device: &mut D,
        id: &str,
        target: BufferTarget,
        byte_size: u64,
    ) -> GpuHandle {
        self.create(device, &ResourceSpec::buffer(id, target, byte_size))
    }

    /// Create (or replace) the resource described by `spec`
    pub fn create<D: GpuDevice + ?Sized>(&mut self, device: &mut D, spec: &ResourceSpec) -> GpuHandle {
        self.release(device, &spec.id);

        let handle = match spec.kind {
            ResourceKind::Texture(desc) => device.create_texture(&desc),
            ResourceKind::Buffer { target } => device.create_buffer(target, spec.byte_size),
        };
        self.records.insert(
            spec.id.clone(),
            ResourceRecord { id: spec.id.clone(), kind: spec.kind, byte_size: spec.byte_size, handle },
        );
        self.memory_usage += spec.byte_size;
        self.max_memory_usage = self.max_memory_usage.max(self.memory_usage);
        debug_assert_eq!(self.memory_usage, self.accounted_bytes());
        handle
    }

    /// Release a texture by id; absent ids and buffer ids are ignored
    pub fn delete_texture<D: GpuDevice + ?Sized>(&mut self, device: &mut D, id: &str) -> Option<GpuHandle> {
        match self.records.get(id) {
            Some(r) if r.kind.is_texture() => self.release(device, id),
            _ => None,
        }
    }

    /// Release a buffer by id; absent ids and texture ids are ignored
    pub fn delete_buffer<D: GpuDevice + ?Sized>(&mut self, device: &mut D, id: &str) -> Option<GpuHandle> {
        match self.records.get(id) {
            Some(r) if !r.kind.is_texture() => self.release(device, id),
            _ => None,
        }
    }

    /// Release whatever lives under `id`, returning the freed handle
    pub fn release<D: GpuDevice + ?Sized>(&mut self, device: &mut D, id: &str) -> Option<GpuHandle> {
        let record = self.records.remove(id)?;
        match record.kind {
            ResourceKind::Texture(_) => device.delete_texture(record.handle),
            ResourceKind::Buffer { .. } => device.delete_buffer(record.handle),
        }
        self.memory_usage -= record.byte_size;
        debug_assert_eq!(self.memory_usage, self.accounted_bytes());
        Some(record.handle)
    }

    /// Release every live record. The high-water mark is kept.
    pub fn release_all<D: GpuDevice + ?Sized>(&mut self, device: &mut D) -> Vec<GpuHandle> {
        let ids: Vec<String> = self.records.keys().cloned().collect();
        ids.iter().filter_map(|id| self.release(device, id)).collect()
    }

    /// Live bytes after creating/replacing every resource in `specs`, in
    /// order. A repeated id replaces its earlier spec, as `create` would.
    pub fn projected_usage(&self, specs: &[ResourceSpec]) -> u64 {
        let mut latest: HashMap<&str, u64> = HashMap::with_capacity(specs.len());
        for spec in specs {
            latest.insert(spec.id.as_str(), spec.byte_size);
        }
        let mut usage = self.memory_usage;
        for (id, bytes) in latest {
            if let Some(old) = self.records.get(id) {
                usage -= old.byte_size;
            }
            usage += bytes;
        }
        usage
    }

    pub fn handle(&self, id: &str) -> Option<GpuHandle> {
        self.records.get(id).map(|r| r.handle)
    }

    pub fn record(&self, id: &str) -> Option<&ResourceRecord> {
        self.records.get(id)
    }

    pub fn records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.records.values()
    }

    pub fn live_count(&self) -> usize {
        self.records.len()
    }

    pub fn memory_usage(&self) -> u64 {
        self.memory_usage
    }

    pub fn max_memory_usage(&self) -> u64 {
        self.max_memory_usage
    }

    pub fn memory_info(&self) -> MemoryInfo {
        const MB: f64 = 1024.0 * 1024.0;
        MemoryInfo {
            current: self.memory_usage,
            max: self.max_memory_usage,
            current_mb: self.memory_usage as f64 / MB,
            max_mb: self.max_memory_usage as f64 / MB,
        }
    }

    /// Sum of live record sizes (what `memory_usage` must equal)
    pub fn accounted_bytes(&self) -> u64 {
        self.records.values().map(|r| r.byte_size).sum()
    }
}
