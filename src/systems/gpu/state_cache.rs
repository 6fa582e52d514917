//! Render State Cache
//!
//! Elides bind calls that would re-bind what is already bound. GPU state
//! persists across frames, so cached bindings do too; only the counters are
//! per reporting window (`reset_stats`).

use super::{BufferTarget, DrawMode, GpuDevice, GpuHandle, ProgramId, TextureTarget};

pub const MAX_TEXTURE_UNITS: usize = 16;
const BUFFER_TARGETS: usize = 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub state_changes: u32,
    pub draw_calls: u32,
}

/// Last-bound state per slot. `None` inside means "explicitly unbound",
/// the outer `Option` of the texture slots means "unknown".
#[derive(Clone, Copy, Debug, Default)]
struct BindingCache {
    program: Option<Option<ProgramId>>,
    textures: [Option<Option<GpuHandle>>; MAX_TEXTURE_UNITS],
    buffers: [Option<Option<GpuHandle>>; BUFFER_TARGETS],
}

#[derive(Default)]
pub struct RenderStateCache {
    bindings: BindingCache,
    stats: RenderStats,
}

impl RenderStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn use_program<D: GpuDevice + ?Sized>(&mut self, device: &mut D, program: Option<ProgramId>) -> bool {
        if self.bindings.program == Some(program) {
            return false;
        }
        device.use_program(program);
        self.bindings.program = Some(program);
        self.stats.state_changes += 1;
        true
    }

    /// Bind `texture` to `unit`. Units past the cached range are always issued.
    pub fn bind_texture<D: GpuDevice + ?Sized>(
        &mut self,
        device: &mut D,
        unit: u32,
        target: TextureTarget,
        texture: Option<GpuHandle>,
    ) -> bool {
        if let Some(slot) = self.bindings.textures.get_mut(unit as usize) {
            if *slot == Some(texture) {
                return false;
            }
            *slot = Some(texture);
        }
        device.bind_texture(unit, target, texture);
        self.stats.state_changes += 1;
        true
    }

    pub fn bind_buffer<D: GpuDevice + ?Sized>(
        &mut self,
        device: &mut D,
        target: BufferTarget,
        buffer: Option<GpuHandle>,
    ) -> bool {
        let slot = &mut self.bindings.buffers[target.slot()];
        if *slot == Some(buffer) {
            return false;
        }
        *slot = Some(buffer);
        device.bind_buffer(target, buffer);
        self.stats.state_changes += 1;
        true
    }

    /// Never elided
    pub fn draw_arrays<D: GpuDevice + ?Sized>(&mut self, device: &mut D, mode: DrawMode, first: u32, count: u32) {
        device.draw_arrays(mode, first, count);
        self.stats.draw_calls += 1;
    }

    /// Forget cached bindings of a released texture, so a recycled handle
    /// value is bound again instead of being elided
    pub fn forget_texture(&mut self, texture: GpuHandle) {
        for slot in self.bindings.textures.iter_mut() {
            if *slot == Some(Some(texture)) {
                *slot = None;
            }
        }
    }

    pub fn forget_buffer(&mut self, buffer: GpuHandle) {
        for slot in self.bindings.buffers.iter_mut() {
            if *slot == Some(Some(buffer)) {
                *slot = None;
            }
        }
    }

    /// Drop every cached binding (e.g. after context loss)
    pub fn invalidate(&mut self) {
        self.bindings = BindingCache::default();
    }

    pub fn reset_stats(&mut self) {
        self.stats = RenderStats::default();
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }
}
