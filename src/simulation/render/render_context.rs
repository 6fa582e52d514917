use crate::systems::gpu::{
    BufferTarget, DrawMode, GpuDevice, GpuHandle, ProgramId, RenderStateCache, ResourceLedger, TextureTarget,
};
use crate::systems::sizing::SizingPlan;

/// Draw-side view of the core: every bind goes through the state cache,
/// resources are looked up by their ledger id.
pub struct RenderContext<'a> {
    device: &'a mut dyn GpuDevice,
    cache: &'a mut RenderStateCache,
    ledger: &'a ResourceLedger,
    plan: Option<&'a SizingPlan>,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(
        device: &'a mut dyn GpuDevice,
        cache: &'a mut RenderStateCache,
        ledger: &'a ResourceLedger,
        plan: Option<&'a SizingPlan>,
    ) -> Self {
        Self { device, cache, ledger, plan }
    }

    /// Plan of the current run, `None` while editing
    pub fn plan(&self) -> Option<&SizingPlan> {
        self.plan
    }

    pub fn resource(&self, id: &str) -> Option<GpuHandle> {
        self.ledger.handle(id)
    }

    pub fn use_program(&mut self, program: Option<ProgramId>) -> bool {
        self.cache.use_program(&mut *self.device, program)
    }

    pub fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: Option<GpuHandle>) -> bool {
        self.cache.bind_texture(&mut *self.device, unit, target, texture)
    }

    /// Bind a ledger texture by id; unknown ids unbind the unit
    pub fn bind_resource_texture(&mut self, unit: u32, id: &str) -> bool {
        let texture = self.ledger.handle(id);
        self.cache.bind_texture(&mut *self.device, unit, TextureTarget::Texture2D, texture)
    }

    pub fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<GpuHandle>) -> bool {
        self.cache.bind_buffer(&mut *self.device, target, buffer)
    }

    pub fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) {
        self.cache.draw_arrays(&mut *self.device, mode, first, count);
    }
}
