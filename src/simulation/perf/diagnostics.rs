use wasm_bindgen::prelude::*;

use crate::systems::gpu::GpuDevice;

use super::{FluidCore, FluidSolver};

/// Read-only snapshot for the stats overlay (polled about once a second)
#[wasm_bindgen]
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    pub(super) fps: f64,
    pub(super) average_fps: f64,
    pub(super) quality_level: f64,
    pub(super) memory_bytes: f64,
    pub(super) peak_memory_bytes: f64,
    pub(super) live_resources: u32,
    pub(super) state_changes: u32,
    pub(super) draw_calls: u32,
    pub(super) particle_count: u32,
    pub(super) desired_particle_count: f64,
    pub(super) simulating: bool,
    pub(super) frame: f64,
    pub(super) restarts: u32,
}

pub(super) fn collect<S: FluidSolver, D: GpuDevice>(core: &FluidCore<S, D>) -> Diagnostics {
    let render = core.cache.stats();
    Diagnostics {
        fps: core.fps.fps(),
        average_fps: core.quality.current_fps(),
        quality_level: core.quality.quality_level(),
        memory_bytes: core.ledger.memory_usage() as f64,
        peak_memory_bytes: core.ledger.max_memory_usage() as f64,
        live_resources: core.ledger.live_count() as u32,
        state_changes: render.state_changes,
        draw_calls: render.draw_calls,
        particle_count: core.plan.as_ref().map(|p| p.particle_count).unwrap_or(0),
        desired_particle_count: core.desired_particle_count(),
        simulating: core.is_simulating(),
        frame: core.frame as f64,
        restarts: core.restart_count,
    }
}

#[wasm_bindgen]
impl Diagnostics {
    /// Frames counted over the last full second
    #[wasm_bindgen(getter)]
    pub fn fps(&self) -> f64 { self.fps }
    /// 1000 / rolling average frame time
    #[wasm_bindgen(getter)]
    pub fn average_fps(&self) -> f64 { self.average_fps }
    #[wasm_bindgen(getter)]
    pub fn quality_level(&self) -> f64 { self.quality_level }
    #[wasm_bindgen(getter)]
    pub fn memory_bytes(&self) -> f64 { self.memory_bytes }
    #[wasm_bindgen(getter)]
    pub fn peak_memory_bytes(&self) -> f64 { self.peak_memory_bytes }
    #[wasm_bindgen(getter)]
    pub fn memory_mb(&self) -> f64 { self.memory_bytes / (1024.0 * 1024.0) }
    #[wasm_bindgen(getter)]
    pub fn live_resources(&self) -> u32 { self.live_resources }
    #[wasm_bindgen(getter)]
    pub fn state_changes(&self) -> u32 { self.state_changes }
    #[wasm_bindgen(getter)]
    pub fn draw_calls(&self) -> u32 { self.draw_calls }
    #[wasm_bindgen(getter)]
    pub fn particle_count(&self) -> u32 { self.particle_count }
    #[wasm_bindgen(getter)]
    pub fn desired_particle_count(&self) -> f64 { self.desired_particle_count }
    #[wasm_bindgen(getter)]
    pub fn simulating(&self) -> bool { self.simulating }
    #[wasm_bindgen(getter)]
    pub fn frame(&self) -> f64 { self.frame }
    #[wasm_bindgen(getter)]
    pub fn restarts(&self) -> u32 { self.restarts }
}
