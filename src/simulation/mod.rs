//! Fluid simulation core
//!
//! `FluidCore` owns the editing/simulating lifecycle and everything that is
//! sized per run: the plan, the particle positions handed to the solver, and
//! the GPU allocations recorded in the ledger. The solver and the device are
//! external; the core only drives them.
//!
//! Per frame, `tick` runs in a fixed order: quality update, restart in place
//! if the quality level moved, solver step, then draw submission.

use crate::core::pool::{ObjectPool, PoolSlot};
use crate::domain::config::{QualityPreset, SimulationConfig};
use crate::domain::error::EngineResult;
use crate::domain::volume::Volume;
use crate::systems::gpu::{GpuDevice, ResourceLedger, RenderStateCache};
use crate::systems::quality::{Capabilities, OptimizedSettings, QualityController, QualityUpdate};
use crate::systems::sizing::SizingPlan;

#[path = "perf/frame_clock.rs"]
mod frame_clock;
#[path = "perf/fps_counter.rs"]
mod fps_counter;
#[path = "perf/diagnostics.rs"]
mod diagnostics;
#[path = "init/init.rs"]
mod init;
#[path = "init/settings.rs"]
mod settings;
#[path = "lifecycle/lifecycle.rs"]
mod lifecycle;
#[path = "lifecycle/resources.rs"]
mod resources;
#[path = "commands/volumes.rs"]
mod volumes;
#[path = "render/render_context.rs"]
mod render_context;
#[path = "step/tick.rs"]
mod tick;
mod facade;

pub use diagnostics::Diagnostics;
pub use facade::{FluidEngine, LayoutSink};
pub use frame_clock::FrameClock;
pub use render_context::RenderContext;
pub use resources::{
    GRID_VELOCITY, GRID_WEIGHT, PARTICLE_POSITION, PARTICLE_POSITION_TEMP, PARTICLE_VELOCITY,
    PARTICLE_VERTEX,
};

use fps_counter::FpsCounter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Editing,
    Simulating,
}

/// Orbit camera elevation limits (radians)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraBounds {
    pub min_elevation: f32,
    pub max_elevation: f32,
}

impl CameraBounds {
    /// Editing looks at the volumes from slightly below as well
    pub const EDITING: CameraBounds = CameraBounds {
        min_elevation: -std::f32::consts::FRAC_PI_4,
        max_elevation: std::f32::consts::FRAC_PI_4,
    };

    pub const SIMULATING: CameraBounds = CameraBounds {
        min_elevation: 0.0,
        max_elevation: std::f32::consts::FRAC_PI_2,
    };

    pub fn clamp(&self, elevation: f32) -> f32 {
        elevation.clamp(self.min_elevation, self.max_elevation)
    }
}

/// Arguments of a solver reset, borrowed from the current plan
#[derive(Clone, Copy, Debug)]
pub struct ParticleLayout<'a> {
    pub particles_per_row: u32,
    pub row_count: u32,
    /// Flat `[x, y, z, ...]`, length `3 * particles_per_row * row_count`
    pub positions: &'a [f32],
    pub grid_size: [f32; 3],
    pub grid_resolution: [u32; 3],
    pub particles_per_cell: u32,
    pub sphere_radius: f32,
}

/// External numerical solver driven by the lifecycle
pub trait FluidSolver {
    /// Discard old per-run state and adopt `layout`
    fn reset(&mut self, layout: &ParticleLayout<'_>);

    fn step(&mut self, time_step: f32);

    /// Drop per-run state when the simulation stops
    fn discard(&mut self);

    /// Submit draws through the state cache
    fn draw(&mut self, _ctx: &mut RenderContext<'_>) {}
}

/// What one `tick` did
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    pub quality: QualityUpdate,
    pub restarted: bool,
    pub stepped: bool,
    pub state: LifecycleState,
}

pub struct FluidCore<S: FluidSolver, D: GpuDevice> {
    config: SimulationConfig,
    volumes: Vec<Volume>,
    state: LifecycleState,
    camera: CameraBounds,
    plan: Option<SizingPlan>,

    solver: S,
    device: D,
    capabilities: Capabilities,
    ledger: ResourceLedger,
    cache: RenderStateCache,
    quality: QualityController,

    position_pool: ObjectPool<Vec<f32>>,
    positions: Option<PoolSlot>,

    preset_index: usize,
    edited_since_preset: bool,

    // Counters
    frame: u64,
    run_count: u32,
    restart_count: u32,
    fps: FpsCounter,
}

impl<S: FluidSolver, D: GpuDevice> FluidCore<S, D> {
    pub fn new(solver: S, device: D) -> Self {
        init::create_fluid_core(SimulationConfig::default(), solver, device)
    }

    /// Core with a validated configuration
    pub fn with_config(config: SimulationConfig, solver: S, device: D) -> EngineResult<Self> {
        config.validate()?;
        Ok(init::create_fluid_core(config, solver, device))
    }

    pub fn state(&self) -> LifecycleState { self.state }

    pub fn is_simulating(&self) -> bool { self.state == LifecycleState::Simulating }

    pub fn camera_bounds(&self) -> CameraBounds { self.camera }

    pub fn config(&self) -> &SimulationConfig { &self.config }

    pub fn plan(&self) -> Option<&SizingPlan> { self.plan.as_ref() }

    pub fn solver(&self) -> &S { &self.solver }

    pub fn solver_mut(&mut self) -> &mut S { &mut self.solver }

    pub fn device(&self) -> &D { &self.device }

    pub fn device_mut(&mut self) -> &mut D { &mut self.device }

    pub fn ledger(&self) -> &ResourceLedger { &self.ledger }

    pub fn cache(&self) -> &RenderStateCache { &self.cache }

    pub fn quality(&self) -> &QualityController { &self.quality }

    pub fn capabilities(&self) -> Capabilities { self.capabilities }

    pub fn frame(&self) -> u64 { self.frame }

    pub fn run_count(&self) -> u32 { self.run_count }

    pub fn restart_count(&self) -> u32 { self.restart_count }

    /// Positions of the current run (empty while editing)
    pub fn positions(&self) -> &[f32] {
        self.positions
            .and_then(|slot| self.position_pool.get(slot))
            .map(|p| p.as_slice())
            .unwrap_or(&[])
    }

    // === Lifecycle ===

    pub fn start_simulation(&mut self) -> EngineResult<()> {
        lifecycle::start_simulation(self)
    }

    pub fn stop_simulation(&mut self) {
        lifecycle::stop_simulation(self);
    }

    pub fn restart_in_place(&mut self) -> EngineResult<()> {
        lifecycle::restart_in_place(self)
    }

    /// Start/stop button; returns the new state
    pub fn toggle(&mut self) -> EngineResult<LifecycleState> {
        lifecycle::toggle(self)
    }

    pub fn tick(&mut self, frame_time_ms: f64) -> TickReport {
        tick::tick(self, frame_time_ms)
    }

    // === Configuration ===

    pub fn set_config(&mut self, config: SimulationConfig) -> EngineResult<()> {
        settings::set_config(self, config)
    }

    pub fn load_config_json(&mut self, json: &str) -> EngineResult<()> {
        settings::load_config_json(self, json)
    }

    pub fn set_density(&mut self, density: f32) -> EngineResult<()> {
        settings::set_density(self, density)
    }

    pub fn set_particles_per_cell(&mut self, particles_per_cell: u32) -> EngineResult<()> {
        settings::set_particles_per_cell(self, particles_per_cell)
    }

    pub fn set_grid_size(&mut self, grid_size: [f32; 3]) -> EngineResult<()> {
        settings::set_grid_size(self, grid_size)
    }

    pub fn set_target_fps(&mut self, target_fps: f64) -> EngineResult<()> {
        settings::set_target_fps(self, target_fps)
    }

    pub fn set_simulation_speed(&mut self, steps_per_second: f32) -> EngineResult<()> {
        settings::set_simulation_speed(self, steps_per_second)
    }

    pub fn set_quality_preset(&mut self, preset: QualityPreset) -> EngineResult<()> {
        settings::set_quality_preset(self, preset)
    }

    pub fn set_capabilities(&mut self, capabilities: Capabilities) {
        settings::set_capabilities(self, capabilities);
    }

    pub fn optimized_settings(&self) -> OptimizedSettings {
        settings::optimized_settings(self)
    }

    // === Volumes ===

    pub fn volumes(&self) -> &[Volume] { &self.volumes }

    pub fn add_volume(&mut self, volume: Volume) -> EngineResult<()> {
        volumes::add_volume(self, volume)
    }

    pub fn set_volumes(&mut self, volumes: Vec<Volume>) -> EngineResult<()> {
        volumes::set_volumes(self, volumes)
    }

    pub fn clear_volumes(&mut self) {
        volumes::clear_volumes(self);
    }

    /// Replace the volumes with the next built-in scene; returns its name
    pub fn load_next_preset(&mut self) -> &'static str {
        volumes::load_next_preset(self)
    }

    pub fn edited_since_last_preset(&self) -> bool { self.edited_since_preset }

    /// Editing-mode particle readout (0 when nothing sensible is authored)
    pub fn desired_particle_count(&self) -> f64 {
        volumes::desired_particle_count(self)
    }

    // === Diagnostics ===

    pub fn diagnostics(&self) -> Diagnostics {
        diagnostics::collect(self)
    }

    /// Start a new reporting window for draw/state-change counters
    pub fn reset_render_stats(&mut self) {
        self.cache.reset_stats();
    }

    /// Forget cached GPU bindings (after the host lost and restored its context)
    pub fn invalidate_render_state(&mut self) {
        self.cache.invalidate();
    }

    /// Borrow the draw-side view used by the solver and the host renderer
    pub fn render_context(&mut self) -> RenderContext<'_> {
        RenderContext::new(&mut self.device, &mut self.cache, &self.ledger, self.plan.as_ref())
    }
}

#[cfg(test)]
#[path = "tests/tests.rs"]
mod tests;
