use wasm_bindgen::prelude::*;

use crate::core::math::Vec3;
use crate::domain::config::QualityPreset;
use crate::domain::error::EngineError;
use crate::domain::volume::Volume;
use crate::systems::gpu::{BufferTarget, CommandQueue, DrawMode, GpuHandle, ProgramId, TextureTarget};
use crate::systems::quality::Capabilities;

use super::diagnostics::Diagnostics;
use super::frame_clock::FrameClock;
use super::{FluidCore, FluidSolver, LifecycleState, ParticleLayout};

/// Solver stand-in for the browser build. The FLIP solver runs in JS on the
/// GPU; this side only records the layout it must adopt and bumps
/// `generation` so the host knows to re-upload positions.
#[derive(Clone, Debug, Default)]
pub struct LayoutSink {
    generation: u32,
    particles_per_row: u32,
    row_count: u32,
    grid_size: [f32; 3],
    grid_resolution: [u32; 3],
    particles_per_cell: u32,
    sphere_radius: f32,
    steps: u64,
    simulated_seconds: f64,
    active: bool,
}

impl LayoutSink {
    pub fn generation(&self) -> u32 { self.generation }

    pub fn is_active(&self) -> bool { self.active }

    pub fn steps(&self) -> u64 { self.steps }

    pub fn simulated_seconds(&self) -> f64 { self.simulated_seconds }
}

impl FluidSolver for LayoutSink {
    fn reset(&mut self, layout: &ParticleLayout<'_>) {
        self.generation = self.generation.wrapping_add(1);
        self.particles_per_row = layout.particles_per_row;
        self.row_count = layout.row_count;
        self.grid_size = layout.grid_size;
        self.grid_resolution = layout.grid_resolution;
        self.particles_per_cell = layout.particles_per_cell;
        self.sphere_radius = layout.sphere_radius;
        self.steps = 0;
        self.simulated_seconds = 0.0;
        self.active = true;
    }

    fn step(&mut self, time_step: f32) {
        self.steps += 1;
        self.simulated_seconds += time_step as f64;
    }

    fn discard(&mut self) {
        self.active = false;
    }
}

fn js_err(e: EngineError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Negative ids mean "unbind"
fn opt_handle(id: i32) -> Option<GpuHandle> {
    u32::try_from(id).ok().map(GpuHandle)
}

/// Inverse of `opt_handle`; handles the i32 ABI cannot carry read as absent
pub(super) fn handle_to_js(handle: Option<GpuHandle>) -> i32 {
    match handle.map(|h| i32::try_from(h.0)) {
        Some(Ok(id)) => id,
        Some(Err(_)) => {
            console_warn!("GPU handle out of i32 range, reported as absent");
            -1
        }
        None => -1,
    }
}

fn texture_target(code: u32) -> TextureTarget {
    if code == 1 { TextureTarget::CubeMap } else { TextureTarget::Texture2D }
}

fn buffer_target(code: u32) -> BufferTarget {
    if code == 1 { BufferTarget::ElementArray } else { BufferTarget::Array }
}

fn draw_mode(code: u32) -> DrawMode {
    match code {
        1 => DrawMode::Lines,
        2 => DrawMode::Triangles,
        3 => DrawMode::TriangleStrip,
        _ => DrawMode::Points,
    }
}

#[wasm_bindgen]
pub struct FluidEngine {
    core: FluidCore<LayoutSink, CommandQueue>,
    clock: FrameClock,
}

impl Default for FluidEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FluidEngine {
    pub fn core(&self) -> &FluidCore<LayoutSink, CommandQueue> {
        &self.core
    }
}

#[wasm_bindgen]
impl FluidEngine {
    /// Engine with default settings, opened on the first preset scene
    #[wasm_bindgen(constructor)]
    pub fn new() -> FluidEngine {
        FluidEngine { core: FluidCore::new(LayoutSink::default(), CommandQueue::new()), clock: FrameClock::new() }
    }

    /// Engine from a (partial) JSON config
    pub fn from_config_json(json: &str) -> Result<FluidEngine, JsValue> {
        let mut engine = FluidEngine::new();
        engine.core.load_config_json(json).map_err(js_err)?;
        Ok(engine)
    }

    pub fn load_config_json(&mut self, json: &str) -> Result<(), JsValue> {
        self.core.load_config_json(json).map_err(js_err)
    }

    pub fn config_json(&self) -> Result<String, JsValue> {
        self.core.config().to_json().map_err(js_err)
    }

    /// Feed the extension list from `gl.getSupportedExtensions()`
    pub fn set_extensions(&mut self, extensions: &js_sys::Array) {
        let names: Vec<String> = extensions.iter().filter_map(|v| v.as_string()).collect();
        self.core.set_capabilities(Capabilities::from_extensions(names));
    }

    pub fn missing_features(&self) -> String {
        self.core.capabilities().missing_required().join(",")
    }

    // === Configuration ===

    pub fn set_density(&mut self, density: f32) -> Result<(), JsValue> {
        self.core.set_density(density).map_err(js_err)
    }

    pub fn set_particles_per_cell(&mut self, particles_per_cell: u32) -> Result<(), JsValue> {
        self.core.set_particles_per_cell(particles_per_cell).map_err(js_err)
    }

    pub fn set_grid_size(&mut self, width: f32, height: f32, depth: f32) -> Result<(), JsValue> {
        self.core.set_grid_size([width, height, depth]).map_err(js_err)
    }

    pub fn set_target_fps(&mut self, target_fps: f64) -> Result<(), JsValue> {
        self.core.set_target_fps(target_fps).map_err(js_err)
    }

    /// Solver steps per second (time step = 1 / fps)
    pub fn set_simulation_speed(&mut self, steps_per_second: f32) -> Result<(), JsValue> {
        self.core.set_simulation_speed(steps_per_second).map_err(js_err)
    }

    /// "LOW", "MEDIUM", "HIGH" or "ULTRA"
    pub fn set_quality_preset(&mut self, name: &str) -> Result<(), JsValue> {
        let preset = QualityPreset::from_name(name)
            .ok_or_else(|| JsValue::from_str(&format!("unknown quality preset: {}", name)))?;
        self.core.set_quality_preset(preset).map_err(js_err)
    }

    pub fn optimized_settings_json(&self) -> String {
        serde_json::to_string(&self.core.optimized_settings()).unwrap_or_default()
    }

    // === Volumes ===

    pub fn add_volume(
        &mut self,
        min_x: f32,
        min_y: f32,
        min_z: f32,
        max_x: f32,
        max_y: f32,
        max_z: f32,
    ) -> Result<(), JsValue> {
        let volume = Volume::new(Vec3::new(min_x, min_y, min_z), Vec3::new(max_x, max_y, max_z)).map_err(js_err)?;
        self.core.add_volume(volume).map_err(js_err)
    }

    /// Replace the volumes from a JSON array of `{min, max}` boxes
    pub fn set_volumes_json(&mut self, json: &str) -> Result<(), JsValue> {
        let volumes: Vec<Volume> = serde_json::from_str(json).map_err(|e| js_err(e.into()))?;
        self.core.set_volumes(volumes).map_err(js_err)
    }

    pub fn volumes_json(&self) -> String {
        serde_json::to_string(self.core.volumes()).unwrap_or_default()
    }

    pub fn clear_volumes(&mut self) {
        self.core.clear_volumes();
    }

    pub fn volume_count(&self) -> usize {
        self.core.volumes().len()
    }

    /// Load the next built-in scene; returns its name
    pub fn load_next_preset(&mut self) -> String {
        self.core.load_next_preset().to_string()
    }

    pub fn edited_since_last_preset(&self) -> bool {
        self.core.edited_since_last_preset()
    }

    pub fn desired_particle_count(&self) -> f64 {
        self.core.desired_particle_count()
    }

    // === Lifecycle ===

    pub fn start_simulation(&mut self) -> Result<(), JsValue> {
        self.core.start_simulation().map_err(js_err)
    }

    pub fn stop_simulation(&mut self) {
        self.core.stop_simulation();
    }

    pub fn restart_in_place(&mut self) -> Result<(), JsValue> {
        self.core.restart_in_place().map_err(js_err)
    }

    /// Start/stop button; returns whether the engine is now simulating
    pub fn toggle(&mut self) -> Result<bool, JsValue> {
        let state = self.core.toggle().map_err(js_err)?;
        Ok(state == LifecycleState::Simulating)
    }

    pub fn is_simulating(&self) -> bool {
        self.core.is_simulating()
    }

    /// Advance one frame with an explicit frame time; returns true if the
    /// run was rebuilt (positions must be re-uploaded)
    pub fn tick(&mut self, frame_time_ms: f64) -> bool {
        self.core.tick(frame_time_ms).restarted
    }

    /// Advance one frame timed by the engine's own clock
    pub fn frame(&mut self) -> bool {
        let elapsed = self.clock.tick();
        self.tick(elapsed)
    }

    pub fn quality_level(&self) -> f64 {
        self.core.quality().quality_level()
    }

    pub fn camera_min_elevation(&self) -> f32 {
        self.core.camera_bounds().min_elevation
    }

    pub fn camera_max_elevation(&self) -> f32 {
        self.core.camera_bounds().max_elevation
    }

    // === Layout of the current run ===

    /// Bumped on every solver reset
    pub fn layout_generation(&self) -> u32 {
        self.core.solver().generation()
    }

    /// Get pointer to the flat position array (for JS upload)
    pub fn positions_ptr(&self) -> *const f32 {
        self.core.positions().as_ptr()
    }

    pub fn positions_len(&self) -> usize {
        self.core.positions().len()
    }

    pub fn particle_count(&self) -> u32 {
        self.core.plan().map(|p| p.particle_count).unwrap_or(0)
    }

    pub fn particles_per_row(&self) -> u32 {
        self.core.solver().particles_per_row
    }

    pub fn row_count(&self) -> u32 {
        self.core.solver().row_count
    }

    pub fn grid_resolution_x(&self) -> u32 {
        self.core.solver().grid_resolution[0]
    }

    pub fn grid_resolution_y(&self) -> u32 {
        self.core.solver().grid_resolution[1]
    }

    pub fn grid_resolution_z(&self) -> u32 {
        self.core.solver().grid_resolution[2]
    }

    pub fn grid_width(&self) -> f32 {
        self.core.solver().grid_size[0]
    }

    pub fn grid_height(&self) -> f32 {
        self.core.solver().grid_size[1]
    }

    pub fn grid_depth(&self) -> f32 {
        self.core.solver().grid_size[2]
    }

    pub fn particles_per_cell(&self) -> u32 {
        self.core.solver().particles_per_cell
    }

    pub fn sphere_radius(&self) -> f32 {
        self.core.solver().sphere_radius
    }

    pub fn time_step(&self) -> f32 {
        self.core.config().time_step
    }

    // === GPU ===

    /// Ledger handle for a per-run resource id, -1 if absent
    pub fn resource_handle(&self, id: &str) -> i32 {
        handle_to_js(self.core.ledger().handle(id))
    }

    pub fn use_program(&mut self, program: i32) -> bool {
        let program = u32::try_from(program).ok().map(ProgramId);
        self.core.render_context().use_program(program)
    }

    pub fn bind_texture(&mut self, unit: u32, target: u32, texture: i32) -> bool {
        self.core.render_context().bind_texture(unit, texture_target(target), opt_handle(texture))
    }

    pub fn bind_buffer(&mut self, target: u32, buffer: i32) -> bool {
        self.core.render_context().bind_buffer(buffer_target(target), opt_handle(buffer))
    }

    pub fn draw_arrays(&mut self, mode: u32, first: u32, count: u32) {
        self.core.render_context().draw_arrays(draw_mode(mode), first, count);
    }

    /// Call after the WebGL context was restored
    pub fn invalidate_render_state(&mut self) {
        self.core.invalidate_render_state();
    }

    /// Get pointer to the recorded command words (for JS replay)
    pub fn commands_ptr(&self) -> *const u32 {
        self.core.device().ptr()
    }

    pub fn commands_len(&self) -> usize {
        self.core.device().len()
    }

    /// Drop the recorded words once the host has replayed them
    pub fn clear_commands(&mut self) {
        self.core.device_mut().clear();
    }

    // === Diagnostics ===

    pub fn diagnostics(&self) -> Diagnostics {
        self.core.diagnostics()
    }

    pub fn reset_render_stats(&mut self) {
        self.core.reset_render_stats();
    }

    pub fn memory_usage(&self) -> f64 {
        self.core.ledger().memory_usage() as f64
    }

    pub fn max_memory_usage(&self) -> f64 {
        self.core.ledger().max_memory_usage() as f64
    }
}
