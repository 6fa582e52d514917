use super::*;
use crate::core::math::Vec3;
use crate::domain::error::EngineError;
use crate::systems::gpu::{CommandQueue, DrawMode, GpuCommand, ProgramId, ResourceLedger, TexelType, TextureFormat};

#[derive(Default)]
struct RecordingSolver {
    resets: Vec<(u32, u32, usize, [u32; 3], f32)>,
    steps: u32,
    last_time_step: f32,
    discards: u32,
    draw_program: Option<ProgramId>,
}

impl FluidSolver for RecordingSolver {
    fn reset(&mut self, layout: &ParticleLayout<'_>) {
        self.resets.push((
            layout.particles_per_row,
            layout.row_count,
            layout.positions.len(),
            layout.grid_resolution,
            layout.sphere_radius,
        ));
    }

    fn step(&mut self, time_step: f32) {
        self.steps += 1;
        self.last_time_step = time_step;
    }

    fn discard(&mut self) {
        self.discards += 1;
    }

    fn draw(&mut self, ctx: &mut RenderContext<'_>) {
        if let Some(program) = self.draw_program {
            let count = ctx.plan().map(|p| p.particle_count).unwrap_or(0);
            ctx.use_program(Some(program));
            ctx.bind_resource_texture(0, PARTICLE_POSITION);
            ctx.draw_arrays(DrawMode::Points, 0, count);
        }
    }
}

type TestCore = FluidCore<RecordingSolver, CommandQueue>;

fn core() -> TestCore {
    FluidCore::new(RecordingSolver::default(), CommandQueue::new())
}

fn aabb(min: [f32; 3], max: [f32; 3]) -> Volume {
    Volume::new(Vec3::from_array(min), Vec3::from_array(max)).unwrap()
}

const TARGET_MS: f64 = 1000.0 / 60.0;

#[test]
fn opens_editing_on_first_preset() {
    let core = core();
    assert_eq!(core.state(), LifecycleState::Editing);
    assert_eq!(core.camera_bounds(), CameraBounds::EDITING);
    assert_eq!(core.volumes().len(), 1);
    assert!(!core.edited_since_last_preset());
    assert!(core.positions().is_empty());
    // Dam break: 15x20x20 of a 40x20x20 grid at 32x16x16 cells, 10 per cell
    assert_eq!(core.desired_particle_count(), 30720.0);
}

#[test]
fn start_builds_a_full_run() {
    let mut core = core();
    core.start_simulation().unwrap();

    assert!(core.is_simulating());
    assert_eq!(core.camera_bounds(), CameraBounds::SIMULATING);
    let plan = core.plan().unwrap().clone();
    assert_eq!(plan.particles_per_row, 512);
    assert_eq!(plan.row_count, 60);
    assert_eq!(plan.particle_count, plan.particles_per_row * plan.row_count);
    assert_eq!(core.positions().len(), plan.position_len());

    assert_eq!(core.solver().resets, vec![(512, 60, 30720 * 3, [32, 16, 16], 7.0 / 32.0)]);
    assert_eq!(core.run_count(), 1);
}

#[test]
fn start_allocates_per_run_resources() {
    let mut core = core();
    core.start_simulation().unwrap();

    let ledger = core.ledger();
    assert_eq!(ledger.live_count(), 6);
    let particle = ResourceLedger::calculate_memory(512, 60, TextureFormat::Rgba, TexelType::HalfFloat);
    let grid = ResourceLedger::calculate_memory(33 * 17, 17, TextureFormat::Rgba, TexelType::HalfFloat);
    let vertex = 30720 * 8;
    assert_eq!(ledger.memory_usage(), 3 * particle + 2 * grid + vertex);
    assert_eq!(ledger.memory_usage(), ledger.accounted_bytes());
    assert!(ledger.handle(GRID_WEIGHT).is_some());
    assert!(ledger.handle(PARTICLE_VERTEX).is_some());
}

#[test]
fn start_without_volumes_is_refused() {
    let mut core = core();
    core.clear_volumes();
    assert_eq!(core.start_simulation(), Err(EngineError::NoVolumes));
    assert_eq!(core.state(), LifecycleState::Editing);
    assert_eq!(core.camera_bounds(), CameraBounds::EDITING);
    assert!(core.solver().resets.is_empty());
    assert_eq!(core.ledger().live_count(), 0);
    assert!(core.device().is_empty());
}

#[test]
fn zero_total_volume_is_refused() {
    let mut core = core();
    core.set_volumes(vec![aabb([0.0; 3], [10.0, 0.0, 10.0])]).unwrap();
    assert_eq!(core.start_simulation(), Err(EngineError::EmptyVolume));
    assert_eq!(core.state(), LifecycleState::Editing);
    assert!(core.plan().is_none());
}

#[test]
fn invalid_density_leaves_config_untouched() {
    let mut core = core();
    assert_eq!(core.set_density(0.0), Err(EngineError::InvalidDensity(0.0)));
    assert_eq!(core.config().density, 0.5);
    core.set_density(1.0).unwrap();
    assert_eq!(core.config().density, 1.0);
}

#[test]
fn stop_discards_run_but_keeps_allocations() {
    let mut core = core();
    core.start_simulation().unwrap();
    let live = core.ledger().memory_usage();

    core.stop_simulation();
    assert_eq!(core.state(), LifecycleState::Editing);
    assert_eq!(core.camera_bounds(), CameraBounds::EDITING);
    assert!(core.plan().is_none());
    assert!(core.positions().is_empty());
    assert_eq!(core.solver().discards, 1);
    assert_eq!(core.ledger().memory_usage(), live);

    // Stopping again is harmless.
    core.stop_simulation();
    assert_eq!(core.solver().discards, 1);
}

#[test]
fn restart_requires_a_running_simulation() {
    let mut core = core();
    assert_eq!(core.restart_in_place(), Err(EngineError::NotSimulating));
    assert!(core.solver().resets.is_empty());
}

#[test]
fn restart_in_place_replaces_records() {
    let mut core = core();
    core.start_simulation().unwrap();
    let live = core.ledger().memory_usage();

    core.restart_in_place().unwrap();
    assert!(core.is_simulating());
    assert_eq!(core.solver().resets.len(), 2);
    assert_eq!(core.solver().discards, 1);
    assert_eq!(core.ledger().live_count(), 6);
    assert_eq!(core.ledger().memory_usage(), live);
    assert_eq!(core.restart_count(), 1);
    assert_eq!(core.positions().len(), 30720 * 3);
}

#[test]
fn restarting_a_larger_run_keeps_peak() {
    let mut core = core();
    core.start_simulation().unwrap();
    core.stop_simulation();
    core.set_volumes(vec![aabb([0.0; 3], [5.0, 5.0, 5.0])]).unwrap();
    core.start_simulation().unwrap();
    let ledger = core.ledger();
    assert!(ledger.memory_usage() < ledger.max_memory_usage());
    assert_eq!(ledger.memory_usage(), ledger.accounted_bytes());
}

#[test]
fn memory_budget_refuses_start() {
    let mut core = core();
    let config = SimulationConfig { gpu_memory_budget: Some(1024), ..SimulationConfig::default() };
    core.set_config(config).unwrap();

    match core.start_simulation() {
        Err(EngineError::MemoryBudgetExceeded { required, budget }) => {
            assert_eq!(budget, 1024);
            assert!(required > budget);
        }
        other => panic!("expected budget error, got {:?}", other),
    }
    assert_eq!(core.state(), LifecycleState::Editing);
    assert_eq!(core.ledger().live_count(), 0);
}

#[test]
fn refused_restart_keeps_current_run() {
    let mut core = core();
    core.start_simulation().unwrap();
    let plan = core.plan().cloned();

    core.clear_volumes();
    assert_eq!(core.restart_in_place(), Err(EngineError::NoVolumes));
    assert!(core.is_simulating());
    assert_eq!(core.plan().cloned(), plan);
    assert_eq!(core.solver().discards, 0);
}

#[test]
fn tick_steps_only_while_simulating() {
    let mut core = core();
    let report = core.tick(TARGET_MS);
    assert!(!report.stepped);
    assert_eq!(core.solver().steps, 0);

    core.start_simulation().unwrap();
    core.set_simulation_speed(30.0).unwrap();
    for _ in 0..5 {
        assert!(core.tick(TARGET_MS).stepped);
    }
    assert_eq!(core.solver().steps, 5);
    assert_eq!(core.solver().last_time_step, 1.0 / 30.0);
    assert_eq!(core.frame(), 5);
}

#[test]
fn slow_frames_rebuild_a_smaller_run() {
    let mut core = core();
    core.start_simulation().unwrap();
    let before = core.plan().unwrap().particle_count;

    for _ in 0..10 {
        assert!(!core.tick(2.0 * TARGET_MS).restarted);
    }
    let report = core.tick(2.0 * TARGET_MS);
    assert!(report.quality.changed());
    assert!(report.restarted);
    assert!(report.stepped);

    // q = 0.95: grid scale sqrt(0.95) drops resY to 15, count follows q alone
    let plan = core.plan().unwrap().clone();
    assert_eq!(plan.grid_resolution, [30, 15, 15]);
    assert!(plan.particle_count < before);
    assert!((plan.desired_particle_count - 30720.0 * 0.95).abs() < 1e-6);
    assert_eq!(plan.row_count, 57);
    assert_eq!(core.solver().resets.len(), 2);
}

#[test]
fn floor_quality_run_matches_settings_bundle() {
    let config = SimulationConfig { auto_restart_on_quality_change: false, ..SimulationConfig::default() };
    let mut core = FluidCore::with_config(config, RecordingSolver::default(), CommandQueue::new()).unwrap();
    core.set_volumes(vec![aabb([0.0; 3], [40.0, 20.0, 20.0])]).unwrap();
    core.start_simulation().unwrap();
    let full = core.plan().unwrap().particle_count;
    assert_eq!(full, 81920);

    for _ in 0..2000 {
        core.tick(100.0);
    }
    let min_quality = core.config().quality.min_quality;
    assert!((core.quality().quality_level() - min_quality).abs() < 1e-9);
    core.restart_in_place().unwrap();

    let plan = core.plan().unwrap();
    let bundle = core.optimized_settings().particle_count;
    // Row rounding adds at most one row on top of the bundle's floor.
    assert!(plan.particle_count >= bundle);
    assert!(plan.particle_count - bundle <= plan.particles_per_row);
    let ratio = plan.particle_count as f64 / full as f64;
    assert!((ratio - min_quality).abs() < 0.01, "ratio {}", ratio);
}

#[test]
fn oversized_density_is_refused_before_start() {
    let mut core = core();
    core.set_volumes(vec![aabb([0.0; 3], [40.0, 20.0, 20.0])]).unwrap();
    core.set_density(100_000.0).unwrap();
    assert!(matches!(
        core.start_simulation(),
        Err(EngineError::InvalidParameter { name: "density", .. })
    ));
    assert_eq!(core.state(), LifecycleState::Editing);
    assert_eq!(core.ledger().live_count(), 0);
    assert!(core.solver().resets.is_empty());
}

#[test]
fn auto_restart_can_be_disabled() {
    let config = SimulationConfig { auto_restart_on_quality_change: false, ..SimulationConfig::default() };
    let mut core = FluidCore::with_config(config, RecordingSolver::default(), CommandQueue::new()).unwrap();
    core.start_simulation().unwrap();
    for _ in 0..11 {
        assert!(!core.tick(2.0 * TARGET_MS).restarted);
    }
    assert!(core.quality().quality_level() < 1.0);
    assert_eq!(core.solver().resets.len(), 1);
}

#[test]
fn draws_go_through_the_state_cache() {
    let mut core = core();
    core.solver_mut().draw_program = Some(ProgramId(4));
    core.start_simulation().unwrap();
    core.device_mut().clear();

    for _ in 0..3 {
        core.tick(TARGET_MS);
    }
    let diag = core.diagnostics();
    assert_eq!(diag.draw_calls(), 3);
    // Program and texture bound once, redundant rebinds elided.
    assert_eq!(diag.state_changes(), 2);

    let draws = core
        .device()
        .commands()
        .into_iter()
        .filter(|c| matches!(c, GpuCommand::DrawArrays { count: 30720, .. }))
        .count();
    assert_eq!(draws, 3);

    core.reset_render_stats();
    assert_eq!(core.diagnostics().draw_calls(), 0);
}

#[test]
fn presets_cycle_and_track_edits() {
    let mut core = core();
    assert_eq!(core.load_next_preset(), "block drop");
    assert_eq!(core.volumes().len(), 2);
    assert_eq!(core.load_next_preset(), "double splash");
    assert_eq!(core.load_next_preset(), "dam break");
    assert!(!core.edited_since_last_preset());

    core.add_volume(aabb([20.0, 0.0, 0.0], [25.0, 5.0, 5.0])).unwrap();
    assert!(core.edited_since_last_preset());
    assert_eq!(core.volumes().len(), 2);
}

#[test]
fn quality_preset_restarts_running_simulation() {
    let mut core = core();
    core.start_simulation().unwrap();
    core.set_quality_preset(QualityPreset::Low).unwrap();

    assert_eq!(core.config().particles_per_cell, 5);
    assert_eq!(core.config().max_particles, Some(50_000));
    assert_eq!(core.solver().resets.len(), 2);
    assert_eq!(core.plan().unwrap().particle_count, 15360);
    assert!(!core.optimized_settings().enable_advanced_effects);
}

#[test]
fn quality_preset_while_editing_only_updates_config() {
    let mut core = core();
    core.set_quality_preset(QualityPreset::Ultra).unwrap();
    assert_eq!(core.config().particles_per_cell, 20);
    assert!(core.solver().resets.is_empty());
}

#[test]
fn toggle_flips_state() {
    let mut core = core();
    assert_eq!(core.toggle(), Ok(LifecycleState::Simulating));
    assert_eq!(core.toggle(), Ok(LifecycleState::Editing));
    core.clear_volumes();
    assert_eq!(core.toggle(), Err(EngineError::NoVolumes));
    assert_eq!(core.state(), LifecycleState::Editing);
}

#[test]
fn missing_gpu_features_degrade_texture_type() {
    let mut core = core();
    core.set_capabilities(Capabilities::default());
    let settings = core.optimized_settings();
    assert!(!settings.supported);
    assert_eq!(settings.texel_type, TexelType::UnsignedByte);

    core.start_simulation().unwrap();
    let record = core.ledger().record(PARTICLE_POSITION).unwrap();
    assert_eq!(record.byte_size, 512 * 60 * 4);
}

#[test]
fn positions_are_reproducible() {
    let mut a = core();
    let mut b = core();
    a.start_simulation().unwrap();
    b.start_simulation().unwrap();
    assert_eq!(a.positions(), b.positions());

    let v = &a.volumes()[0];
    for p in a.positions().chunks_exact(3) {
        assert!(p[0] >= v.min().x && p[0] <= v.max().x);
        assert!(p[1] >= v.min().y && p[1] <= v.max().y);
    }
}

#[test]
fn config_json_round_trips_through_core() {
    let mut core = core();
    core.load_config_json(r#"{"density": 0.25, "quality": {"target_fps": 30}}"#).unwrap();
    assert_eq!(core.config().density, 0.25);
    assert!((core.quality().params().target_frame_time_ms() - 1000.0 / 30.0).abs() < 1e-12);
    assert!(matches!(core.load_config_json("{"), Err(EngineError::Json(_))));
    assert_eq!(core.config().density, 0.25);
}

#[test]
fn layout_sink_tracks_generations() {
    let mut engine = FluidEngine::new();
    assert_eq!(engine.layout_generation(), 0);
    engine.start_simulation().unwrap();
    assert_eq!(engine.layout_generation(), 1);
    assert_eq!(engine.particle_count(), 30720);
    assert_eq!(engine.positions_len(), 30720 * 3);
    assert_eq!(engine.grid_resolution_x(), 32);
    assert!(engine.resource_handle(PARTICLE_POSITION) > 0);
    assert_eq!(engine.resource_handle("nope"), -1);

    engine.tick(TARGET_MS);
    assert_eq!(engine.core().solver().steps(), 1);
    engine.restart_in_place().unwrap();
    assert_eq!(engine.layout_generation(), 2);
    assert_eq!(engine.core().solver().steps(), 0);
    engine.stop_simulation();
    assert!(!engine.core().solver().is_active());
}

#[test]
fn handles_outside_i32_read_as_absent() {
    use super::facade::handle_to_js;
    use crate::systems::gpu::GpuHandle;
    assert_eq!(handle_to_js(Some(GpuHandle(7))), 7);
    assert_eq!(handle_to_js(Some(GpuHandle(i32::MAX as u32))), i32::MAX);
    assert_eq!(handle_to_js(Some(GpuHandle(i32::MAX as u32 + 1))), -1);
    assert_eq!(handle_to_js(None), -1);
}

#[test]
fn engine_config_json_reloads() {
    let mut engine = FluidEngine::new();
    engine.set_density(0.25).unwrap();
    let json = engine.config_json().unwrap();
    let mut other = FluidEngine::new();
    other.load_config_json(&json).unwrap();
    assert_eq!(other.core().config(), engine.core().config());
}

#[test]
fn engine_bind_calls_are_elided() {
    let mut engine = FluidEngine::new();
    engine.start_simulation().unwrap();
    engine.clear_commands();

    assert!(engine.use_program(3));
    assert!(!engine.use_program(3));
    let tex = engine.resource_handle(PARTICLE_VELOCITY);
    assert!(engine.bind_texture(1, 0, tex));
    assert!(!engine.bind_texture(1, 0, tex));
    assert!(engine.bind_texture(1, 0, -1));
    engine.draw_arrays(0, 0, 10);

    assert_eq!(engine.core().device().commands().len(), 4);
    let diag = engine.diagnostics();
    assert_eq!(diag.state_changes(), 3);
    assert_eq!(diag.draw_calls(), 1);
}
