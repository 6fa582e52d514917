use crate::core::pool::ObjectPool;
use crate::domain::config::SimulationConfig;
use crate::systems::gpu::{GpuDevice, RenderStateCache, ResourceLedger};
use crate::systems::quality::{Capabilities, QualityController};

use super::fps_counter::FpsCounter;
use super::volumes::load_next_preset;
use super::{CameraBounds, FluidCore, FluidSolver, LifecycleState};

/// Position buffers kept around: the live run plus one being rebuilt
const POSITION_POOL_SIZE: usize = 2;

pub(super) fn create_fluid_core<S: FluidSolver, D: GpuDevice>(
    config: SimulationConfig,
    solver: S,
    device: D,
) -> FluidCore<S, D> {
    let mut core = FluidCore {
        quality: QualityController::new(config.quality.clone()),
        config,
        volumes: Vec::new(),
        state: LifecycleState::Editing,
        camera: CameraBounds::EDITING,
        plan: None,

        solver,
        device,
        capabilities: Capabilities::all(),
        ledger: ResourceLedger::new(),
        cache: RenderStateCache::new(),

        position_pool: ObjectPool::new(Vec::new, |positions: &mut Vec<f32>| positions.clear(), POSITION_POOL_SIZE),
        positions: None,

        preset_index: 0,
        edited_since_preset: false,

        frame: 0,
        run_count: 0,
        restart_count: 0,
        fps: FpsCounter::new(),
    };
    // Open on the first built-in scene.
    load_next_preset(&mut core);
    core
}
