use crate::domain::error::{EngineError, EngineResult};
use crate::systems::gpu::{GpuDevice, ResourceSpec};
use crate::systems::sizing::{compute_plan, generate_positions, SizingPlan, SizingScale};

use super::resources::run_resources;
use super::settings::optimized_settings;
use super::{CameraBounds, FluidCore, FluidSolver, LifecycleState, ParticleLayout};

/// Everything a run needs, computed without touching the core
struct PreparedRun {
    plan: SizingPlan,
    resources: Vec<ResourceSpec>,
}

fn prepare_run<S: FluidSolver, D: GpuDevice>(core: &FluidCore<S, D>) -> EngineResult<PreparedRun> {
    core.config.validate()?;
    let quality = core.quality.settings();
    let scale = SizingScale { particle_scale: quality.particle_scale, grid_scale: quality.grid_scale };
    let plan = compute_plan(&core.volumes, &core.config, scale)?;

    let texel_type = optimized_settings(core).texel_type;
    let resources = run_resources(&plan, texel_type);
    if let Some(budget) = core.config.gpu_memory_budget {
        let required = core.ledger.projected_usage(&resources);
        if required > budget {
            return Err(EngineError::MemoryBudgetExceeded { required, budget });
        }
    }
    Ok(PreparedRun { plan, resources })
}

/// Allocate, generate positions, hand the layout to the solver. Cannot fail.
fn commit_run<S: FluidSolver, D: GpuDevice>(core: &mut FluidCore<S, D>, run: PreparedRun) {
    for spec in &run.resources {
        // The device may hand the old handle value out again.
        if let Some(old) = core.ledger.handle(&spec.id) {
            if spec.kind.is_texture() {
                core.cache.forget_texture(old);
            } else {
                core.cache.forget_buffer(old);
            }
        }
        core.ledger.create(&mut core.device, spec);
    }

    if let Some(old) = core.positions.take() {
        core.position_pool.release(old);
    }
    let slot = core.position_pool.acquire();
    if let Some(buffer) = core.position_pool.get_mut(slot) {
        generate_positions(&core.volumes, &run.plan.allocations, core.config.seed, buffer);
    }
    core.positions = Some(slot);

    let plan = &run.plan;
    let layout = ParticleLayout {
        particles_per_row: plan.particles_per_row,
        row_count: plan.row_count,
        positions: core.position_pool.get(slot).map(|p| p.as_slice()).unwrap_or(&[]),
        grid_size: plan.grid_size,
        grid_resolution: plan.grid_resolution,
        particles_per_cell: plan.particles_per_cell,
        sphere_radius: plan.sphere_radius,
    };
    core.solver.reset(&layout);
    core.plan = Some(run.plan);
}

/// EDITING -> SIMULATING. While already simulating this restarts in place.
pub(super) fn start_simulation<S: FluidSolver, D: GpuDevice>(core: &mut FluidCore<S, D>) -> EngineResult<()> {
    if core.state == LifecycleState::Simulating {
        return restart_in_place(core);
    }

    let run = prepare_run(core).map_err(|e| {
        console_warn!("start refused: {}", e);
        e
    })?;
    commit_run(core, run);

    core.state = LifecycleState::Simulating;
    core.camera = CameraBounds::SIMULATING;
    core.run_count += 1;
    if let Some(plan) = &core.plan {
        console_log!(
            "simulation started: {} particles ({}x{}), grid {}x{}x{}, {:.1} MB GPU",
            plan.particle_count,
            plan.particles_per_row,
            plan.row_count,
            plan.grid_resolution[0],
            plan.grid_resolution[1],
            plan.grid_resolution[2],
            core.ledger.memory_info().current_mb
        );
    }
    Ok(())
}

/// SIMULATING -> EDITING. Always legal; ledger allocations stay live.
pub(super) fn stop_simulation<S: FluidSolver, D: GpuDevice>(core: &mut FluidCore<S, D>) {
    if core.state == LifecycleState::Editing {
        return;
    }
    core.solver.discard();
    core.plan = None;
    if let Some(slot) = core.positions.take() {
        core.position_pool.release(slot);
    }
    core.state = LifecycleState::Editing;
    core.camera = CameraBounds::EDITING;
    console_log!("simulation stopped");
}

/// Rebuild the run with the current config and quality, staying in SIMULATING
pub(super) fn restart_in_place<S: FluidSolver, D: GpuDevice>(core: &mut FluidCore<S, D>) -> EngineResult<()> {
    if core.state != LifecycleState::Simulating {
        return Err(EngineError::NotSimulating);
    }
    let run = prepare_run(core).map_err(|e| {
        console_warn!("restart refused, keeping current run: {}", e);
        e
    })?;
    core.solver.discard();
    commit_run(core, run);
    core.restart_count += 1;
    Ok(())
}

pub(super) fn toggle<S: FluidSolver, D: GpuDevice>(core: &mut FluidCore<S, D>) -> EngineResult<LifecycleState> {
    match core.state {
        LifecycleState::Editing => start_simulation(core)?,
        LifecycleState::Simulating => stop_simulation(core),
    }
    Ok(core.state)
}
