use crate::domain::config::{QualityPreset, SimulationConfig};
use crate::domain::error::EngineResult;
use crate::systems::gpu::GpuDevice;
use crate::systems::quality::{optimize, BaseSettings, Capabilities, OptimizedSettings};
use crate::systems::sizing::{desired_particle_count, grid_resolution};

use super::{FluidCore, FluidSolver};

/// Swap in a new config. The quality controller keeps its level, clamped
/// into the new bounds.
pub(super) fn set_config<S: FluidSolver, D: GpuDevice>(
    core: &mut FluidCore<S, D>,
    config: SimulationConfig,
) -> EngineResult<()> {
    config.validate()?;
    core.quality.set_params(config.quality.clone())?;
    core.config = config;
    Ok(())
}

pub(super) fn load_config_json<S: FluidSolver, D: GpuDevice>(core: &mut FluidCore<S, D>, json: &str) -> EngineResult<()> {
    let config = SimulationConfig::from_json(json)?;
    set_config(core, config)
}

pub(super) fn set_density<S: FluidSolver, D: GpuDevice>(core: &mut FluidCore<S, D>, density: f32) -> EngineResult<()> {
    core.config = core.config.with_density(density)?;
    Ok(())
}

pub(super) fn set_particles_per_cell<S: FluidSolver, D: GpuDevice>(
    core: &mut FluidCore<S, D>,
    particles_per_cell: u32,
) -> EngineResult<()> {
    core.config = core.config.with_particles_per_cell(particles_per_cell)?;
    Ok(())
}

pub(super) fn set_grid_size<S: FluidSolver, D: GpuDevice>(
    core: &mut FluidCore<S, D>,
    grid_size: [f32; 3],
) -> EngineResult<()> {
    core.config = core.config.with_grid_size(grid_size)?;
    Ok(())
}

pub(super) fn set_target_fps<S: FluidSolver, D: GpuDevice>(core: &mut FluidCore<S, D>, target_fps: f64) -> EngineResult<()> {
    let next = core.config.with_target_fps(target_fps)?;
    core.quality.set_target_fps(target_fps)?;
    core.config = next;
    Ok(())
}

pub(super) fn set_simulation_speed<S: FluidSolver, D: GpuDevice>(
    core: &mut FluidCore<S, D>,
    steps_per_second: f32,
) -> EngineResult<()> {
    core.config = core.config.with_simulation_speed(steps_per_second)?;
    Ok(())
}

/// Apply a tier; a running simulation is rebuilt with it. If that rebuild is
/// refused the previous config is restored.
pub(super) fn set_quality_preset<S: FluidSolver, D: GpuDevice>(
    core: &mut FluidCore<S, D>,
    preset: QualityPreset,
) -> EngineResult<()> {
    let next = core.config.with_preset(preset);
    let previous = std::mem::replace(&mut core.config, next);
    if core.is_simulating() {
        if let Err(e) = core.restart_in_place() {
            core.config = previous;
            return Err(e);
        }
    }
    console_log!("quality preset {:?}", preset);
    Ok(())
}

pub(super) fn set_capabilities<S: FluidSolver, D: GpuDevice>(core: &mut FluidCore<S, D>, capabilities: Capabilities) {
    let missing = capabilities.missing_required();
    if !missing.is_empty() {
        console_warn!("missing GPU features, degrading: {}", missing.join(", "));
    }
    core.capabilities = capabilities;
}

/// Full-quality reference for the settings bundle
pub(super) fn base_settings<S: FluidSolver, D: GpuDevice>(core: &FluidCore<S, D>) -> BaseSettings {
    let desired = desired_particle_count(&core.volumes, &core.config).unwrap_or(0.0);
    let mut base_particle_count = desired.ceil() as u32;
    if let Some(max) = core.config.max_particles {
        base_particle_count = base_particle_count.min(max);
    }
    BaseSettings {
        base_particle_count,
        base_grid_resolution: grid_resolution(&core.config, 1.0).unwrap_or([0; 3]),
    }
}

pub(super) fn optimized_settings<S: FluidSolver, D: GpuDevice>(core: &FluidCore<S, D>) -> OptimizedSettings {
    let mut quality = core.quality.settings();
    quality.render_scale *= core.config.render_scale as f64;
    quality.enable_advanced_effects &= core.config.advanced_effects_allowed;
    optimize(&base_settings(core), &quality, &core.capabilities)
}
