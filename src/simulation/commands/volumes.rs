use crate::domain::error::EngineResult;
use crate::domain::presets::{preset_name, preset_volumes, PRESET_COUNT};
use crate::domain::volume::Volume;
use crate::systems::gpu::GpuDevice;
use crate::systems::sizing::desired_particle_count as sizing_desired;

use super::{FluidCore, FluidSolver};

pub(super) fn add_volume<S: FluidSolver, D: GpuDevice>(core: &mut FluidCore<S, D>, volume: Volume) -> EngineResult<()> {
    volume.validate()?;
    core.volumes.push(volume);
    core.edited_since_preset = true;
    Ok(())
}

/// Replace every volume at once; nothing changes if any of them is invalid
pub(super) fn set_volumes<S: FluidSolver, D: GpuDevice>(
    core: &mut FluidCore<S, D>,
    volumes: Vec<Volume>,
) -> EngineResult<()> {
    for volume in &volumes {
        volume.validate()?;
    }
    core.volumes = volumes;
    core.edited_since_preset = true;
    Ok(())
}

pub(super) fn clear_volumes<S: FluidSolver, D: GpuDevice>(core: &mut FluidCore<S, D>) {
    core.volumes.clear();
    core.edited_since_preset = true;
}

pub(super) fn load_next_preset<S: FluidSolver, D: GpuDevice>(core: &mut FluidCore<S, D>) -> &'static str {
    let index = core.preset_index;
    core.volumes = preset_volumes(index);
    core.preset_index = (index + 1) % PRESET_COUNT;
    core.edited_since_preset = false;
    preset_name(index)
}

pub(super) fn desired_particle_count<S: FluidSolver, D: GpuDevice>(core: &FluidCore<S, D>) -> f64 {
    sizing_desired(&core.volumes, &core.config).unwrap_or(0.0)
}
