//! Per-run GPU allocations
//!
//! Every run owns the same set of ids. Starting again replaces the records
//! in the ledger instead of adding new ones, so live memory tracks the
//! current plan only.

use crate::systems::gpu::{BufferTarget, TexelType, TextureDesc, TextureFormat};
use crate::systems::gpu::ResourceSpec;
use crate::systems::sizing::SizingPlan;

pub const PARTICLE_POSITION: &str = "particle_position";
pub const PARTICLE_POSITION_TEMP: &str = "particle_position_temp";
pub const PARTICLE_VELOCITY: &str = "particle_velocity";
pub const GRID_VELOCITY: &str = "grid_velocity";
pub const GRID_WEIGHT: &str = "grid_weight";
pub const PARTICLE_VERTEX: &str = "particle_vertex";

/// Ledger specs for `plan`, state textures stored as `texel_type`
pub(super) fn run_resources(plan: &SizingPlan, texel_type: TexelType) -> Vec<ResourceSpec> {
    let particle = TextureDesc {
        width: plan.particles_per_row,
        height: plan.row_count,
        format: TextureFormat::Rgba,
        texel_type,
    };
    // Grid textures flatten the node lattice: (x, z) across, y down.
    let [res_x, res_y, res_z] = plan.grid_resolution;
    let grid = TextureDesc {
        width: (res_x + 1) * (res_z + 1),
        height: res_y + 1,
        format: TextureFormat::Rgba,
        texel_type,
    };
    // One texture coordinate pair per particle.
    let vertex_bytes = plan.particle_count as u64 * 2 * std::mem::size_of::<f32>() as u64;

    vec![
        ResourceSpec::texture(PARTICLE_POSITION, particle),
        ResourceSpec::texture(PARTICLE_POSITION_TEMP, particle),
        ResourceSpec::texture(PARTICLE_VELOCITY, particle),
        ResourceSpec::texture(GRID_VELOCITY, grid),
        ResourceSpec::texture(GRID_WEIGHT, grid),
        ResourceSpec::buffer(PARTICLE_VERTEX, BufferTarget::Array, vertex_bytes),
    ]
}
