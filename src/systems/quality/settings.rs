//! Settings bundle handed to the sizing and resource layers

use serde::{Deserialize, Serialize};

use super::capabilities::Capabilities;
use super::controller::QualitySettings;
use crate::systems::gpu::TexelType;

/// Full-quality reference values the bundle scales down from
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaseSettings {
    pub base_particle_count: u32,
    pub base_grid_resolution: [u32; 3],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridResolution {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizedSettings {
    pub use_half_float: bool,
    pub use_instancing: bool,
    pub particle_count: u32,
    pub grid_resolution: GridResolution,
    pub render_scale: f64,
    pub enable_advanced_effects: bool,
    /// Storage type for particle/grid state textures
    pub texel_type: TexelType,
    /// False when a required GPU feature is missing
    pub supported: bool,
}

/// Preferred state texel type, falling back to whatever the device can store
pub fn preferred_texel_type(caps: &Capabilities, use_half_float: bool) -> TexelType {
    if use_half_float {
        TexelType::HalfFloat
    } else if caps.float_textures {
        TexelType::Float
    } else if caps.half_float_textures {
        TexelType::HalfFloat
    } else {
        TexelType::UnsignedByte
    }
}

pub fn optimize(base: &BaseSettings, quality: &QualitySettings, caps: &Capabilities) -> OptimizedSettings {
    let use_half_float = caps.half_float_textures && quality.enable_advanced_effects;
    let scale_axis = |v: u32| (v as f64 * quality.grid_scale).floor() as u32;
    OptimizedSettings {
        use_half_float,
        use_instancing: caps.instancing,
        particle_count: (base.base_particle_count as f64 * quality.particle_scale).floor() as u32,
        grid_resolution: GridResolution {
            x: scale_axis(base.base_grid_resolution[0]),
            y: scale_axis(base.base_grid_resolution[1]),
            z: scale_axis(base.base_grid_resolution[2]),
        },
        render_scale: quality.render_scale,
        enable_advanced_effects: quality.enable_advanced_effects,
        texel_type: preferred_texel_type(caps, use_half_float),
        supported: caps.missing_required().is_empty(),
    }
}
