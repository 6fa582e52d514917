//! Built-in starting scenes, authored for the default 40x20x20 grid

use crate::core::math::Vec3;
use crate::domain::volume::Volume;

pub const PRESET_COUNT: usize = 3;

const PRESET_NAMES: [&str; PRESET_COUNT] = ["dam break", "block drop", "double splash"];

fn aabb(min: [f32; 3], max: [f32; 3]) -> Volume {
    Volume::from_corners(Vec3::from_array(min), Vec3::from_array(max))
}

/// Volumes of preset `index` (wraps around)
pub fn preset_volumes(index: usize) -> Vec<Volume> {
    match index % PRESET_COUNT {
        0 => vec![aabb([0.0, 0.0, 0.0], [15.0, 20.0, 20.0])],
        1 => vec![
            aabb([0.0, 0.0, 0.0], [40.0, 7.0, 20.0]),
            aabb([12.0, 12.0, 5.0], [28.0, 20.0, 15.0]),
        ],
        _ => vec![
            aabb([0.0, 0.0, 0.0], [10.0, 20.0, 15.0]),
            aabb([30.0, 0.0, 5.0], [40.0, 20.0, 20.0]),
        ],
    }
}

pub fn preset_name(index: usize) -> &'static str {
    PRESET_NAMES[index % PRESET_COUNT]
}
