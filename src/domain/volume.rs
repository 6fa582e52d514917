use serde::{Deserialize, Serialize};

use crate::core::math::Vec3;
use crate::core::utils::random::next_unit_f32;
use crate::domain::error::{EngineError, EngineResult};

/// Axis-aligned box authored in the editor (world units)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    min: Vec3,
    max: Vec3,
}

impl Volume {
    /// Box from explicit corners; `min <= max` must hold on every axis
    pub fn new(min: Vec3, max: Vec3) -> EngineResult<Self> {
        let finite = min.to_array().iter().chain(max.to_array().iter()).all(|c| c.is_finite());
        if !finite || min.x > max.x || min.y > max.y || min.z > max.z {
            return Err(EngineError::InvalidVolume);
        }
        Ok(Self { min, max })
    }

    /// Box spanning two arbitrary corners (drag direction doesn't matter)
    pub fn from_corners(a: Vec3, b: Vec3) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    pub fn min(&self) -> Vec3 { self.min }

    pub fn max(&self) -> Vec3 { self.max }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Volume measure in world units cubed
    pub fn volume(&self) -> f64 {
        let e = self.extent();
        e.x as f64 * e.y as f64 * e.z as f64
    }

    /// Uniformly distributed point inside the box
    pub fn random_point(&self, rng_state: &mut u32) -> Vec3 {
        let t = Vec3::new(
            next_unit_f32(rng_state),
            next_unit_f32(rng_state),
            next_unit_f32(rng_state),
        );
        Vec3::lerp_per_axis(self.min, self.max, t)
    }

    pub(crate) fn validate(&self) -> EngineResult<()> {
        Self::new(self.min, self.max).map(|_| ())
    }
}
