//! Sizing Model
//!
//! Maps authored volumes + density onto a particle count and a grid
//! resolution. The particle state lives in `particles_per_row`-wide textures,
//! so the count is rounded up to whole rows; the grid keeps a 2:1:1 ratio.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use serde::{Deserialize, Serialize};

use crate::core::utils::random::derive_seed;
use crate::domain::config::SimulationConfig;
use crate::domain::error::{EngineError, EngineResult};
use crate::domain::volume::Volume;

/// Quality multipliers applied on top of the authored configuration
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizingScale {
    pub particle_scale: f64,
    pub grid_scale: f64,
}

impl Default for SizingScale {
    fn default() -> Self {
        Self { particle_scale: 1.0, grid_scale: 1.0 }
    }
}

impl SizingScale {
    fn validate(&self) -> EngineResult<()> {
        if !(self.particle_scale > 0.0) || !self.particle_scale.is_finite() {
            return Err(EngineError::InvalidParameter { name: "particle_scale", value: self.particle_scale });
        }
        if !(self.grid_scale > 0.0) || !self.grid_scale.is_finite() {
            return Err(EngineError::InvalidParameter { name: "grid_scale", value: self.grid_scale });
        }
        Ok(())
    }
}

/// Layout of one simulation run. Immutable once handed to the solver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizingPlan {
    /// Always `particles_per_row * row_count`
    pub particle_count: u32,
    pub particles_per_row: u32,
    pub row_count: u32,
    pub grid_size: [f32; 3],
    /// `[2r, r, r]`
    pub grid_resolution: [u32; 3],
    pub particles_per_cell: u32,
    pub sphere_radius: f32,
    /// Real-valued target before row rounding
    pub desired_particle_count: f64,
    /// Particles emitted per volume, in volume order; sums to `particle_count`
    pub allocations: Vec<u32>,
}

impl SizingPlan {
    pub fn grid_cell_count(&self) -> u64 {
        self.grid_resolution.iter().map(|&r| r as u64).product()
    }

    /// Flat `[x, y, z, ...]` length the solver receives
    pub fn position_len(&self) -> usize {
        self.particle_count as usize * 3
    }
}

/// Grid resolution for `config`, with the Y axis scaled by `grid_scale`.
/// Refuses densities whose node lattice does not fit a texture row.
pub fn grid_resolution(config: &SimulationConfig, grid_scale: f64) -> EngineResult<[u32; 3]> {
    if !(config.density > 0.0) || !config.density.is_finite() {
        return Err(EngineError::InvalidDensity(config.density));
    }
    let grid_cells = config.grid_volume() * config.density as f64;
    let base_y = (grid_cells / 2.0).cbrt().ceil();
    let res_y = ((base_y * grid_scale).floor() as u32).max(1);
    let too_large = || EngineError::InvalidParameter { name: "density", value: config.density as f64 };

    let res_x = res_y.checked_mul(2).ok_or_else(too_large)?;
    // Grid textures are (resX + 1) * (resZ + 1) nodes wide.
    res_x
        .checked_add(1)
        .and_then(|w| w.checked_mul(res_y.checked_add(1)?))
        .ok_or_else(too_large)?;
    Ok([res_x, res_y, res_y])
}

fn total_volume(volumes: &[Volume]) -> EngineResult<f64> {
    if volumes.is_empty() {
        return Err(EngineError::NoVolumes);
    }
    let mut total = 0.0;
    for volume in volumes {
        volume.validate()?;
        total += volume.volume();
    }
    if !(total > 0.0) {
        return Err(EngineError::EmptyVolume);
    }
    Ok(total)
}

fn desired_for(total: f64, resolution: [u32; 3], config: &SimulationConfig) -> f64 {
    let cells: f64 = resolution.iter().map(|&r| r as f64).product();
    // Multiply before dividing so exact inputs stay exact.
    total * cells * config.particles_per_cell as f64 / config.grid_volume()
}

/// Theoretical particle count at full quality (no row rounding, no cap)
pub fn desired_particle_count(volumes: &[Volume], config: &SimulationConfig) -> EngineResult<f64> {
    let resolution = grid_resolution(config, 1.0)?;
    let total = total_volume(volumes)?;
    Ok(desired_for(total, resolution, config))
}

/// Split `particle_count` proportionally to `measures`. Every entry but the
/// last gets `floor(count * share)`; the last absorbs the remainder.
pub fn allocate_per_volume(particle_count: u32, measures: &[f64]) -> Vec<u32> {
    let total: f64 = measures.iter().sum();
    let mut allocations = Vec::with_capacity(measures.len());
    if measures.is_empty() {
        return allocations;
    }
    let mut remaining = particle_count;
    for &measure in &measures[..measures.len() - 1] {
        let share = if total > 0.0 { measure / total } else { 0.0 };
        let n = ((particle_count as f64 * share).floor() as u32).min(remaining);
        allocations.push(n);
        remaining -= n;
    }
    allocations.push(remaining);
    allocations
}

pub fn compute_plan(volumes: &[Volume], config: &SimulationConfig, scale: SizingScale) -> EngineResult<SizingPlan> {
    scale.validate()?;
    let total = total_volume(volumes)?;
    let full_resolution = grid_resolution(config, 1.0)?;
    let grid_resolution = grid_resolution(config, scale.grid_scale)?;
    let particles_per_row = config.particles_per_row;
    if particles_per_row == 0 {
        return Err(EngineError::InvalidParameter { name: "particles_per_row", value: 0.0 });
    }

    // The count scales with particle_scale alone; grid_scale only shapes the solver grid.
    let cap = config
        .max_particles
        .map(|max| (max / particles_per_row).max(1) as f64 * particles_per_row as f64);
    let mut desired = desired_for(total, full_resolution, config);
    if let Some(cap) = cap {
        desired = desired.min(cap);
    }
    desired *= scale.particle_scale;
    if let Some(cap) = cap {
        desired = desired.min(cap);
    }

    let too_many = || EngineError::InvalidParameter { name: "density", value: config.density as f64 };
    let rows = (desired / particles_per_row as f64).ceil().max(1.0);
    if rows > u32::MAX as f64 {
        return Err(too_many());
    }
    let row_count = rows as u32;
    let particle_count = particles_per_row.checked_mul(row_count).ok_or_else(too_many)?;
    (particle_count as usize).checked_mul(3).ok_or_else(too_many)?;

    let measures: Vec<f64> = volumes.iter().map(Volume::volume).collect();
    let allocations = allocate_per_volume(particle_count, &measures);

    Ok(SizingPlan {
        particle_count,
        particles_per_row,
        row_count,
        grid_size: config.grid_size,
        grid_resolution,
        particles_per_cell: config.particles_per_cell,
        sphere_radius: config.sphere_radius_factor / grid_resolution[0] as f32,
        desired_particle_count: desired,
        allocations,
    })
}

fn fill_volume(volume: &Volume, out: &mut [f32], mut rng_state: u32) {
    for point in out.chunks_exact_mut(3) {
        let p = volume.random_point(&mut rng_state);
        point[0] = p.x;
        point[1] = p.y;
        point[2] = p.z;
    }
}

/// Sample every volume's allocation into `out` as flat `[x, y, z, ...]`.
/// Each volume draws from its own stream so the parallel path is deterministic.
pub fn generate_positions(volumes: &[Volume], allocations: &[u32], seed: u32, out: &mut Vec<f32>) {
    let total: usize = allocations.iter().map(|&n| n as usize).sum();
    out.clear();
    out.resize(total * 3, 0.0);

    let mut jobs: Vec<(&Volume, &mut [f32], u32)> = Vec::with_capacity(volumes.len());
    let mut rest: &mut [f32] = out.as_mut_slice();
    for (i, (volume, &count)) in volumes.iter().zip(allocations).enumerate() {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(count as usize * 3);
        jobs.push((volume, head, derive_seed(seed, i as u32)));
        rest = tail;
    }

    #[cfg(feature = "parallel")]
    {
        jobs.into_par_iter().for_each(|(volume, slice, stream)| fill_volume(volume, slice, stream));
    }

    #[cfg(not(feature = "parallel"))]
    {
        for (volume, slice, stream) in jobs {
            fill_volume(volume, slice, stream);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::Vec3;

    fn aabb(min: [f32; 3], max: [f32; 3]) -> Volume {
        Volume::new(Vec3::from_array(min), Vec3::from_array(max)).unwrap()
    }

    #[test]
    fn default_grid_is_two_to_one_to_one() {
        let cfg = SimulationConfig::default();
        // 40*20*20*0.5 = 8000 cells, cbrt(4000) = 15.87 -> 16
        assert_eq!(grid_resolution(&cfg, 1.0).unwrap(), [32, 16, 16]);
        assert_eq!(grid_resolution(&cfg, 0.5).unwrap(), [16, 8, 8]);
        assert_eq!(grid_resolution(&cfg, 0.001).unwrap(), [2, 1, 1]);
    }

    #[test]
    fn allocations_follow_volume_share() {
        assert_eq!(allocate_per_volume(1000, &[100.0, 50.0, 50.0]), vec![500, 250, 250]);
        // Remainder lands on the last volume.
        assert_eq!(allocate_per_volume(1000, &[1.0, 1.0, 1.0]), vec![333, 333, 334]);
        assert_eq!(allocate_per_volume(7, &[5.0]), vec![7]);
    }

    #[test]
    fn single_full_row() {
        let cfg = SimulationConfig::default();
        // 100 / 16000 of 32*16*16 cells at 10 per cell = 512 exactly
        let plan = compute_plan(&[aabb([0.0; 3], [10.0, 10.0, 1.0])], &cfg, SizingScale::default()).unwrap();
        assert_eq!(plan.desired_particle_count, 512.0);
        assert_eq!(plan.row_count, 1);
        assert_eq!(plan.particle_count, 512);
        assert_eq!(plan.allocations, vec![512]);
    }

    #[test]
    fn rows_round_up_and_cover_desired() {
        let cfg = SimulationConfig::default();
        let plan = compute_plan(&[aabb([0.0; 3], [15.0, 20.0, 20.0])], &cfg, SizingScale::default()).unwrap();
        assert!(plan.particle_count as f64 >= plan.desired_particle_count);
        assert!(((plan.row_count - 1) * plan.particles_per_row) as f64 <= plan.desired_particle_count);
        assert_eq!(plan.particle_count, plan.particles_per_row * plan.row_count);
        assert_eq!(plan.allocations.iter().sum::<u32>(), plan.particle_count);
        assert!((plan.sphere_radius - 7.0 / 32.0).abs() < 1e-6);
    }

    #[test]
    fn cap_never_overshoots() {
        let cfg = SimulationConfig { max_particles: Some(5000), ..SimulationConfig::default() };
        let plan = compute_plan(&[aabb([0.0; 3], [40.0, 20.0, 20.0])], &cfg, SizingScale::default()).unwrap();
        assert_eq!(plan.particle_count, 4608);
        assert_eq!(plan.row_count, 9);
    }

    #[test]
    fn particle_scale_shrinks_count() {
        let cfg = SimulationConfig::default();
        let volumes = [aabb([0.0; 3], [40.0, 20.0, 20.0])];
        let full = compute_plan(&volumes, &cfg, SizingScale::default()).unwrap();
        let half = compute_plan(&volumes, &cfg, SizingScale { particle_scale: 0.5, grid_scale: 1.0 }).unwrap();
        assert_eq!(full.desired_particle_count, 81920.0);
        assert_eq!(half.desired_particle_count, 40960.0);
        assert_eq!(half.row_count, 80);
    }

    #[test]
    fn grid_scale_does_not_shrink_the_count() {
        let cfg = SimulationConfig::default();
        let volumes = [aabb([0.0; 3], [40.0, 20.0, 20.0])];
        let scaled = compute_plan(&volumes, &cfg, SizingScale { particle_scale: 0.5, grid_scale: 0.5 }).unwrap();
        assert_eq!(scaled.grid_resolution, [16, 8, 8]);
        assert_eq!(scaled.desired_particle_count, 40960.0);
        assert_eq!(scaled.particle_count, 40960);
        assert!((scaled.sphere_radius - 7.0 / 16.0).abs() < 1e-6);
    }

    #[test]
    fn cap_applies_before_quality_scale() {
        let cfg = SimulationConfig { max_particles: Some(5120), ..SimulationConfig::default() };
        let volumes = [aabb([0.0; 3], [40.0, 20.0, 20.0])];
        let plan = compute_plan(&volumes, &cfg, SizingScale { particle_scale: 0.5, grid_scale: 1.0 }).unwrap();
        assert_eq!(plan.particle_count, 2560);
        assert_eq!(plan.row_count, 5);
    }

    #[test]
    fn oversized_density_is_refused() {
        let volumes = [aabb([0.0; 3], [40.0, 20.0, 20.0])];
        for density in [1e5_f32, 1e30] {
            let cfg = SimulationConfig { density, ..SimulationConfig::default() };
            assert!(cfg.validate().is_ok());
            assert_eq!(
                compute_plan(&volumes, &cfg, SizingScale::default()),
                Err(EngineError::InvalidParameter { name: "density", value: density as f64 })
            );
        }
        let cfg = SimulationConfig { density: 1e30, ..SimulationConfig::default() };
        assert!(grid_resolution(&cfg, 1.0).is_err());
    }

    #[test]
    fn configuration_errors() {
        let cfg = SimulationConfig::default();
        assert_eq!(compute_plan(&[], &cfg, SizingScale::default()), Err(EngineError::NoVolumes));
        let flat = aabb([0.0; 3], [10.0, 0.0, 10.0]);
        assert_eq!(compute_plan(&[flat], &cfg, SizingScale::default()), Err(EngineError::EmptyVolume));
        let bad = SimulationConfig { density: 0.0, ..SimulationConfig::default() };
        let v = aabb([0.0; 3], [1.0; 3]);
        assert_eq!(compute_plan(&[v], &bad, SizingScale::default()), Err(EngineError::InvalidDensity(0.0)));
    }

    #[test]
    fn positions_are_deterministic_and_inside() {
        let volumes = [aabb([0.0; 3], [10.0, 20.0, 15.0]), aabb([30.0, 0.0, 5.0], [40.0, 20.0, 20.0])];
        let allocations = [300, 212];
        let mut a = Vec::new();
        let mut b = Vec::new();
        generate_positions(&volumes, &allocations, 42, &mut a);
        generate_positions(&volumes, &allocations, 42, &mut b);
        assert_eq!(a.len(), 512 * 3);
        assert_eq!(a, b);

        let second = &a[300 * 3..];
        for p in second.chunks_exact(3) {
            assert!(p[0] >= 30.0 && p[0] <= 40.0);
            assert!(p[2] >= 5.0 && p[2] <= 20.0);
        }
    }
}
