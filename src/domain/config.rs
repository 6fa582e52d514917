//! Simulation tunables
//!
//! `SimulationConfig` is an immutable value: every `with_*` builder validates
//! and returns a fresh copy, and the engine swaps the whole value in. Nothing
//! here is process-global.

use serde::{Deserialize, Serialize};

use crate::domain::error::{EngineError, EngineResult};

/// When the quality controller fires repeated decrements under sustained load
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeCadence {
    /// Once each time the unstable counter crosses another multiple of
    /// `degrade_threshold + 1` (frames 11, 22, 33, ... with the defaults)
    PerCrossing,
    /// Every frame once the unstable counter is past the threshold
    EveryFrame,
}

/// Adaptive quality controller parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityParams {
    pub target_fps: f64,
    pub min_quality: f64,
    pub max_quality: f64,
    /// Decrease step; increases use half of it
    pub adjustment_step: f64,
    /// Ring buffer length for frame time averaging
    pub history_len: usize,
    /// Consecutive slow frames tolerated before degrading
    pub degrade_threshold: u32,
    /// Consecutive fast frames required before recovering
    pub recover_threshold: u32,
    /// `target / avg` below this counts as a slow frame
    pub slow_ratio: f64,
    /// `target / avg` above this counts as headroom
    pub headroom_ratio: f64,
    pub cadence: DegradeCadence,
}

impl Default for QualityParams {
    fn default() -> Self {
        Self {
            target_fps: 60.0,
            min_quality: 0.3,
            max_quality: 1.0,
            adjustment_step: 0.05,
            history_len: 60,
            degrade_threshold: 10,
            recover_threshold: 30,
            slow_ratio: 0.9,
            headroom_ratio: 1.2,
            cadence: DegradeCadence::PerCrossing,
        }
    }
}

impl QualityParams {
    pub fn target_frame_time_ms(&self) -> f64 {
        1000.0 / self.target_fps
    }

    pub fn validate(&self) -> EngineResult<()> {
        positive("target_fps", self.target_fps)?;
        positive("min_quality", self.min_quality)?;
        positive("adjustment_step", self.adjustment_step)?;
        if !(self.max_quality >= self.min_quality) || !self.max_quality.is_finite() {
            return Err(EngineError::InvalidParameter { name: "max_quality", value: self.max_quality });
        }
        if self.history_len == 0 {
            return Err(EngineError::InvalidParameter { name: "history_len", value: 0.0 });
        }
        positive("slow_ratio", self.slow_ratio)?;
        if !(self.headroom_ratio > self.slow_ratio) || !self.headroom_ratio.is_finite() {
            return Err(EngineError::InvalidParameter { name: "headroom_ratio", value: self.headroom_ratio });
        }
        Ok(())
    }
}

/// Coarse quality tiers selectable from the UI
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityPreset {
    Low,
    Medium,
    High,
    Ultra,
}

impl QualityPreset {
    /// Case-insensitive lookup ("low", "MEDIUM", ...)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "ULTRA" => Some(Self::Ultra),
            _ => None,
        }
    }

    pub fn particles_per_cell(self) -> u32 {
        match self {
            Self::Low => 5,
            Self::Medium => 10,
            Self::High => 15,
            Self::Ultra => 20,
        }
    }

    pub fn max_particles(self) -> u32 {
        match self {
            Self::Low => 50_000,
            Self::Medium => 100_000,
            Self::High => 200_000,
            Self::Ultra => 500_000,
        }
    }

    pub fn render_scale(self) -> f32 {
        match self {
            Self::Low => 0.8,
            _ => 1.0,
        }
    }

    pub fn advanced_effects(self) -> bool {
        !matches!(self, Self::Low)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// World-space grid extent (W, H, D)
    pub grid_size: [f32; 3],
    /// Simulation grid cells per world unit volume
    pub density: f32,
    pub particles_per_cell: u32,
    /// Fixed row width of the particle state textures
    pub particles_per_row: u32,
    /// `sphere_radius = sphere_radius_factor / resX`
    pub sphere_radius_factor: f32,
    /// Solver time step in seconds
    pub time_step: f32,
    pub max_particles: Option<u32>,
    /// Upper bound on live ledger bytes after a run's allocations
    pub gpu_memory_budget: Option<u64>,
    pub render_scale: f32,
    pub advanced_effects_allowed: bool,
    /// Restart the running simulation in place when the quality level moves
    pub auto_restart_on_quality_change: bool,
    pub seed: u32,
    pub quality: QualityParams,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_size: [40.0, 20.0, 20.0],
            density: 0.5,
            particles_per_cell: 10,
            particles_per_row: 512,
            sphere_radius_factor: 7.0,
            time_step: 1.0 / 60.0,
            max_particles: None,
            gpu_memory_budget: None,
            render_scale: 1.0,
            advanced_effects_allowed: true,
            auto_restart_on_quality_change: true,
            seed: 12345,
            quality: QualityParams::default(),
        }
    }
}

fn positive(name: &'static str, value: f64) -> EngineResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(EngineError::InvalidParameter { name, value })
    }
}

impl SimulationConfig {
    /// Parse a (possibly partial) JSON config; missing fields take defaults
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(self.density > 0.0) || !self.density.is_finite() {
            return Err(EngineError::InvalidDensity(self.density));
        }
        for &extent in &self.grid_size {
            positive("grid_size", extent as f64)?;
        }
        positive("particles_per_cell", self.particles_per_cell as f64)?;
        positive("particles_per_row", self.particles_per_row as f64)?;
        positive("sphere_radius_factor", self.sphere_radius_factor as f64)?;
        positive("time_step", self.time_step as f64)?;
        positive("render_scale", self.render_scale as f64)?;
        if let Some(max) = self.max_particles {
            positive("max_particles", max as f64)?;
        }
        self.quality.validate()
    }

    pub fn grid_volume(&self) -> f64 {
        self.grid_size.iter().map(|&e| e as f64).product()
    }

    pub fn with_density(&self, density: f32) -> EngineResult<Self> {
        let next = Self { density, ..self.clone() };
        next.validate()?;
        Ok(next)
    }

    pub fn with_particles_per_cell(&self, particles_per_cell: u32) -> EngineResult<Self> {
        let next = Self { particles_per_cell, ..self.clone() };
        next.validate()?;
        Ok(next)
    }

    pub fn with_grid_size(&self, grid_size: [f32; 3]) -> EngineResult<Self> {
        let next = Self { grid_size, ..self.clone() };
        next.validate()?;
        Ok(next)
    }

    /// Simulation speed expressed as solver steps per second
    pub fn with_simulation_speed(&self, steps_per_second: f32) -> EngineResult<Self> {
        positive("simulation_speed", steps_per_second as f64)?;
        let next = Self { time_step: 1.0 / steps_per_second, ..self.clone() };
        next.validate()?;
        Ok(next)
    }

    pub fn with_target_fps(&self, target_fps: f64) -> EngineResult<Self> {
        let mut next = self.clone();
        next.quality.target_fps = target_fps;
        next.validate()?;
        Ok(next)
    }

    pub fn with_preset(&self, preset: QualityPreset) -> Self {
        Self {
            particles_per_cell: preset.particles_per_cell(),
            max_particles: Some(preset.max_particles()),
            render_scale: preset.render_scale(),
            advanced_effects_allowed: preset.advanced_effects(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn density_must_be_positive() {
        let cfg = SimulationConfig::default();
        assert_eq!(cfg.with_density(0.0), Err(EngineError::InvalidDensity(0.0)));
        assert_eq!(cfg.with_density(-1.0), Err(EngineError::InvalidDensity(-1.0)));
        assert!(cfg.with_density(f32::NAN).is_err());
        assert_eq!(cfg.with_density(0.8).unwrap().density, 0.8);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = SimulationConfig::from_json(r#"{"density": 0.25, "quality": {"target_fps": 30}}"#).unwrap();
        assert_eq!(cfg.density, 0.25);
        assert_eq!(cfg.particles_per_row, 512);
        assert_eq!(cfg.quality.target_fps, 30.0);
        assert_eq!(cfg.quality.history_len, 60);
    }

    #[test]
    fn json_dump_reloads_to_the_same_config() {
        let cfg = SimulationConfig { density: 0.75, max_particles: Some(4096), ..SimulationConfig::default() };
        let json = cfg.to_json().unwrap();
        assert!(json.contains("\"max_particles\":4096"));
        assert_eq!(SimulationConfig::from_json(&json).unwrap(), cfg);
    }

    #[test]
    fn json_rejects_bad_values() {
        assert!(matches!(SimulationConfig::from_json("{"), Err(EngineError::Json(_))));
        assert_eq!(
            SimulationConfig::from_json(r#"{"density": -2}"#),
            Err(EngineError::InvalidDensity(-2.0))
        );
    }

    #[test]
    fn quality_bounds_are_checked() {
        let mut params = QualityParams::default();
        params.min_quality = 0.9;
        params.max_quality = 0.5;
        assert!(params.validate().is_err());
    }

    #[test]
    fn presets_apply_tier_values() {
        let cfg = SimulationConfig::default().with_preset(QualityPreset::Low);
        assert_eq!(cfg.particles_per_cell, 5);
        assert_eq!(cfg.max_particles, Some(50_000));
        assert!(!cfg.advanced_effects_allowed);
        assert_eq!(QualityPreset::from_name("ultra"), Some(QualityPreset::Ultra));
        assert_eq!(QualityPreset::from_name("extreme"), None);
    }
}
