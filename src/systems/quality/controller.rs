//! Adaptive Quality Controller
//!
//! Closed loop over measured frame time. Degrades quickly (10 slow frames,
//! full step) and recovers slowly (30 fast frames, half step) so the level
//! doesn't flicker around the target.

use std::collections::VecDeque;

use crate::core::math::{clamp, fast_sqrt};
use crate::domain::config::{DegradeCadence, QualityParams};
use crate::domain::error::{EngineError, EngineResult};

/// Scales derived from the current quality level
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QualitySettings {
    pub particle_scale: f64,
    /// Grid cost grows faster than linearly with resolution
    pub grid_scale: f64,
    pub render_scale: f64,
    pub enable_advanced_effects: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PerformanceRegime {
    Slow,
    Neutral,
    Headroom,
}

/// Outcome of one `update`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QualityUpdate {
    pub quality_level: f64,
    pub previous_level: f64,
    /// `None` when the sample was discarded
    pub regime: Option<PerformanceRegime>,
}

impl QualityUpdate {
    pub fn changed(&self) -> bool {
        self.quality_level != self.previous_level
    }
}

pub struct QualityController {
    params: QualityParams,
    quality_level: f64,
    frame_time_history: VecDeque<f64>,
    stable_frame_count: u32,
    unstable_frame_count: u32,
}

impl QualityController {
    /// Starts at `max_quality` with an empty history
    pub fn new(params: QualityParams) -> Self {
        let capacity = params.history_len;
        Self {
            quality_level: params.max_quality,
            params,
            frame_time_history: VecDeque::with_capacity(capacity),
            stable_frame_count: 0,
            unstable_frame_count: 0,
        }
    }

    /// Feed one frame time (ms). Non-positive or non-finite samples are dropped.
    pub fn update(&mut self, frame_time_ms: f64) -> QualityUpdate {
        let previous_level = self.quality_level;
        if !(frame_time_ms > 0.0) || !frame_time_ms.is_finite() {
            return QualityUpdate { quality_level: previous_level, previous_level, regime: None };
        }

        self.push_sample(frame_time_ms);
        let performance = self.params.target_frame_time_ms() / self.average_frame_time();

        let regime = if performance < self.params.slow_ratio {
            self.unstable_frame_count += 1;
            self.stable_frame_count = 0;
            if self.should_degrade() {
                self.quality_level = clamp(
                    self.quality_level - self.params.adjustment_step,
                    self.params.min_quality,
                    self.params.max_quality,
                );
            }
            PerformanceRegime::Slow
        } else if performance > self.params.headroom_ratio {
            self.stable_frame_count += 1;
            self.unstable_frame_count = 0;
            if self.stable_frame_count > self.params.recover_threshold {
                self.quality_level = clamp(
                    self.quality_level + self.params.adjustment_step * 0.5,
                    self.params.min_quality,
                    self.params.max_quality,
                );
                self.stable_frame_count = 0;
            }
            PerformanceRegime::Headroom
        } else {
            self.stable_frame_count += 1;
            self.unstable_frame_count = 0;
            PerformanceRegime::Neutral
        };

        QualityUpdate { quality_level: self.quality_level, previous_level, regime: Some(regime) }
    }

    fn should_degrade(&self) -> bool {
        let threshold = self.params.degrade_threshold;
        if self.unstable_frame_count <= threshold {
            return false;
        }
        match self.params.cadence {
            DegradeCadence::EveryFrame => true,
            // The counter keeps growing under load; fire on each further crossing.
            DegradeCadence::PerCrossing => self.unstable_frame_count % (threshold + 1) == 0,
        }
    }

    fn push_sample(&mut self, frame_time_ms: f64) {
        if self.frame_time_history.len() == self.params.history_len {
            self.frame_time_history.pop_front();
        }
        self.frame_time_history.push_back(frame_time_ms);
    }

    /// Mean of the ring buffer (target frame time when empty)
    pub fn average_frame_time(&self) -> f64 {
        if self.frame_time_history.is_empty() {
            return self.params.target_frame_time_ms();
        }
        let sum: f64 = self.frame_time_history.iter().sum();
        sum / self.frame_time_history.len() as f64
    }

    pub fn current_fps(&self) -> f64 {
        1000.0 / self.average_frame_time()
    }

    pub fn quality_level(&self) -> f64 {
        self.quality_level
    }

    pub fn stable_frame_count(&self) -> u32 {
        self.stable_frame_count
    }

    pub fn unstable_frame_count(&self) -> u32 {
        self.unstable_frame_count
    }

    pub fn history_len(&self) -> usize {
        self.frame_time_history.len()
    }

    pub fn params(&self) -> &QualityParams {
        &self.params
    }

    pub fn settings(&self) -> QualitySettings {
        let q = self.quality_level;
        QualitySettings {
            particle_scale: q,
            grid_scale: fast_sqrt(q),
            render_scale: q.max(0.5),
            enable_advanced_effects: q > 0.7,
        }
    }

    pub fn set_target_fps(&mut self, target_fps: f64) -> EngineResult<()> {
        if !(target_fps > 0.0) || !target_fps.is_finite() {
            return Err(EngineError::InvalidParameter { name: "target_fps", value: target_fps });
        }
        self.params.target_fps = target_fps;
        Ok(())
    }

    /// Replace the parameters; the level is clamped into the new bounds.
    /// History is trimmed (oldest first) if the ring buffer shrank.
    pub fn set_params(&mut self, params: QualityParams) -> EngineResult<()> {
        params.validate()?;
        while self.frame_time_history.len() > params.history_len {
            self.frame_time_history.pop_front();
        }
        self.quality_level = clamp(self.quality_level, params.min_quality, params.max_quality);
        self.params = params;
        Ok(())
    }

    pub fn set_quality_bounds(&mut self, min_quality: f64, max_quality: f64) -> EngineResult<()> {
        let params = QualityParams { min_quality, max_quality, ..self.params.clone() };
        self.set_params(params)
    }

    /// Forget history and counters and return to full quality
    pub fn reset(&mut self) {
        self.frame_time_history.clear();
        self.stable_frame_count = 0;
        self.unstable_frame_count = 0;
        self.quality_level = self.params.max_quality;
    }
}
