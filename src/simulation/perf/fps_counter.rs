/// Frames counted over a one second window, for the on-screen readout.
/// Independent of the quality controller's rolling average.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FpsCounter {
    frames: u32,
    elapsed_ms: f64,
    fps: f64,
}

const WINDOW_MS: f64 = 1000.0;

impl FpsCounter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, frame_time_ms: f64) {
        if !(frame_time_ms > 0.0) || !frame_time_ms.is_finite() {
            return;
        }
        self.frames += 1;
        self.elapsed_ms += frame_time_ms;
        if self.elapsed_ms >= WINDOW_MS {
            self.fps = self.frames as f64 * 1000.0 / self.elapsed_ms;
            self.frames = 0;
            self.elapsed_ms = 0.0;
        }
    }

    /// FPS of the last completed window (0 until one completes)
    pub(crate) fn fps(&self) -> f64 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_after_a_full_window() {
        let mut counter = FpsCounter::new();
        for _ in 0..29 {
            counter.record(1000.0 / 30.0);
        }
        assert_eq!(counter.fps(), 0.0);
        counter.record(1000.0 / 30.0 + 0.01);
        assert!((counter.fps() - 30.0).abs() < 0.01);
    }

    #[test]
    fn ignores_degenerate_samples() {
        let mut counter = FpsCounter::new();
        counter.record(0.0);
        counter.record(f64::NAN);
        counter.record(2000.0);
        assert_eq!(counter.fps(), 0.5);
    }
}
