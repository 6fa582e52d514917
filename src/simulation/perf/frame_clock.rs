#[cfg(target_arch = "wasm32")]
use js_sys;

/// Wall-clock source for frame times. `performance.now()` is not reachable
/// without a window, so wasm reads `Date.now()` like the rest of the engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameClock {
    #[cfg(target_arch = "wasm32")]
    last_ms: Option<f64>,
    #[cfg(not(target_arch = "wasm32"))]
    last: Option<std::time::Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds since the previous call (0 on the first one)
    pub fn tick(&mut self) -> f64 {
        #[cfg(target_arch = "wasm32")]
        {
            let now = js_sys::Date::now();
            let elapsed = self.last_ms.map(|last| (now - last).max(0.0)).unwrap_or(0.0);
            self.last_ms = Some(now);
            elapsed
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            let now = std::time::Instant::now();
            let elapsed = self.last.map(|last| now.duration_since(last).as_secs_f64() * 1000.0).unwrap_or(0.0);
            self.last = Some(now);
            elapsed
        }
    }

    /// Forget the previous timestamp (e.g. after the tab was hidden)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
