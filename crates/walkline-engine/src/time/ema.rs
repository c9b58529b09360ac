/// Exponential moving average of frame time.
///
/// `dt = dt * 0.9 + 0.1 * sample`, seeded at zero. Purely a diagnostic readout;
/// nothing in the loop branches on it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTimeEma {
    value: f64,
}

impl FrameTimeEma {
    /// Weight of the newest sample.
    pub const SAMPLE_WEIGHT: f64 = 0.1;

    pub const fn new() -> Self {
        Self { value: 0.0 }
    }

    /// Folds one instantaneous frame interval (seconds) into the average.
    pub fn update(&mut self, dt: f64) -> f64 {
        self.value = self.value * (1.0 - Self::SAMPLE_WEIGHT) + Self::SAMPLE_WEIGHT * dt;
        self.value
    }

    /// Smoothed frame time in seconds.
    #[inline]
    pub fn dt(&self) -> f64 {
        self.value
    }

    /// Frames per second implied by the smoothed frame time.
    ///
    /// `None` until at least one non-zero sample has been folded in.
    pub fn fps(&self) -> Option<f64> {
        (self.value > 0.0).then(|| 1.0 / self.value)
    }
}

impl Default for FrameTimeEma {
    fn default() -> Self {
        Self::new()
    }
}
