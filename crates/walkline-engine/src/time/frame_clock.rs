use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds.
    pub dt: f32,

    /// Unclamped interval since the previous tick, in seconds.
    ///
    /// Zero when two ticks share an instant. Use this for measurement (FPS
    /// readouts), `dt` for simulation steps.
    pub interval: f64,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Delta time is clamped to avoid pathological values when the application is paused
/// by the debugger, minimized, or stalls.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a new clock with default clamps.
    ///
    /// The lower clamp is kept tiny: the harness renders without vsync and
    /// sub-millisecond frames are expected. It only guards against a zero dt.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(last: Instant) -> Self {
        Self {
            last,
            frame_index: 0,
            dt_min: Duration::from_micros(1),
            dt_max: Duration::from_millis(250),
        }
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let interval = now.saturating_duration_since(self.last);
        let dt = interval.clamp(self.dt_min, self.dt_max);

        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            interval: interval.as_secs_f64(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self
            .frame_index
            .wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_index_counts_ticks() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        let a = clock.tick_at(start + Duration::from_millis(1));
        let b = clock.tick_at(start + Duration::from_millis(2));
        assert_eq!(a.frame_index, 0);
        assert_eq!(b.frame_index, 1);
    }

    #[test]
    fn dt_measures_interval() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        let ft = clock.tick_at(start + Duration::from_millis(16));
        assert!((ft.dt - 0.016).abs() < 1e-6);
    }

    #[test]
    fn zero_interval_clamps_to_minimum() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        let ft = clock.tick_at(start);
        assert!(ft.dt > 0.0);
        assert!(ft.dt <= 1e-6 + f32::EPSILON);
    }

    #[test]
    fn long_stall_clamps_to_maximum() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        let ft = clock.tick_at(start + Duration::from_secs(5));
        assert_eq!(ft.dt, 0.25);
    }

    #[test]
    fn interval_is_not_clamped() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        let stall = clock.tick_at(start + Duration::from_secs(1));
        assert_eq!(stall.interval, 1.0);
        let same_instant = clock.tick_at(start + Duration::from_secs(1));
        assert_eq!(same_instant.interval, 0.0);
    }
}
