//! Frame timing

use std::time::{Duration, Instant};

/// Longest delta handed to the update step
const MAX_DELTA: Duration = Duration::from_millis(250);

/// Tracks time between frames and since start
#[derive(Debug, Clone)]
pub struct Time {
    start: Instant,
    last_frame: Instant,
    delta: Duration,
    frame_count: u64,
}

impl Time {
    /// Start the clock
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Advance to the current instant. Call once per frame.
    pub fn update(&mut self) {
        self.tick(Instant::now());
    }

    fn tick(&mut self, now: Instant) {
        self.delta = now.saturating_duration_since(self.last_frame).min(MAX_DELTA);
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Time since the previous frame
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Time since the previous frame in seconds
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Seconds since the clock started
    pub fn total_seconds(&self) -> f32 {
        self.last_frame.duration_since(self.start).as_secs_f32()
    }

    /// Frames counted so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_measures_delta() {
        let mut time = Time::new();
        let start = time.last_frame;

        time.tick(start + Duration::from_millis(16));
        assert_eq!(time.delta(), Duration::from_millis(16));
        assert_eq!(time.frame_count(), 1);

        time.tick(start + Duration::from_millis(48));
        assert!((time.delta_seconds() - 0.032).abs() < 1e-6);
        assert!((time.total_seconds() - 0.048).abs() < 1e-6);
    }

    #[test]
    fn test_long_stall_is_clamped() {
        let mut time = Time::new();
        let start = time.last_frame;

        time.tick(start + Duration::from_secs(5));
        assert_eq!(time.delta(), MAX_DELTA);
        assert!((time.total_seconds() - 5.0).abs() < 1e-6);
    }
}
