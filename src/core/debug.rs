//! Frame statistics

use std::collections::VecDeque;
use std::time::Duration;

/// Number of frames averaged over
const SAMPLES: usize = 120;

/// Rolling frame time statistics
#[derive(Debug)]
pub struct FrameStats {
    /// Frame time history for averaging
    frame_times: VecDeque<Duration>,
    /// Current FPS
    fps: f32,
    /// Average frame time in milliseconds
    avg_frame_time_ms: f32,
    /// Minimum frame time in milliseconds
    min_frame_time_ms: f32,
    /// Maximum frame time in milliseconds
    max_frame_time_ms: f32,
    /// Total frames recorded
    total_frames: u64,
    /// Draws submitted in the last frame
    draws: usize,
}

impl FrameStats {
    /// Create a new frame stats tracker
    pub fn new() -> Self {
        Self {
            frame_times: VecDeque::with_capacity(SAMPLES),
            fps: 0.0,
            avg_frame_time_ms: 0.0,
            min_frame_time_ms: 0.0,
            max_frame_time_ms: 0.0,
            total_frames: 0,
            draws: 0,
        }
    }

    /// Record a frame with the given delta time
    pub fn record_frame(&mut self, delta: Duration) {
        self.total_frames += 1;

        if self.frame_times.len() >= SAMPLES {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(delta);

        self.update_stats();
    }

    /// Record how many draws the last frame submitted
    pub fn record_draws(&mut self, draws: usize) {
        self.draws = draws;
    }

    fn update_stats(&mut self) {
        if self.frame_times.is_empty() {
            return;
        }

        let mut total = Duration::ZERO;
        let mut min = Duration::MAX;
        let mut max = Duration::ZERO;

        for &dt in &self.frame_times {
            total += dt;
            min = min.min(dt);
            max = max.max(dt);
        }

        let count = self.frame_times.len() as f32;
        let total_secs = total.as_secs_f32();

        if total_secs > 0.0 {
            self.avg_frame_time_ms = (total_secs / count) * 1000.0;
            self.fps = count / total_secs;
        } else {
            self.avg_frame_time_ms = 0.0;
            self.fps = 0.0;
        }

        self.min_frame_time_ms = min.as_secs_f32() * 1000.0;
        self.max_frame_time_ms = max.as_secs_f32() * 1000.0;
    }

    /// Whether a full window of samples has passed since the last report
    pub fn report_due(&self) -> bool {
        self.total_frames > 0 && self.total_frames % SAMPLES as u64 == 0
    }

    /// Get current FPS
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Get average frame time in milliseconds
    pub fn avg_frame_time_ms(&self) -> f32 {
        self.avg_frame_time_ms
    }

    /// Get minimum frame time in milliseconds
    pub fn min_frame_time_ms(&self) -> f32 {
        self.min_frame_time_ms
    }

    /// Get maximum frame time in milliseconds
    pub fn max_frame_time_ms(&self) -> f32 {
        self.max_frame_time_ms
    }

    /// Get total frames recorded
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Draws submitted in the last frame
    pub fn draws(&self) -> usize {
        self.draws
    }

    /// Get a formatted stats string
    pub fn format_stats(&self) -> String {
        format!(
            "FPS: {:.1} | Frame: {:.2}ms (min: {:.2}, max: {:.2}) | Draws: {}",
            self.fps,
            self.avg_frame_time_ms,
            self.min_frame_time_ms,
            self.max_frame_time_ms,
            self.draws
        )
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_fps() {
        let mut stats = FrameStats::new();
        for _ in 0..10 {
            stats.record_frame(Duration::from_millis(10));
        }

        assert!((stats.fps() - 100.0).abs() < 0.5);
        assert!((stats.avg_frame_time_ms() - 10.0).abs() < 0.01);
        assert_eq!(stats.total_frames(), 10);
    }

    #[test]
    fn test_window_is_bounded() {
        let mut stats = FrameStats::new();
        for _ in 0..SAMPLES {
            stats.record_frame(Duration::from_millis(100));
        }
        for _ in 0..SAMPLES {
            stats.record_frame(Duration::from_millis(20));
        }

        // Old slow frames have rolled out of the window
        assert!((stats.max_frame_time_ms() - 20.0).abs() < 0.01);
        assert!((stats.fps() - 50.0).abs() < 0.5);
    }

    #[test]
    fn test_zero_deltas() {
        let mut stats = FrameStats::new();
        stats.record_frame(Duration::ZERO);
        assert_eq!(stats.fps(), 0.0);
    }

    #[test]
    fn test_report_due() {
        let mut stats = FrameStats::new();
        assert!(!stats.report_due());

        for _ in 0..SAMPLES {
            stats.record_frame(Duration::from_millis(16));
        }
        assert!(stats.report_due());

        stats.record_frame(Duration::from_millis(16));
        assert!(!stats.report_due());
    }

    #[test]
    fn test_format_includes_draws() {
        let mut stats = FrameStats::new();
        stats.record_draws(3);
        assert!(stats.format_stats().ends_with("Draws: 3"));
    }
}
