use std::time::{Duration, Instant};

/// How often the frame counter hands back a summary for the log.
const REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Monotonic clock, zeroed at program start. All drag timestamps and the
/// idle-motion curve read from this so a long-running session never loses
/// float precision the way wall-clock seconds would.
pub struct SceneClock {
    started: Instant,
}

impl SceneClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.started.elapsed().as_secs_f32()
    }
}

impl Default for SceneClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame rate and render time averaged over one reporting window.
pub struct FrameReport {
    pub fps: f32,
    pub avg_render_ms: f32,
}

/// Rolling frame counter. The viewer has no per-frame readout surface, so
/// the numbers go to the log at a slow cadence instead.
pub struct FrameStats {
    window_start: Instant,
    frames: u32,
    render_ms_total: f32,
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            window_start: Instant::now(),
            frames: 0,
            render_ms_total: 0.0,
        }
    }

    /// Count one finished frame. Returns a report once per interval, leaving
    /// the counters reset for the next window.
    pub fn record_frame(&mut self, now: Instant, render_ms: f32) -> Option<FrameReport> {
        self.frames += 1;
        self.render_ms_total += render_ms;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < REPORT_INTERVAL {
            return None;
        }
        let report = FrameReport {
            fps: self.frames as f32 / elapsed.as_secs_f32(),
            avg_render_ms: self.render_ms_total / self.frames as f32,
        };
        self.frames = 0;
        self.render_ms_total = 0.0;
        self.window_start = now;
        Some(report)
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
    fn clock_is_monotonic_and_starts_near_zero() {
        let clock = SceneClock::new();
        let first = clock.elapsed_seconds();
        let second = clock.elapsed_seconds();
        assert!(first >= 0.0);
        assert!(second >= first);
        assert!(first < 1.0);
    }

    #[test]
    fn stats_stay_quiet_inside_the_window() {
        let mut stats = FrameStats::new();
        let now = Instant::now();
        assert!(stats.record_frame(now, 2.0).is_none());
        assert!(stats
            .record_frame(now + Duration::from_millis(16), 2.0)
            .is_none());
    }

    #[test]
    fn stats_report_averages_and_reset() {
        let mut stats = FrameStats::new();
        let start = Instant::now();
        assert!(stats.record_frame(start, 2.0).is_none());
        assert!(stats
            .record_frame(start + Duration::from_secs(1), 6.0)
            .is_none());

        let report = stats
            .record_frame(start + Duration::from_secs(6), 4.0)
            .expect("window elapsed");
        assert!((report.avg_render_ms - 4.0).abs() < 1e-6);
        assert!(report.fps > 0.3);
        assert!(report.fps <= 0.5);

        // Next frame opens a fresh window.
        assert!(stats
            .record_frame(start + Duration::from_secs(7), 1.0)
            .is_none());
    }
}
