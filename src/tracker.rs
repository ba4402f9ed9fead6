//! Playback position tracking.
//!
//! Position is always derived as `(offset + elapsed) mod duration` from a
//! stored offset and a wall-clock reference captured at start. Pausing
//! captures an exact offset and resuming captures a fresh reference, so any
//! number of play/pause/seek cycles accumulates no rounding drift.

/// Maps wall-clock time to a looping position within the source duration.
/// The clock value is injected by the caller (seconds on any monotonic
/// timeline), which keeps this pure math.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    duration: f64,
    offset: f64,
    started_at: Option<f64>,
}

impl PositionTracker {
    pub fn new(duration: f64) -> Self {
        PositionTracker {
            duration,
            offset: 0.0,
            started_at: None,
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Capture a fresh wall-clock reference; position resumes from the
    /// stored offset.
    pub fn start(&mut self, now: f64) {
        self.started_at = Some(now);
    }

    /// Freeze at the exact current position and return it.
    pub fn pause(&mut self, now: f64) -> f64 {
        self.offset = self.position(now);
        self.started_at = None;
        self.offset
    }

    /// Current looping position in seconds.
    pub fn position(&self, now: f64) -> f64 {
        let raw = match self.started_at {
            Some(started_at) => self.offset + (now - started_at),
            None => self.offset,
        };
        if self.duration > 0.0 {
            raw.rem_euclid(self.duration)
        } else {
            0.0
        }
    }

    /// Jump to an absolute position. A running tracker re-references the
    /// clock so the jump is exact.
    pub fn seek(&mut self, now: f64, seconds: f64) {
        self.offset = if self.duration > 0.0 {
            seconds.rem_euclid(self.duration)
        } else {
            0.0
        };
        if self.started_at.is_some() {
            self.started_at = Some(now);
        }
    }

    pub fn reset(&mut self) {
        self.offset = 0.0;
        self.started_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_past_the_end() {
        let duration = 3.0;
        let mut t = PositionTracker::new(duration);
        t.seek(0.0, duration - 0.1);
        t.start(10.0);
        // offset = D - 0.1, elapsed = 0.5 -> (D - 0.1 + 0.5) mod D = 0.4
        let pos = t.position(10.5);
        assert!((pos - 0.4).abs() < 1e-9, "got {pos}");
    }

    #[test]
    fn paused_tracker_holds_position() {
        let mut t = PositionTracker::new(10.0);
        t.start(0.0);
        let offset = t.pause(2.5);
        assert!((offset - 2.5).abs() < 1e-9);
        assert!((t.position(100.0) - 2.5).abs() < 1e-9);
        assert!(!t.is_running());
    }

    #[test]
    fn many_pause_resume_cycles_do_not_drift() {
        let mut t = PositionTracker::new(100.0);
        let mut now = 0.0;
        for _ in 0..1000 {
            t.start(now);
            now += 0.01;
            t.pause(now);
            now += 5.0; // time passes while paused
        }
        // 1000 cycles x 10 ms of playback each
        assert!((t.position(now) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn seek_while_running_re_references_the_clock() {
        let mut t = PositionTracker::new(10.0);
        t.start(0.0);
        t.seek(4.0, 7.0);
        assert!((t.position(4.0) - 7.0).abs() < 1e-9);
        assert!((t.position(5.0) - 8.0).abs() < 1e-9);
        assert!(t.is_running());
    }

    #[test]
    fn zero_duration_is_always_at_zero() {
        let mut t = PositionTracker::new(0.0);
        t.start(0.0);
        assert_eq!(t.position(42.0), 0.0);
    }
}
