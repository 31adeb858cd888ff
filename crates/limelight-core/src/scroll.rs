//! Fast-scroll detection.
//!
//! The tracker keeps only the last accepted sample and a count of consecutive fast samples; there
//! is no history buffer. A burst is reported once two consecutive samples exceed the velocity
//! threshold, so a single jump (e.g. "go to line") does not register as scrolling.

/// Samples closer together than this are ignored entirely.
pub const MIN_SAMPLE_INTERVAL_MS: u64 = 16;

/// A pause longer than this starts a new scroll gesture.
pub const GESTURE_GAP_MS: u64 = 100;

/// Consecutive fast samples needed before a burst is reported.
pub const FAST_SAMPLES_REQUIRED: u32 = 2;

/// One observation of the viewport position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollSample {
    /// Milliseconds on a monotonic clock.
    pub timestamp_ms: u64,
    /// First visible line of the view.
    pub top_line: usize,
}

impl ScrollSample {
    /// Create a sample.
    pub fn new(timestamp_ms: u64, top_line: usize) -> Self {
        Self {
            timestamp_ms,
            top_line,
        }
    }
}

/// Detects bursts of fast scrolling from a stream of [`ScrollSample`]s.
#[derive(Debug, Clone)]
pub struct ScrollVelocityTracker {
    last: Option<ScrollSample>,
    consecutive_fast: u32,
    threshold: f64,
}

impl ScrollVelocityTracker {
    /// Create a tracker; `threshold` is in lines per millisecond.
    pub fn new(threshold: f64) -> Self {
        Self {
            last: None,
            consecutive_fast: 0,
            threshold,
        }
    }

    /// Change the velocity threshold without discarding state.
    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    /// Forget the last sample and the fast-sample count.
    pub fn reset(&mut self) {
        self.last = None;
        self.consecutive_fast = 0;
    }

    /// Number of consecutive fast samples seen so far.
    pub fn consecutive_fast(&self) -> u32 {
        self.consecutive_fast
    }

    /// Feed a sample; returns true while the user is scrolling fast.
    pub fn observe(&mut self, sample: ScrollSample) -> bool {
        let Some(last) = self.last else {
            self.last = Some(sample);
            return false;
        };

        let time_delta = sample.timestamp_ms.saturating_sub(last.timestamp_ms);
        let position_delta = sample.top_line.abs_diff(last.top_line);

        if time_delta > GESTURE_GAP_MS {
            self.consecutive_fast = 0;
        }

        if time_delta < MIN_SAMPLE_INTERVAL_MS {
            return false;
        }

        let velocity = position_delta as f64 / time_delta as f64;
        self.last = Some(sample);
        if velocity > self.threshold {
            self.consecutive_fast = self.consecutive_fast.saturating_add(1);
        } else {
            self.consecutive_fast = 0;
        }

        self.consecutive_fast >= FAST_SAMPLES_REQUIRED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_never_reports() {
        let mut tracker = ScrollVelocityTracker::new(0.1);
        assert!(!tracker.observe(ScrollSample::new(0, 500)));
    }

    #[test]
    fn two_fast_samples_in_a_row_report_on_the_second() {
        let mut tracker = ScrollVelocityTracker::new(0.5);
        tracker.observe(ScrollSample::new(1_000, 0));
        assert!(!tracker.observe(ScrollSample::new(1_020, 40)));
        assert!(tracker.observe(ScrollSample::new(1_040, 80)));
        assert!(tracker.observe(ScrollSample::new(1_060, 120)));
    }

    #[test]
    fn slow_sample_resets_the_burst() {
        let mut tracker = ScrollVelocityTracker::new(0.5);
        tracker.observe(ScrollSample::new(0, 0));
        tracker.observe(ScrollSample::new(20, 40));
        assert!(!tracker.observe(ScrollSample::new(40, 41)));
        assert_eq!(tracker.consecutive_fast(), 0);
        assert!(!tracker.observe(ScrollSample::new(60, 81)));
    }

    #[test]
    fn jittery_samples_are_ignored() {
        let mut tracker = ScrollVelocityTracker::new(0.5);
        tracker.observe(ScrollSample::new(0, 0));
        assert!(!tracker.observe(ScrollSample::new(20, 40)));
        // Too close to the previous accepted sample: dropped without touching state.
        assert!(!tracker.observe(ScrollSample::new(25, 400)));
        assert_eq!(tracker.consecutive_fast(), 1);
        // Velocity is measured against the last accepted sample (t=20, line 40).
        assert!(tracker.observe(ScrollSample::new(40, 80)));
    }

    #[test]
    fn long_pause_starts_a_new_gesture() {
        let mut tracker = ScrollVelocityTracker::new(0.5);
        tracker.observe(ScrollSample::new(0, 0));
        tracker.observe(ScrollSample::new(20, 40));
        // 150ms gap: the count restarts, so this fast sample is only the first of a new burst.
        assert!(!tracker.observe(ScrollSample::new(170, 200)));
        assert_eq!(tracker.consecutive_fast(), 1);
    }

    #[test]
    fn sample_exactly_at_min_interval_is_accepted() {
        let mut tracker = ScrollVelocityTracker::new(0.5);
        tracker.observe(ScrollSample::new(0, 0));
        assert!(!tracker.observe(ScrollSample::new(MIN_SAMPLE_INTERVAL_MS, 40)));
        assert_eq!(tracker.consecutive_fast(), 1);
        assert!(tracker.observe(ScrollSample::new(2 * MIN_SAMPLE_INTERVAL_MS, 80)));
    }

    #[test]
    fn gap_exactly_at_gesture_limit_continues_the_burst() {
        let mut tracker = ScrollVelocityTracker::new(0.5);
        tracker.observe(ScrollSample::new(0, 0));
        tracker.observe(ScrollSample::new(20, 40));
        assert!(tracker.observe(ScrollSample::new(20 + GESTURE_GAP_MS, 240)));
        assert_eq!(tracker.consecutive_fast(), 2);

        // One millisecond more and the count restarts.
        assert!(!tracker.observe(ScrollSample::new(20 + 2 * GESTURE_GAP_MS + 1, 400)));
        assert_eq!(tracker.consecutive_fast(), 1);
    }

    #[test]
    fn direction_does_not_matter() {
        let mut tracker = ScrollVelocityTracker::new(0.5);
        tracker.observe(ScrollSample::new(0, 400));
        tracker.observe(ScrollSample::new(20, 360));
        assert!(tracker.observe(ScrollSample::new(40, 320)));
    }
}
