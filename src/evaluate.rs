//! Threshold evaluation.
//!
//! `evaluate` decides whether one frame matches. `ConfidenceWindow` decides
//! whether enough frames matched recently to be worth waking somebody up.

use std::time::Duration;

use crate::error::{EscaprError, Result};

pub const DEFAULT_REQUIRED_HITS: u32 = 15;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(10);

/// Returns true when `similarity` reaches `threshold` (inclusive).
pub fn evaluate(similarity: f64, threshold: f64) -> bool {
    similarity >= threshold
}

/// Counts matching frames inside a fixed window of frame time.
///
/// Each observation advances the window clock by one frame interval, so the
/// window is measured in frames seen, not wall time.
#[derive(Clone, Debug)]
pub struct ConfidenceWindow {
    required_hits: u32,
    window: Duration,
    frame_interval: Duration,
    hits: u32,
    elapsed: Duration,
}

impl ConfidenceWindow {
    pub fn new(required_hits: u32, window: Duration, frame_interval: Duration) -> Result<Self> {
        if required_hits == 0 {
            return Err(EscaprError::Config(
                "required_hits must be at least 1".to_string(),
            ));
        }
        if window.is_zero() || frame_interval.is_zero() {
            return Err(EscaprError::Config(
                "confidence window and frame interval must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            required_hits,
            window,
            frame_interval,
            hits: 0,
            elapsed: Duration::ZERO,
        })
    }

    /// Records one frame. Returns true when the alert condition is reached;
    /// the hit count starts over afterwards.
    pub fn observe(&mut self, hit: bool) -> bool {
        if self.elapsed >= self.window {
            self.hits = 0;
            self.elapsed = Duration::ZERO;
        }
        if hit {
            self.hits += 1;
        }
        self.elapsed += self.frame_interval;

        if self.hits >= self.required_hits {
            self.hits = 0;
            return true;
        }
        false
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn required_hits(&self) -> u32 {
        self.required_hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUARTER_SECOND: Duration = Duration::from_millis(250);

    #[test]
    fn threshold_is_inclusive() {
        assert!(evaluate(0.85, 0.8));
        assert!(!evaluate(0.79, 0.8));
        assert!(evaluate(0.8, 0.8));
        assert!(evaluate(0.16, 0.16));
        assert!(!evaluate(0.0, 0.01));
        assert!(evaluate(1.0, 1.0));
    }

    #[test]
    fn fires_after_required_hits_then_resets() {
        let mut window = ConfidenceWindow::new(15, DEFAULT_WINDOW, QUARTER_SECOND).unwrap();
        for _ in 0..14 {
            assert!(!window.observe(true));
        }
        assert!(window.observe(true));
        assert_eq!(window.hits(), 0);
        assert!(!window.observe(true));
        assert_eq!(window.hits(), 1);
    }

    #[test]
    fn hits_split_across_windows_never_fire() {
        // 4 fps over a 10 s window is 40 frames.
        let mut window = ConfidenceWindow::new(15, DEFAULT_WINDOW, QUARTER_SECOND).unwrap();
        for round in 0..3 {
            for frame in 0..40 {
                let hit = frame >= 40 - 14;
                assert!(!window.observe(hit), "round {round} frame {frame}");
            }
        }
    }

    #[test]
    fn window_keeps_counting_after_many_windows() {
        let mut window = ConfidenceWindow::new(3, Duration::from_secs(1), QUARTER_SECOND).unwrap();
        for _ in 0..100 {
            window.observe(false);
        }
        assert!(!window.observe(true));
        assert!(!window.observe(true));
        assert!(window.observe(true));
    }

    #[test]
    fn single_hit_mode_fires_every_match() {
        let mut window = ConfidenceWindow::new(1, DEFAULT_WINDOW, QUARTER_SECOND).unwrap();
        assert!(window.observe(true));
        assert!(!window.observe(false));
        assert!(window.observe(true));
    }

    #[test]
    fn rejects_degenerate_settings() {
        assert!(ConfidenceWindow::new(0, DEFAULT_WINDOW, QUARTER_SECOND).is_err());
        assert!(ConfidenceWindow::new(1, Duration::ZERO, QUARTER_SECOND).is_err());
        assert!(ConfidenceWindow::new(1, DEFAULT_WINDOW, Duration::ZERO).is_err());
    }
}
