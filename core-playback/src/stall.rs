//! Stall detection for native layers that never report an unexpected pause.
//!
//! Some OS media players keep reporting "running" after the system silently
//! suspended playback (background throttling, audio focus loss). The poll
//! backend feeds every valid position sample into a [`StallDetector`]; three
//! consecutive identical non-zero samples mean the playhead stopped moving.

/// Number of consecutive identical samples that count as a stall.
pub const STALL_WINDOW: usize = 3;

/// Sliding window over the most recent polled positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StallDetector {
    positions: [f64; STALL_WINDOW],
}

impl StallDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a sample, discarding the oldest one.
    ///
    /// Returns `true` when `position` is non-zero and the window now holds
    /// [`STALL_WINDOW`] samples equal to it.
    pub fn record(&mut self, position: f64) -> bool {
        self.positions.rotate_left(1);
        self.positions[STALL_WINDOW - 1] = position;

        position != 0.0 && self.positions.iter().all(|sample| *sample == position)
    }

    /// The stored samples, oldest first.
    pub fn positions(&self) -> &[f64; STALL_WINDOW] {
        &self.positions
    }

    pub fn reset(&mut self) {
        self.positions = [0.0; STALL_WINDOW];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stalls(samples: &[f64]) -> usize {
        let mut detector = StallDetector::new();
        samples
            .iter()
            .filter(|sample| detector.record(**sample))
            .count()
    }

    #[test]
    fn test_three_identical_samples_stall() {
        assert_eq!(stalls(&[5.0, 5.0, 5.0]), 1);
    }

    #[test]
    fn test_advancing_position_does_not_stall() {
        assert_eq!(stalls(&[5.0, 5.0, 6.0]), 0);
        assert_eq!(stalls(&[1.0, 2.0, 3.0, 4.0, 5.0]), 0);
    }

    #[test]
    fn test_zero_is_exempt() {
        assert_eq!(stalls(&[0.0, 0.0, 0.0]), 0);
        assert_eq!(stalls(&[0.0, 0.0, 0.0, 0.0, 0.0]), 0);
    }

    #[test]
    fn test_two_samples_are_not_enough() {
        assert_eq!(stalls(&[5.0, 5.0]), 0);
        assert_eq!(stalls(&[4.0, 5.0, 5.0]), 0);
    }

    #[test]
    fn test_window_keeps_last_three() {
        let mut detector = StallDetector::new();
        for sample in [1.0, 2.0, 3.0, 4.0] {
            detector.record(sample);
        }
        assert_eq!(detector.positions(), &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut detector = StallDetector::new();
        detector.record(5.0);
        detector.record(5.0);
        detector.reset();

        assert!(!detector.record(5.0));
        assert_eq!(detector.positions(), &[0.0, 0.0, 5.0]);
    }
}
