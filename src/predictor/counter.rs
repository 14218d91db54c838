//! Adaptive training threshold.

use crate::config::*;

/// A change made to the training threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThresholdChange {
    Raised(i32),
    Lowered(i32),
}

/// The perceptron training threshold, along with the saturating counter
/// ('tc') used to adjust it.
///
/// Mispredictions push the counter up and low-confidence correct predictions
/// push it down. When the counter reaches either end of its range, the
/// threshold moves by one in the same direction and the counter restarts
/// from zero.
///
/// See "Analysis of the O-GEometric History Length branch predictor"
/// (Seznec, 2005).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThresholdCounter {
    threshold: i32,
    tc: i32,
}
impl ThresholdCounter {
    pub fn new() -> Self {
        Self { threshold: INITIAL_THRESHOLD, tc: 0 }
    }

    /// Return the current training threshold.
    pub fn threshold(&self) -> i32 { self.threshold }

    /// Return the current value of the counter.
    pub fn counter(&self) -> i32 { self.tc }

    /// Returns 'true' when an output with this magnitude is small enough
    /// that a correct prediction should still be trained.
    pub fn is_low_confidence(&self, magnitude: i32) -> bool {
        magnitude <= self.threshold
    }

    /// Record a misprediction.
    pub fn strengthen(&mut self) -> Option<ThresholdChange> {
        self.tc += 1;
        if self.tc == TC_MAX {
            self.threshold = self.threshold.saturating_add(1);
            self.tc = 0;
            return Some(ThresholdChange::Raised(self.threshold));
        }
        None
    }

    /// Record a correct prediction with low confidence.
    pub fn weaken(&mut self) -> Option<ThresholdChange> {
        self.tc -= 1;
        if self.tc == TC_MIN {
            self.threshold = self.threshold.saturating_sub(1);
            self.tc = 0;
            return Some(ThresholdChange::Lowered(self.threshold));
        }
        None
    }

    /// Update the counter after a branch is resolved.
    ///
    /// 'magnitude' is the absolute value of the output used to make the
    /// prediction, and must be checked against the threshold *before* this
    /// call changes it.
    pub fn update(&mut self, hit: bool, magnitude: i32)
        -> Option<ThresholdChange>
    {
        if !hit {
            self.strengthen()
        } else if self.is_low_confidence(magnitude) {
            self.weaken()
        } else {
            None
        }
    }

    /// Reset the threshold and counter.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for ThresholdCounter {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn raise_after_127_misses() {
        let mut c = ThresholdCounter::new();
        for _ in 0..126 {
            assert_eq!(c.update(false, 0), None);
        }
        assert_eq!(c.counter(), 126);
        assert_eq!(c.update(false, 0),
            Some(ThresholdChange::Raised(INITIAL_THRESHOLD + 1)));
        assert_eq!(c.counter(), 0);
    }

    #[test]
    fn lower_after_128_weak_hits() {
        let mut c = ThresholdCounter::new();
        for _ in 0..127 {
            assert_eq!(c.update(true, 10), None);
        }
        assert_eq!(c.update(true, 10),
            Some(ThresholdChange::Lowered(INITIAL_THRESHOLD - 1)));
        assert_eq!(c.counter(), 0);
    }

    #[test]
    fn confident_hits_are_ignored() {
        let mut c = ThresholdCounter::new();
        assert_eq!(c.update(true, INITIAL_THRESHOLD + 1), None);
        assert_eq!(c.counter(), 0);
        assert_eq!(c.update(true, INITIAL_THRESHOLD), None);
        assert_eq!(c.counter(), -1);
    }

    #[test]
    fn misses_and_hits_cancel() {
        let mut c = ThresholdCounter::new();
        c.update(false, 0);
        c.update(true, 0);
        assert_eq!(c.counter(), 0);
        assert_eq!(c.threshold(), INITIAL_THRESHOLD);
    }
}
