//! Debounced threshold detection over a per-epoch feature stream.
//!
//! The detector consumes one scalar feature value per epoch, fires a
//! caller-supplied sink exactly once when the value first crosses the
//! threshold, and then suppresses further firings until a refractory window
//! (expressed as buffer length over shift length) has elapsed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors from detector construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorError {
    /// A construction parameter was non-positive or non-finite.
    InvalidParameter(&'static str),
}

impl fmt::Display for DetectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorError::InvalidParameter(what) => {
                write!(f, "invalid detector parameter: {what}")
            }
        }
    }
}

impl std::error::Error for DetectorError {}

/// How the detector re-arms under a sustained above-threshold signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RearmPolicy {
    /// Once the refractory window elapses the detector returns to idle even
    /// while the signal is still high, so a sustained signal re-fires
    /// roughly every buffer length. Suits continuous neurofeedback.
    #[default]
    Periodic,
    /// The detector stays suppressed until the value drops to or below the
    /// threshold. Suits discrete gesture detection.
    OnRelease,
}

/// Receiver for detection notifications.
///
/// Invoked synchronously, with no arguments, at most once per evaluated
/// epoch. What happens on detection (printing, key injection, feedback) is
/// entirely the sink's business.
pub trait GestureSink {
    fn on_detected(&mut self);
}

impl<F: FnMut()> GestureSink for F {
    fn on_detected(&mut self) {
        self()
    }
}

/// Detector state between epochs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetectorState {
    /// Armed; the next above-threshold value fires.
    Idle,
    /// A gesture just fired; crossings are absorbed until the refractory
    /// window elapses.
    Suppressed,
}

/// Stateful threshold detector with a refractory window.
///
/// `buffer_length` and `shift_length` are in the same time unit (seconds in
/// practice); their ratio determines how many epochs must pass before the
/// detector re-arms.
#[derive(Debug, Clone)]
pub struct GestureDetector {
    threshold: f64,
    buffer_length: f64,
    shift_length: f64,
    rearm: RearmPolicy,
    state: DetectorState,
    // Epochs spent in the suppressed state; meaningless while idle.
    epoch_count: u32,
}

impl GestureDetector {
    /// Create a detector. `buffer_length` and `shift_length` must be
    /// positive and the threshold finite.
    pub fn new(
        threshold: f64,
        buffer_length: f64,
        shift_length: f64,
    ) -> Result<Self, DetectorError> {
        if !threshold.is_finite() {
            return Err(DetectorError::InvalidParameter("threshold must be finite"));
        }
        if !(buffer_length > 0.0) {
            return Err(DetectorError::InvalidParameter(
                "buffer_length must be positive",
            ));
        }
        if !(shift_length > 0.0) {
            return Err(DetectorError::InvalidParameter(
                "shift_length must be positive",
            ));
        }
        Ok(Self {
            threshold,
            buffer_length,
            shift_length,
            rearm: RearmPolicy::default(),
            state: DetectorState::Idle,
            epoch_count: 0,
        })
    }

    /// Select the re-arm policy for sustained signals.
    pub fn with_rearm(mut self, rearm: RearmPolicy) -> Self {
        self.rearm = rearm;
        self
    }

    /// Evaluate one epoch's feature value.
    ///
    /// Fires `sink` on the idle-to-suppressed transition only, and returns
    /// whether it fired. Never fails; malformed parameters are rejected at
    /// construction instead.
    pub fn evaluate<S: GestureSink>(&mut self, value: f64, sink: &mut S) -> bool {
        if value > self.threshold {
            match self.state {
                DetectorState::Idle => {
                    self.state = DetectorState::Suppressed;
                    self.epoch_count = 0;
                    sink.on_detected();
                    true
                }
                DetectorState::Suppressed => {
                    if self.epoch_count as f64 * self.shift_length > self.buffer_length {
                        match self.rearm {
                            RearmPolicy::Periodic => {
                                // Refractory window elapsed with the signal
                                // still high: return to idle so the next
                                // epoch can fire again.
                                self.state = DetectorState::Idle;
                                self.epoch_count = 0;
                            }
                            RearmPolicy::OnRelease => {}
                        }
                    } else {
                        self.epoch_count += 1;
                    }
                    false
                }
            }
        } else {
            self.state = DetectorState::Idle;
            self.epoch_count = 0;
            false
        }
    }

    /// Return to the idle state, discarding any suppression in progress.
    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
        self.epoch_count = 0;
    }

    /// Whether the detector is currently absorbing crossings.
    pub fn is_suppressed(&self) -> bool {
        self.state == DetectorState::Suppressed
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Epochs needed before the refractory window elapses.
    pub fn refractory_epochs(&self) -> u32 {
        (self.buffer_length / self.shift_length).ceil() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counting sink for assertions.
    struct Counter(u32);

    impl GestureSink for Counter {
        fn on_detected(&mut self) {
            self.0 += 1;
        }
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(GestureDetector::new(0.5, 0.0, 0.2).is_err());
        assert!(GestureDetector::new(0.5, -1.0, 0.2).is_err());
        assert!(GestureDetector::new(0.5, 1.0, 0.0).is_err());
        assert!(GestureDetector::new(f64::NAN, 1.0, 0.2).is_err());
        assert!(GestureDetector::new(0.5, 1.0, 0.2).is_ok());
    }

    #[test]
    fn test_single_fire_then_suppression() {
        let mut detector = GestureDetector::new(0.5, 1.0, 0.2).unwrap();
        let mut counter = Counter(0);

        // Sustained high signal: fires on the first epoch, then absorbs
        // crossings while the suppression count builds toward the
        // refractory limit.
        let fired: Vec<bool> = (0..8)
            .map(|_| detector.evaluate(0.9, &mut counter))
            .collect();

        assert!(fired[0]);
        assert!(fired[1..].iter().all(|&f| !f), "epochs 2-8 suppressed");
        assert_eq!(counter.0, 1, "only the initial firing within the window");

        // The 8th epoch tipped the count past the refractory window and
        // returned the detector to idle, so a still-high 9th epoch fires
        // again: the periodic re-arm.
        assert!(detector.evaluate(0.9, &mut counter));
        assert_eq!(counter.0, 2);
    }

    #[test]
    fn test_refractory_epochs_from_durations() {
        let detector = GestureDetector::new(0.5, 1.0, 0.2).unwrap();
        assert_eq!(detector.refractory_epochs(), 5);

        let detector = GestureDetector::new(0.25, 1.5, 0.05).unwrap();
        assert_eq!(detector.refractory_epochs(), 30);
    }

    #[test]
    fn test_periodic_refire_under_sustained_signal() {
        let mut detector = GestureDetector::new(0.5, 1.0, 0.2).unwrap();
        let mut counter = Counter(0);

        for _ in 0..20 {
            detector.evaluate(0.9, &mut counter);
        }
        // Re-arms roughly every buffer length; 20 epochs at 0.2s shift
        // against a 1.0s refractory window gives a fire every 7 epochs.
        assert!(counter.0 >= 2, "sustained signal re-fires periodically");
    }

    #[test]
    fn test_on_release_policy_holds_until_drop() {
        let mut detector = GestureDetector::new(0.5, 1.0, 0.2)
            .unwrap()
            .with_rearm(RearmPolicy::OnRelease);
        let mut counter = Counter(0);

        for _ in 0..50 {
            detector.evaluate(0.9, &mut counter);
        }
        assert_eq!(counter.0, 1, "no re-fire while the signal stays high");

        // Dropping below threshold re-arms immediately.
        detector.evaluate(0.1, &mut counter);
        detector.evaluate(0.9, &mut counter);
        assert_eq!(counter.0, 2);
    }

    #[test]
    fn test_reset_on_drop_below_threshold() {
        let mut detector = GestureDetector::new(0.5, 1.0, 0.2).unwrap();
        let mut counter = Counter(0);

        assert!(detector.evaluate(0.9, &mut counter));
        assert!(detector.is_suppressed());

        // A value at or below threshold returns the detector to idle, so
        // the next crossing fires again immediately.
        assert!(!detector.evaluate(0.5, &mut counter));
        assert!(!detector.is_suppressed());
        assert!(detector.evaluate(0.9, &mut counter));
        assert_eq!(counter.0, 2);
    }

    #[test]
    fn test_idle_below_threshold_is_noop() {
        let mut detector = GestureDetector::new(0.5, 1.0, 0.2).unwrap();
        let mut counter = Counter(0);

        for _ in 0..10 {
            assert!(!detector.evaluate(0.2, &mut counter));
        }
        assert_eq!(counter.0, 0);
    }

    #[test]
    fn test_closure_sink() {
        let mut detector = GestureDetector::new(0.5, 1.0, 0.2).unwrap();
        let mut fired = false;
        detector.evaluate(0.9, &mut || fired = true);
        assert!(fired);
    }

    #[test]
    fn test_end_to_end_refractory_scenario() {
        // threshold 0.25, 1.5s refractory at 0.05s shift: ~30 epochs.
        let mut detector = GestureDetector::new(0.25, 1.5, 0.05).unwrap();
        let mut counter = Counter(0);

        let mut values = vec![0.1; 5];
        values.extend(vec![0.3; 40]);
        values.extend(vec![0.1; 5]);

        for v in values {
            detector.evaluate(v, &mut counter);
        }

        // One fire at the start of the high run, one more ~30 epochs in,
        // nothing during the trailing low run.
        assert_eq!(counter.0, 2);
    }
}
