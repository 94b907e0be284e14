//! Per-epoch feature extraction and smoothing.
//!
//! A feature extractor reduces one epoch of multi-channel samples to a
//! single scalar for the gesture detector. Spectral band-power extraction
//! lives outside this crate; callers plug their own extractor in through
//! the `FeatureExtractor` trait. The extractors shipped here are the
//! time-domain ones the accelerometer pipeline uses.

use crate::core::buffer::{BufferError, SlidingBuffer};
use statrs::statistics::Statistics;

/// Reduces one epoch of samples to a scalar feature value.
///
/// `epoch` is one slice per channel, each holding the same number of
/// samples, oldest first.
pub trait FeatureExtractor {
    fn extract(&mut self, epoch: &[&[f64]]) -> f64;

    /// Human-readable name for status output.
    fn name(&self) -> &'static str;
}

/// Peak of the absolute first difference, after normalizing the epoch to
/// the [-1, 1] range.
///
/// A sharp movement (a head shake on an accelerometer axis) shows up as a
/// large sample-to-sample jump; slow drift does not. Uses the first
/// channel of the epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffPeak;

impl FeatureExtractor for DiffPeak {
    fn extract(&mut self, epoch: &[&[f64]]) -> f64 {
        let Some(samples) = epoch.first() else {
            return 0.0;
        };

        let peak_abs = samples.iter().fold(0.0f64, |acc, &s| acc.max(s.abs()));
        if peak_abs == 0.0 {
            return 0.0;
        }

        samples
            .windows(2)
            .map(|pair| ((pair[1] - pair[0]) / peak_abs).abs())
            .fold(0.0f64, f64::max)
    }

    fn name(&self) -> &'static str {
        "diff-peak"
    }
}

/// Root-mean-square amplitude across all channels of the epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct RmsAmplitude;

impl FeatureExtractor for RmsAmplitude {
    fn extract(&mut self, epoch: &[&[f64]]) -> f64 {
        let mut sum_sq = 0.0;
        let mut count = 0usize;
        for channel in epoch {
            for &s in channel.iter() {
                sum_sq += s * s;
                count += 1;
            }
        }
        if count == 0 {
            return 0.0;
        }
        (sum_sq / count as f64).sqrt()
    }

    fn name(&self) -> &'static str {
        "rms"
    }
}

/// Smooths a feature series by averaging over the last few epochs.
///
/// Internally a sliding buffer of the most recent feature values, seeded
/// with zeros; this mirrors how band powers are averaged across epochs to
/// suppress noise before thresholding.
#[derive(Debug, Clone)]
pub struct FeatureSmoother {
    window: SlidingBuffer<f64>,
}

impl FeatureSmoother {
    /// Average over the last `epochs` feature values. `epochs` must be at
    /// least 1; an `epochs` of 1 passes values through unchanged.
    pub fn new(epochs: usize) -> Result<Self, BufferError> {
        Ok(Self {
            window: SlidingBuffer::new(epochs, 0.0)?,
        })
    }

    /// Push a new feature value and return the smoothed result.
    pub fn push(&mut self, value: f64) -> f64 {
        self.window.append(&[value]);
        self.window.as_slice().mean()
    }

    /// Standard deviation of the current smoothing window.
    pub fn std_dev(&self) -> f64 {
        self.window.as_slice().std_dev()
    }

    pub fn window_len(&self) -> usize {
        self.window.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_peak_flat_signal_is_zero() {
        let mut extractor = DiffPeak;
        let samples = vec![3.0; 16];
        let epoch: Vec<&[f64]> = vec![&samples];
        assert_eq!(extractor.extract(&epoch), 0.0);
    }

    #[test]
    fn test_diff_peak_spike() {
        let mut extractor = DiffPeak;
        // Normalized by peak |2.0|, the 0 -> 2 jump gives a diff of 1.0.
        let samples = vec![0.0, 0.0, 2.0, 0.0, 0.0];
        let epoch: Vec<&[f64]> = vec![&samples];
        let value = extractor.extract(&epoch);
        assert!((value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_diff_peak_empty_epoch() {
        let mut extractor = DiffPeak;
        assert_eq!(extractor.extract(&[]), 0.0);
        let empty: &[f64] = &[];
        assert_eq!(extractor.extract(&[empty]), 0.0);
    }

    #[test]
    fn test_rms_amplitude() {
        let mut extractor = RmsAmplitude;
        let a = vec![3.0, 3.0];
        let b = vec![4.0, 4.0];
        let epoch: Vec<&[f64]> = vec![&a, &b];
        // sqrt((9+9+16+16)/4) = sqrt(12.5)
        let value = extractor.extract(&epoch);
        assert!((value - 12.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_smoother_averages_window() {
        let mut smoother = FeatureSmoother::new(4).unwrap();
        // Window starts as zeros, so the first pushes are pulled down.
        assert!((smoother.push(4.0) - 1.0).abs() < 1e-12);
        smoother.push(4.0);
        smoother.push(4.0);
        let value = smoother.push(4.0);
        assert!((value - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_smoother_passthrough_with_single_epoch() {
        let mut smoother = FeatureSmoother::new(1).unwrap();
        assert_eq!(smoother.push(0.7), 0.7);
        assert_eq!(smoother.push(0.1), 0.1);
    }

    #[test]
    fn test_smoother_rejects_zero_epochs() {
        assert!(FeatureSmoother::new(0).is_err());
    }

    #[test]
    fn test_smoother_window_stats() {
        let mut smoother = FeatureSmoother::new(2).unwrap();
        assert_eq!(smoother.window_len(), 2);

        smoother.push(1.0);
        smoother.push(3.0);
        // Window holds [1.0, 3.0]; statrs reports the corrected sample
        // standard deviation, sqrt(2).
        assert!((smoother.std_dev() - std::f64::consts::SQRT_2).abs() < 1e-12);
    }
}
