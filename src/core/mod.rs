//! Core signal handling for the Neurosense agent.
//!
//! This module contains:
//! - Sliding sample buffers for epoching an irregular stream
//! - Debounced gesture detection over per-epoch feature values
//! - Feature extraction and smoothing helpers

pub mod buffer;
pub mod detector;
pub mod metrics;

// Re-export commonly used types
pub use buffer::{epoch_samples, BufferError, SlidingBuffer};
pub use detector::{DetectorError, GestureDetector, GestureSink, RearmPolicy};
pub use metrics::{DiffPeak, FeatureExtractor, FeatureSmoother, RmsAmplitude};
