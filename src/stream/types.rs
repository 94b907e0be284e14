//! Sample stream types shared by the acquisition sources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which headset stream a source delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Four-electrode EEG stream.
    Eeg,
    /// Three-axis accelerometer stream.
    Accelerometer,
}

impl StreamKind {
    /// Nominal sampling rate of the stream in Hz.
    pub fn sample_rate(&self) -> f64 {
        match self {
            StreamKind::Eeg => 256.0,
            StreamKind::Accelerometer => 52.0,
        }
    }

    /// Number of channels the stream carries.
    pub fn channel_count(&self) -> usize {
        match self {
            StreamKind::Eeg => 4,
            StreamKind::Accelerometer => 3,
        }
    }

    /// Channel labels in stream order.
    pub fn channel_labels(&self) -> &'static [&'static str] {
        match self {
            StreamKind::Eeg => &["left ear", "left forehead", "right forehead", "right ear"],
            StreamKind::Accelerometer => &["x", "y", "z"],
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamKind::Eeg => write!(f, "EEG"),
            StreamKind::Accelerometer => write!(f, "accelerometer"),
        }
    }
}

/// Metadata a source reports once its stream is resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInfo {
    pub kind: StreamKind,
    pub sample_rate: f64,
    pub channel_count: usize,
}

impl StreamInfo {
    pub fn new(kind: StreamKind) -> Self {
        Self {
            kind,
            sample_rate: kind.sample_rate(),
            channel_count: kind.channel_count(),
        }
    }
}

/// A batch of newly arrived samples.
///
/// `channels` holds one column per channel; every column has the same
/// number of samples, oldest first. Chunks arrive at irregular intervals
/// and with varying sample counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleChunk {
    /// Arrival time of the last sample in the chunk.
    pub timestamp: DateTime<Utc>,
    /// Per-channel sample columns.
    pub channels: Vec<Vec<f64>>,
}

impl SampleChunk {
    pub fn new(channels: Vec<Vec<f64>>) -> Self {
        Self {
            timestamp: Utc::now(),
            channels,
        }
    }

    /// Samples per channel in this chunk.
    pub fn sample_count(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
