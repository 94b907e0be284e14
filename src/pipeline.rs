//! The acquisition pipeline: stream chunks in, gesture detections out.
//!
//! One pipeline owns one sliding buffer per analyzed channel, a feature
//! extractor, a smoother, and a gesture detector. It is driven by a chunk
//! receiver and stops when its cancellation token flips or the source
//! disconnects. Instances never share mutable state; run one pipeline per
//! stream (or per gesture) with its own detector.

use crate::config::Config;
use crate::core::buffer::{epoch_samples, BufferError, SlidingBuffer};
use crate::core::detector::{DetectorError, GestureDetector, GestureSink};
use crate::core::metrics::{FeatureExtractor, FeatureSmoother};
use crate::stream::types::{SampleChunk, StreamInfo, StreamKind};
use crate::telemetry::SharedSessionLog;
use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cooperative cancellation for a running pipeline.
///
/// Clones share the same flag; flip it from a Ctrl-C handler or another
/// thread and the loop exits after its current receive times out.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// One fired detection, kept for export at session end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// When the detection fired
    pub timestamp: DateTime<Utc>,
    /// Index of the epoch that fired, counted from session start
    pub epoch_index: u64,
    /// Smoothed feature value that crossed the threshold
    pub value: f64,
    /// Stream the detection came from
    pub stream: StreamKind,
}

/// Summary of a completed pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub epochs_evaluated: u64,
    pub detections: Vec<DetectionRecord>,
}

/// Errors from pipeline construction and execution.
#[derive(Debug)]
pub enum PipelineError {
    Buffer(BufferError),
    Detector(DetectorError),
    Config(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Buffer(e) => write!(f, "buffer error: {e}"),
            PipelineError::Detector(e) => write!(f, "detector error: {e}"),
            PipelineError::Config(e) => write!(f, "configuration error: {e}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<BufferError> for PipelineError {
    fn from(e: BufferError) -> Self {
        PipelineError::Buffer(e)
    }
}

impl From<DetectorError> for PipelineError {
    fn from(e: DetectorError) -> Self {
        PipelineError::Detector(e)
    }
}

/// Drives buffering, feature extraction, smoothing, and detection over a
/// chunk stream.
pub struct AcquisitionPipeline {
    stream: StreamKind,
    channels: Vec<usize>,
    // One buffer per analyzed channel, each holding buffer_length seconds.
    buffers: Vec<SlidingBuffer<f64>>,
    extractor: Box<dyn FeatureExtractor>,
    smoother: FeatureSmoother,
    detector: GestureDetector,
    epoch_len: usize,
    shift_len: usize,
    samples_since_eval: usize,
    epoch_index: u64,
    detections: Vec<DetectionRecord>,
    token: CancelToken,
}

impl AcquisitionPipeline {
    /// Build a pipeline from the agent configuration and the resolved
    /// stream metadata.
    pub fn new(
        config: &Config,
        info: &StreamInfo,
        extractor: Box<dyn FeatureExtractor>,
    ) -> Result<Self, PipelineError> {
        config
            .validate()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let buffer_len = epoch_samples(config.buffer_length_secs, info.sample_rate);
        let epoch_len = epoch_samples(config.epoch_length_secs, info.sample_rate);
        let shift_len = epoch_samples(config.shift_length_secs(), info.sample_rate).max(1);

        let buffers = config
            .channels
            .iter()
            .map(|_| SlidingBuffer::new(buffer_len, 0.0))
            .collect::<Result<Vec<_>, _>>()?;

        let smoother = FeatureSmoother::new(config.smoothing_epochs)?;
        let detector = GestureDetector::new(
            config.threshold,
            config.buffer_length_secs,
            config.shift_length_secs(),
        )?
        .with_rearm(config.rearm);

        Ok(Self {
            stream: info.kind,
            channels: config.channels.clone(),
            buffers,
            extractor,
            smoother,
            detector,
            epoch_len,
            shift_len,
            samples_since_eval: 0,
            epoch_index: 0,
            detections: Vec::new(),
            token: CancelToken::new(),
        })
    }

    /// Token that stops `run` when cancelled.
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Name of the feature extractor in use.
    pub fn feature_name(&self) -> &'static str {
        self.extractor.name()
    }

    /// Epochs the detector suppresses after a firing.
    pub fn refractory_epochs(&self) -> u32 {
        self.detector.refractory_epochs()
    }

    /// Drive the acquisition loop until cancellation or disconnect.
    ///
    /// `sink` fires on each gesture detection; `on_epoch` is called with
    /// the epoch index and smoothed feature value after every evaluation,
    /// for status output or plotting collaborators.
    pub fn run<S, F>(
        &mut self,
        receiver: &Receiver<SampleChunk>,
        sink: &mut S,
        mut on_epoch: F,
        log: &SharedSessionLog,
    ) -> Result<RunSummary, PipelineError>
    where
        S: GestureSink,
        F: FnMut(u64, f64),
    {
        while !self.token.is_cancelled() {
            match receiver.recv_timeout(Duration::from_millis(100)) {
                Ok(chunk) => {
                    log.record_chunk(chunk.sample_count() as u64);
                    self.push_chunk(&chunk);

                    if self.samples_since_eval >= self.shift_len {
                        self.samples_since_eval = 0;
                        let (value, fired) = self.evaluate_epoch(sink)?;
                        log.record_epoch();
                        if fired {
                            log.record_detection();
                        }
                        on_epoch(self.epoch_index, value);
                        self.epoch_index += 1;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    // No samples yet; check the token again.
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        Ok(RunSummary {
            epochs_evaluated: self.epoch_index,
            detections: std::mem::take(&mut self.detections),
        })
    }

    /// Append one chunk's samples to the per-channel buffers.
    fn push_chunk(&mut self, chunk: &SampleChunk) {
        let mut pushed = 0;
        for (buffer, &channel) in self.buffers.iter_mut().zip(&self.channels) {
            if let Some(column) = chunk.channels.get(channel) {
                buffer.append(column);
                pushed = column.len();
            }
        }
        self.samples_since_eval += pushed;
    }

    /// Extract, smooth, and evaluate one epoch over the freshest samples.
    fn evaluate_epoch<S: GestureSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<(f64, bool), PipelineError> {
        let epoch: Vec<&[f64]> = self
            .buffers
            .iter()
            .map(|b| b.last_n(self.epoch_len))
            .collect::<Result<Vec<_>, _>>()?;

        let raw = self.extractor.extract(&epoch);
        let value = self.smoother.push(raw);

        let fired = self.detector.evaluate(value, sink);
        if fired {
            self.detections.push(DetectionRecord {
                timestamp: Utc::now(),
                epoch_index: self.epoch_index,
                value,
                stream: self.stream,
            });
        }
        Ok((value, fired))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::DiffPeak;
    use crate::telemetry::create_shared_log;
    use crossbeam_channel::unbounded;

    fn accel_config() -> Config {
        Config {
            stream: StreamKind::Accelerometer,
            channels: vec![0],
            buffer_length_secs: 1.5,
            epoch_length_secs: 1.0,
            overlap_length_secs: 0.95,
            threshold: 0.25,
            smoothing_epochs: 1,
            ..Config::default()
        }
    }

    fn flat_chunk(len: usize, value: f64) -> SampleChunk {
        SampleChunk::new(vec![vec![value; len], vec![0.0; len], vec![0.0; len]])
    }

    fn spike_chunk(len: usize) -> SampleChunk {
        let mut column = vec![0.0; len];
        column[len / 2] = 1.0;
        SampleChunk::new(vec![column, vec![0.0; len], vec![0.0; len]])
    }

    #[test]
    fn test_pipeline_rejects_invalid_config() {
        let mut config = accel_config();
        config.overlap_length_secs = 2.0;
        let info = StreamInfo::new(StreamKind::Accelerometer);
        assert!(AcquisitionPipeline::new(&config, &info, Box::new(DiffPeak)).is_err());
    }

    #[test]
    fn test_pipeline_detects_spike_and_stays_quiet_on_flat_signal() {
        let config = accel_config();
        let info = StreamInfo::new(StreamKind::Accelerometer);
        let mut pipeline =
            AcquisitionPipeline::new(&config, &info, Box::new(DiffPeak)).unwrap();

        let (sender, receiver) = unbounded();
        let log = create_shared_log();

        // Fill past one epoch with flat data, spike once, then go flat and
        // drop the sender so run() returns.
        for _ in 0..30 {
            sender.send(flat_chunk(12, 0.0)).unwrap();
        }
        sender.send(spike_chunk(12)).unwrap();
        for _ in 0..5 {
            sender.send(flat_chunk(12, 0.0)).unwrap();
        }
        drop(sender);

        let mut fired = 0u32;
        let summary = pipeline
            .run(&receiver, &mut || fired += 1, |_, _| {}, &log)
            .unwrap();

        assert_eq!(fired, 1, "one spike, one detection");
        assert_eq!(summary.detections.len(), 1);
        assert!(summary.epochs_evaluated > 0);
        assert_eq!(log.stats().gestures_detected, 1);
    }

    #[test]
    fn test_pipeline_cancellation_stops_run() {
        let config = accel_config();
        let info = StreamInfo::new(StreamKind::Accelerometer);
        let mut pipeline =
            AcquisitionPipeline::new(&config, &info, Box::new(DiffPeak)).unwrap();

        let (_sender, receiver) = unbounded::<SampleChunk>();
        let token = pipeline.cancel_token();
        let log = create_shared_log();

        token.cancel();
        let summary = pipeline
            .run(&receiver, &mut || {}, |_, _| {}, &log)
            .unwrap();
        assert_eq!(summary.epochs_evaluated, 0);
    }
}
