//! Neurosense Agent - Real-time biosignal acquisition and gesture detection.
//!
//! This library turns an irregular stream of raw headset samples (EEG or
//! accelerometer) into fixed-size overlapping analysis epochs, derives a
//! scalar feature per epoch, and debounces threshold crossings into
//! discrete gesture events.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Neurosense Agent                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌──────────┐ │
//! │  │  Stream  │──▶│  Sliding  │──▶│ Feature  │──▶│ Gesture  │ │
//! │  │  source  │   │  buffers  │   │ + smooth │   │ detector │ │
//! │  └──────────┘   └───────────┘   └──────────┘   └──────────┘ │
//! │       │                                             │        │
//! │       ▼                                             ▼        │
//! │  ┌──────────┐                                 ┌──────────┐  │
//! │  │ Session  │                                 │Detection │  │
//! │  │telemetry │                                 │ records  │  │
//! │  └──────────┘                                 └──────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The device driver and spectral band-power extraction are external
//! collaborators: sources deliver `SampleChunk`s over a channel, and any
//! `FeatureExtractor` implementation can stand where the shipped
//! time-domain extractors do.
//!
//! # Example
//!
//! ```no_run
//! use neurosense_agent::{
//!     config::Config,
//!     core::DiffPeak,
//!     pipeline::AcquisitionPipeline,
//!     stream::{SimulatedSource, SourceConfig},
//!     telemetry::create_shared_log,
//! };
//!
//! let config = Config::default();
//! let mut source = SimulatedSource::new(SourceConfig::default());
//! let info = source.info();
//!
//! let mut pipeline =
//!     AcquisitionPipeline::new(&config, &info, Box::new(DiffPeak)).expect("valid config");
//! let log = create_shared_log();
//!
//! source.start().expect("failed to start source");
//! let summary = pipeline
//!     .run(
//!         source.receiver(),
//!         &mut || println!("shake detected"),
//!         |_, _| {},
//!         &log,
//!     )
//!     .expect("pipeline run failed");
//! println!("{} detections", summary.detections.len());
//! ```

pub mod config;
pub mod core;
pub mod pipeline;
pub mod stream;
pub mod telemetry;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use crate::core::{
    epoch_samples, BufferError, DetectorError, DiffPeak, FeatureExtractor, FeatureSmoother,
    GestureDetector, GestureSink, RearmPolicy, RmsAmplitude, SlidingBuffer,
};
pub use pipeline::{
    AcquisitionPipeline, CancelToken, DetectionRecord, PipelineError, RunSummary,
};
pub use stream::{SampleChunk, SimulatedSource, SourceConfig, StreamError, StreamInfo, StreamKind};
pub use telemetry::{SessionLog, SessionStats, SharedSessionLog};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
