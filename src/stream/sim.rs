//! Simulated headset stream source.
//!
//! The physical device driver and stream discovery protocol are outside
//! this crate. This source stands in for them: a producer thread emits
//! chunks with the nominal geometry and cadence of the real streams, so
//! the buffering, feature, and detection pipeline can be exercised without
//! hardware.

use crate::stream::types::{SampleChunk, StreamInfo, StreamKind};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Configuration for the simulated source.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub kind: StreamKind,
    /// Samples per emitted chunk.
    pub chunk_size: usize,
    /// Interval between shake bursts on the accelerometer stream, in
    /// chunks. Zero disables bursts.
    pub burst_every_chunks: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: StreamKind::Accelerometer,
            chunk_size: 12,
            burst_every_chunks: 40,
        }
    }
}

/// Errors that can occur while running a source.
#[derive(Debug)]
pub enum StreamError {
    AlreadyRunning,
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::AlreadyRunning => write!(f, "stream source is already running"),
        }
    }
}

impl std::error::Error for StreamError {}

/// A stream source backed by a synthetic signal generator.
pub struct SimulatedSource {
    config: SourceConfig,
    sender: Sender<SampleChunk>,
    receiver: Receiver<SampleChunk>,
    running: Arc<AtomicBool>,
    producer: Option<thread::JoinHandle<()>>,
}

impl SimulatedSource {
    pub fn new(config: SourceConfig) -> Self {
        let (sender, receiver) = bounded(1_000);
        Self {
            config,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            producer: None,
        }
    }

    /// Stream metadata, as a device driver would report after resolving.
    pub fn info(&self) -> StreamInfo {
        StreamInfo::new(self.config.kind)
    }

    /// Start the producer thread.
    pub fn start(&mut self) -> Result<(), StreamError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(StreamError::AlreadyRunning);
        }
        self.running.store(true, Ordering::SeqCst);

        let running = self.running.clone();
        let sender = self.sender.clone();
        let config = self.config.clone();

        let handle = thread::spawn(move || {
            let sample_rate = config.kind.sample_rate();
            let channel_count = config.kind.channel_count();
            let chunk_interval =
                Duration::from_secs_f64(config.chunk_size as f64 / sample_rate);

            let mut phase: u64 = 0;
            let mut chunk_index: usize = 0;

            while running.load(Ordering::SeqCst) {
                let bursting = config.burst_every_chunks > 0
                    && chunk_index % config.burst_every_chunks == 0
                    && chunk_index > 0;

                let chunk = synthesize_chunk(
                    config.kind,
                    channel_count,
                    config.chunk_size,
                    sample_rate,
                    &mut phase,
                    bursting,
                );

                // Drop chunks if the consumer stalls; the real stream does
                // not wait either.
                let _ = sender.try_send(chunk);

                chunk_index += 1;
                thread::sleep(chunk_interval);
            }
        });

        self.producer = Some(handle);
        Ok(())
    }

    /// Stop the producer thread and wait for it to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.producer.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Receiver end of the chunk channel.
    pub fn receiver(&self) -> &Receiver<SampleChunk> {
        &self.receiver
    }
}

impl Drop for SimulatedSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Build one chunk of synthetic samples.
///
/// EEG channels carry a 10 Hz oscillation plus deterministic jitter; the
/// accelerometer carries slow sway with an occasional sharp burst so the
/// diff-peak feature has something to find.
fn synthesize_chunk(
    kind: StreamKind,
    channel_count: usize,
    chunk_size: usize,
    sample_rate: f64,
    phase: &mut u64,
    bursting: bool,
) -> SampleChunk {
    let mut channels = vec![Vec::with_capacity(chunk_size); channel_count];

    for i in 0..chunk_size {
        let t = (*phase + i as u64) as f64 / sample_rate;
        // Cheap deterministic jitter; no RNG dependency needed.
        let jitter = ((*phase + i as u64).wrapping_mul(2654435761) % 1000) as f64 / 1000.0 - 0.5;

        for (ch, column) in channels.iter_mut().enumerate() {
            let sample = match kind {
                StreamKind::Eeg => {
                    (2.0 * std::f64::consts::PI * 10.0 * t).sin() * 20.0
                        + jitter * 5.0
                        + ch as f64
                }
                StreamKind::Accelerometer => {
                    let base = (2.0 * std::f64::consts::PI * 0.3 * t).sin() * 0.05 + jitter * 0.01;
                    if bursting && i == chunk_size / 2 && ch == 0 {
                        base + 1.0
                    } else {
                        base
                    }
                }
            };
            column.push(sample);
        }
    }

    *phase += chunk_size as u64;
    SampleChunk::new(channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_start_stop() {
        let mut source = SimulatedSource::new(SourceConfig::default());
        assert!(!source.is_running());

        source.start().unwrap();
        assert!(source.is_running());
        assert!(matches!(source.start(), Err(StreamError::AlreadyRunning)));

        source.stop();
        assert!(!source.is_running());
    }

    #[test]
    fn test_source_emits_declared_geometry() {
        let mut source = SimulatedSource::new(SourceConfig {
            kind: StreamKind::Eeg,
            chunk_size: 8,
            burst_every_chunks: 0,
        });
        source.start().unwrap();

        let chunk = source
            .receiver()
            .recv_timeout(Duration::from_secs(2))
            .expect("no chunk from simulated source");
        source.stop();

        assert_eq!(chunk.channel_count(), StreamKind::Eeg.channel_count());
        assert_eq!(chunk.sample_count(), 8);
    }

    #[test]
    fn test_burst_appears_on_first_axis() {
        let mut phase = 0;
        let chunk = synthesize_chunk(StreamKind::Accelerometer, 3, 10, 52.0, &mut phase, true);
        let peak = chunk.channels[0]
            .iter()
            .fold(0.0f64, |acc, &s| acc.max(s.abs()));
        assert!(peak > 0.5, "burst sample should dominate the chunk");
    }
}
