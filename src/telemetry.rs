//! Session telemetry for the Neurosense agent.
//!
//! Tracks what the agent did during a session — chunks received, samples
//! buffered, epochs evaluated, gestures detected — without retaining any
//! raw signal data. Counters persist across sessions as a small JSON file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Telemetry counters for the current session.
#[derive(Debug)]
pub struct SessionLog {
    /// Number of sample chunks received from the stream source
    chunks_received: AtomicU64,
    /// Number of individual samples pushed into buffers
    samples_buffered: AtomicU64,
    /// Number of epochs evaluated by the detector
    epochs_evaluated: AtomicU64,
    /// Number of gesture detections fired
    gestures_detected: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Unique id for this session
    session_id: String,
    /// Device identifier (hostname plus instance suffix)
    device_id: String,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl SessionLog {
    /// Create a new session log.
    pub fn new() -> Self {
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown-host".to_string());

        Self {
            chunks_received: AtomicU64::new(0),
            samples_buffered: AtomicU64::new(0),
            epochs_evaluated: AtomicU64::new(0),
            gestures_detected: AtomicU64::new(0),
            session_start: Utc::now(),
            session_id: format!("SESS-{}", Utc::now().timestamp_millis()),
            device_id: format!(
                "{}-{}",
                hostname,
                &uuid::Uuid::new_v4().to_string()[..8]
            ),
            persist_path: None,
        }
    }

    /// Create a session log with persistence.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        // Try to load existing cumulative stats
        if let Err(e) = log.load() {
            eprintln!("Note: Could not load previous session stats: {e}");
        }

        log
    }

    /// Record a received sample chunk and the samples it carried.
    pub fn record_chunk(&self, sample_count: u64) {
        self.chunks_received.fetch_add(1, Ordering::Relaxed);
        self.samples_buffered
            .fetch_add(sample_count, Ordering::Relaxed);
    }

    /// Record an evaluated epoch.
    pub fn record_epoch(&self) {
        self.epochs_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fired gesture detection.
    pub fn record_detection(&self) {
        self.gestures_detected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            chunks_received: self.chunks_received.load(Ordering::Relaxed),
            samples_buffered: self.samples_buffered.load(Ordering::Relaxed),
            epochs_evaluated: self.epochs_evaluated.load(Ordering::Relaxed),
            gestures_detected: self.gestures_detected.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds() as u64,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Chunks received: {}\n\
             - Samples buffered: {}\n\
             - Epochs evaluated: {}\n\
             - Gestures detected: {}\n\
             - Session duration: {} seconds\n\
             \n\
             No raw signal data is retained beyond the current buffer.",
            stats.chunks_received,
            stats.samples_buffered,
            stats.epochs_evaluated,
            stats.gestures_detected,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                chunks_received: stats.chunks_received,
                samples_buffered: stats.samples_buffered,
                epochs_evaluated: stats.epochs_evaluated,
                gestures_detected: stats.gestures_detected,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.chunks_received
                    .store(persisted.chunks_received, Ordering::Relaxed);
                self.samples_buffered
                    .store(persisted.samples_buffered, Ordering::Relaxed);
                self.epochs_evaluated
                    .store(persisted.epochs_evaluated, Ordering::Relaxed);
                self.gestures_detected
                    .store(persisted.gestures_detected, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.chunks_received.store(0, Ordering::Relaxed);
        self.samples_buffered.store(0, Ordering::Relaxed);
        self.epochs_evaluated.store(0, Ordering::Relaxed);
        self.gestures_detected.store(0, Ordering::Relaxed);
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of session statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub chunks_received: u64,
    pub samples_buffered: u64,
    pub epochs_evaluated: u64,
    pub gestures_detected: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    chunks_received: u64,
    samples_buffered: u64,
    epochs_evaluated: u64,
    gestures_detected: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared session log.
pub type SharedSessionLog = Arc<SessionLog>;

/// Create a new shared session log.
pub fn create_shared_log() -> SharedSessionLog {
    Arc::new(SessionLog::new())
}

/// Create a new shared session log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedSessionLog {
    Arc::new(SessionLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_log_counting() {
        let log = SessionLog::new();

        log.record_chunk(12);
        log.record_chunk(12);
        log.record_epoch();
        log.record_detection();

        let stats = log.stats();
        assert_eq!(stats.chunks_received, 2);
        assert_eq!(stats.samples_buffered, 24);
        assert_eq!(stats.epochs_evaluated, 1);
        assert_eq!(stats.gestures_detected, 1);
    }

    #[test]
    fn test_session_log_reset() {
        let log = SessionLog::new();

        log.record_chunk(100);
        log.record_detection();
        log.reset();

        let stats = log.stats();
        assert_eq!(stats.chunks_received, 0);
        assert_eq!(stats.samples_buffered, 0);
        assert_eq!(stats.gestures_detected, 0);
    }

    #[test]
    fn test_summary_format() {
        let log = SessionLog::new();
        let summary = log.summary();

        assert!(summary.contains("Chunks received"));
        assert!(summary.contains("Gestures detected"));
        assert!(summary.contains("No raw signal data"));
    }

    #[test]
    fn test_ids_are_populated() {
        let log = SessionLog::new();
        assert!(log.session_id().starts_with("SESS-"));
        assert!(!log.device_id().is_empty());
    }
}
