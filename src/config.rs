//! Configuration for the Neurosense agent.

use crate::core::RearmPolicy;
use crate::stream::StreamKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Which headset stream to acquire
    pub stream: StreamKind,

    /// Indices of the channels to analyze, in stream order
    pub channels: Vec<usize>,

    /// Length of the raw sample buffer (in seconds)
    pub buffer_length_secs: f64,

    /// Length of one analysis epoch (in seconds)
    pub epoch_length_secs: f64,

    /// Overlap between consecutive epochs (in seconds); the epoch shift is
    /// `epoch_length_secs - overlap_length_secs`
    pub overlap_length_secs: f64,

    /// Detection threshold applied to the smoothed feature value
    pub threshold: f64,

    /// Number of epochs to average when smoothing the feature series
    pub smoothing_epochs: usize,

    /// How the detector re-arms under a sustained signal
    pub rearm: RearmPolicy,

    /// Path for exporting detection records
    pub export_path: PathBuf,

    /// Path for storing state and session telemetry
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("neurosense-agent");

        // Defaults match the accelerometer shake pipeline: a 1.5s buffer
        // shifting by 0.05s, thresholding the diff-peak feature at 0.25.
        Self {
            stream: StreamKind::Accelerometer,
            channels: vec![0],
            buffer_length_secs: 1.5,
            epoch_length_secs: 1.0,
            overlap_length_secs: 0.95,
            threshold: 0.25,
            smoothing_epochs: 1,
            rearm: RearmPolicy::Periodic,
            export_path: data_dir.join("exports"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// The time advance between consecutive epochs, in seconds.
    pub fn shift_length_secs(&self) -> f64 {
        self.epoch_length_secs - self.overlap_length_secs
    }

    /// Check the timing parameters for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.buffer_length_secs > 0.0) {
            return Err(ConfigError::InvalidParameter(
                "buffer_length_secs must be positive".to_string(),
            ));
        }
        if !(self.epoch_length_secs > 0.0) {
            return Err(ConfigError::InvalidParameter(
                "epoch_length_secs must be positive".to_string(),
            ));
        }
        if self.epoch_length_secs > self.buffer_length_secs {
            return Err(ConfigError::InvalidParameter(
                "epoch_length_secs cannot exceed buffer_length_secs".to_string(),
            ));
        }
        if !(self.shift_length_secs() > 0.0) {
            return Err(ConfigError::InvalidParameter(
                "overlap_length_secs must be smaller than epoch_length_secs".to_string(),
            ));
        }
        if self.smoothing_epochs == 0 {
            return Err(ConfigError::InvalidParameter(
                "smoothing_epochs must be at least 1".to_string(),
            ));
        }
        if self.channels.is_empty() {
            return Err(ConfigError::InvalidParameter(
                "at least one channel must be selected".to_string(),
            ));
        }
        let channel_count = self.stream.channel_count();
        if let Some(&bad) = self.channels.iter().find(|&&c| c >= channel_count) {
            return Err(ConfigError::InvalidParameter(format!(
                "channel index {bad} out of range for {} stream ({channel_count} channels)",
                self.stream
            )));
        }
        Ok(())
    }

    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("neurosense-agent")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidParameter(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidParameter(e) => write!(f, "Invalid parameter: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!((config.shift_length_secs() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_validation_rejects_bad_durations() {
        let mut config = Config::default();
        config.buffer_length_secs = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.overlap_length_secs = config.epoch_length_secs;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.epoch_length_secs = config.buffer_length_secs + 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_channels() {
        let mut config = Config::default();
        config.channels = vec![];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.channels = vec![3]; // accelerometer has channels 0..=2
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.stream, config.stream);
        assert_eq!(restored.channels, config.channels);
        assert_eq!(restored.rearm, config.rearm);
        assert_eq!(restored.threshold, config.threshold);
    }
}
