//! Sample acquisition for the Neurosense agent.
//!
//! Sources deliver batches of raw samples over a bounded channel. The
//! physical headset driver is an external collaborator; the simulated
//! source here reproduces its geometry and cadence for development and
//! tests.

pub mod sim;
pub mod types;

// Re-export commonly used types
pub use sim::{SimulatedSource, SourceConfig, StreamError};
pub use types::{SampleChunk, StreamInfo, StreamKind};
