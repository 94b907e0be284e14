//! Fixed-capacity sliding buffer over an append-only sample stream.
//!
//! The same buffer type serves two jobs: holding the most recent seconds of
//! raw samples for a single channel, and holding the last few derived
//! feature values for smoothing. After construction the buffer always
//! contains exactly `capacity` elements; every append evicts the oldest
//! elements one-for-one.

use std::fmt;

/// Errors from sliding-buffer operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Capacity of zero was requested at construction.
    InvalidCapacity,
    /// More samples were requested than the buffer holds.
    InvalidLength { requested: usize, available: usize },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::InvalidCapacity => write!(f, "buffer capacity must be at least 1"),
            BufferError::InvalidLength {
                requested,
                available,
            } => write!(
                f,
                "requested {requested} samples but only {available} are available"
            ),
        }
    }
}

impl std::error::Error for BufferError {}

/// A fixed-length window over the most recent samples of a stream.
///
/// Ordering is oldest to newest. Generic over the element type so the same
/// structure buffers raw `f64` samples and derived feature values alike.
#[derive(Debug, Clone)]
pub struct SlidingBuffer<T> {
    samples: Vec<T>,
    capacity: usize,
}

impl<T: Clone> SlidingBuffer<T> {
    /// Create a buffer of `capacity` elements, all set to `fill`.
    pub fn new(capacity: usize, fill: T) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::InvalidCapacity);
        }
        Ok(Self {
            samples: vec![fill; capacity],
            capacity,
        })
    }

    /// Create a buffer from an initial set of samples. The buffer capacity
    /// becomes the length of `samples`, which must be non-empty.
    pub fn from_samples(samples: Vec<T>) -> Result<Self, BufferError> {
        if samples.is_empty() {
            return Err(BufferError::InvalidCapacity);
        }
        let capacity = samples.len();
        Ok(Self { samples, capacity })
    }

    /// Append a batch of new samples, evicting the oldest.
    ///
    /// If the batch is at least as large as the buffer, the buffer becomes
    /// the last `capacity` samples of the batch. Returns the index where the
    /// newly appended region begins, so callers can tell new data from
    /// carried-over data. An empty batch is a no-op and returns `capacity`
    /// (there is no new region).
    pub fn append(&mut self, new_samples: &[T]) -> usize {
        if new_samples.is_empty() {
            return self.capacity;
        }

        if new_samples.len() >= self.capacity {
            let start = new_samples.len() - self.capacity;
            self.samples.clear();
            self.samples.extend_from_slice(&new_samples[start..]);
            return 0;
        }

        self.samples.drain(..new_samples.len());
        self.samples.extend_from_slice(new_samples);
        self.capacity - new_samples.len()
    }

    /// Return the most recent `n` samples, oldest first.
    ///
    /// Requests larger than the buffer fail with `InvalidLength` rather than
    /// silently truncating; callers that want fewer samples ask for fewer.
    pub fn last_n(&self, n: usize) -> Result<&[T], BufferError> {
        if n > self.samples.len() {
            return Err(BufferError::InvalidLength {
                requested: n,
                available: self.samples.len(),
            });
        }
        Ok(&self.samples[self.samples.len() - n..])
    }

    /// The full window contents, oldest first.
    pub fn as_slice(&self) -> &[T] {
        &self.samples
    }

    /// The fixed capacity chosen at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current length; always equals `capacity()`.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Number of samples covered by `duration_secs` at `sample_rate` Hz.
///
/// This is the duration-to-sample-count conversion callers use to size
/// buffers and to request one epoch's worth of data.
pub fn epoch_samples(duration_secs: f64, sample_rate: f64) -> usize {
    (duration_secs * sample_rate).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            SlidingBuffer::<f64>::new(0, 0.0).unwrap_err(),
            BufferError::InvalidCapacity
        );
        assert!(SlidingBuffer::<f64>::from_samples(Vec::new()).is_err());
    }

    #[test]
    fn test_from_samples_seeds_window() {
        let mut buffer = SlidingBuffer::from_samples(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(buffer.capacity(), 3);
        assert_eq!(buffer.as_slice(), &[1.0, 2.0, 3.0]);

        buffer.append(&[4.0]);
        assert_eq!(buffer.as_slice(), &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_length_invariant() {
        let mut buffer = SlidingBuffer::new(4, 0.0).unwrap();
        assert_eq!(buffer.len(), 4);

        buffer.append(&[1.0]);
        assert_eq!(buffer.len(), 4);
        buffer.append(&[2.0, 3.0, 4.0]);
        assert_eq!(buffer.len(), 4);
        buffer.append(&[5.0; 10]);
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn test_append_preserves_order() {
        let mut buffer = SlidingBuffer::new(3, 0.0).unwrap();

        let offset = buffer.append(&[1.0, 2.0]);
        assert_eq!(buffer.as_slice(), &[0.0, 1.0, 2.0]);
        assert_eq!(offset, 1);

        let offset = buffer.append(&[3.0]);
        assert_eq!(buffer.as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(offset, 2);
    }

    #[test]
    fn test_oversized_batch_keeps_tail() {
        let mut buffer = SlidingBuffer::new(3, 0.0).unwrap();
        buffer.append(&[1.0, 2.0]);

        let offset = buffer.append(&[4.0, 5.0, 6.0, 7.0]);
        assert_eq!(buffer.as_slice(), &[5.0, 6.0, 7.0]);
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_empty_append_is_noop() {
        let mut buffer = SlidingBuffer::new(3, 1.0).unwrap();
        let before = buffer.as_slice().to_vec();

        let offset = buffer.append(&[]);
        assert_eq!(buffer.as_slice(), before.as_slice());
        assert_eq!(offset, 3);
    }

    #[test]
    fn test_capacity_one_keeps_latest() {
        let mut buffer = SlidingBuffer::new(1, 0.0).unwrap();
        buffer.append(&[1.0]);
        assert_eq!(buffer.as_slice(), &[1.0]);
        buffer.append(&[2.0, 3.0]);
        assert_eq!(buffer.as_slice(), &[3.0]);
    }

    #[test]
    fn test_last_n_strict_and_idempotent() {
        let mut buffer = SlidingBuffer::new(4, 0.0).unwrap();
        buffer.append(&[1.0, 2.0]);

        let first = buffer.last_n(3).unwrap().to_vec();
        let second = buffer.last_n(3).unwrap().to_vec();
        assert_eq!(first, second);
        assert_eq!(first, vec![0.0, 1.0, 2.0]);

        assert_eq!(buffer.last_n(0).unwrap(), &[] as &[f64]);
        assert_eq!(
            buffer.last_n(5).unwrap_err(),
            BufferError::InvalidLength {
                requested: 5,
                available: 4
            }
        );
    }

    #[test]
    fn test_epoch_samples_conversion() {
        assert_eq!(epoch_samples(1.0, 256.0), 256);
        assert_eq!(epoch_samples(0.05, 52.0), 2);
        assert_eq!(epoch_samples(1.5, 52.0), 78);
    }
}
