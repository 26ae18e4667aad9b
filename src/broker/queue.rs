//! Bounded per-stream sample queue.

use crossbeam_queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, Ordering};

/// Bounded lock-free FIFO for one sample stream.
///
/// Exactly one producer thread pushes and one consumer drains. `push`
/// never blocks: when the queue is full the incoming sample is dropped
/// and counted, so a stalled consumer shows up in the drop counter
/// instead of as unbounded heap growth.
#[derive(Debug)]
pub struct SampleQueue<T> {
    queue: ArrayQueue<T>,
    dropped: AtomicU64,
}

impl<T> SampleQueue<T> {
    /// Create a queue holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity),
            dropped: AtomicU64::new(0),
        }
    }

    /// Append a sample in arrival order.
    ///
    /// Returns `false` when the queue is full; the sample is discarded
    /// and the drop counter incremented.
    pub fn push(&self, sample: T) -> bool {
        match self.queue.push(sample) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Remove and return the oldest pending sample, `None` when empty
    pub fn pop(&self) -> Option<T> {
        self.queue.pop()
    }

    /// Number of samples currently buffered
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue holds no samples
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Maximum number of buffered samples
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Total samples dropped due to overflow since creation
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
