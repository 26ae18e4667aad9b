//! Camera stream registry.
//!
//! Stream identifiers are discovered at startup: each camera producer
//! registers its id once it has opened its device, before the dispatch
//! loop snapshots the set. Registration order is preserved and becomes
//! the dispatch iteration order for the rest of the run.
//!
//! Registration assigns each stream a fixed slot holding its queue, so
//! the push path takes only a shared read lock and never touches another
//! stream's state. The dispatch thread blocks on [`StreamRegistry::wait_ready`]
//! until the expected number of producers have registered, instead of
//! sleeping for a fixed startup delay.

use crate::broker::queue::SampleQueue;
use crate::core::sample::ImageSample;
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;

struct StreamEntry {
    id: String,
    queue: Arc<SampleQueue<ImageSample>>,
}

/// Insertion-ordered registry mapping stream identifiers to their queues
pub struct StreamRegistry {
    streams: RwLock<Vec<StreamEntry>>,
    ready_count: Mutex<usize>,
    ready: Condvar,
}

impl StreamRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            streams: RwLock::new(Vec::new()),
            ready_count: Mutex::new(0),
            ready: Condvar::new(),
        }
    }

    /// Register a stream and create its queue.
    ///
    /// Returns [`Error::DuplicateStream`] if the identifier is already
    /// registered. Registering after the dispatch loop has snapshotted
    /// the stream set is unsupported: the new stream will never be
    /// drained.
    pub fn register(&self, id: &str, capacity: usize) -> Result<()> {
        {
            let mut streams = self.streams.write();
            if streams.iter().any(|s| s.id == id) {
                return Err(Error::DuplicateStream(id.to_string()));
            }
            streams.push(StreamEntry {
                id: id.to_string(),
                queue: Arc::new(SampleQueue::new(capacity)),
            });
        }

        let mut count = self.ready_count.lock();
        *count += 1;
        self.ready.notify_all();
        Ok(())
    }

    /// Look up the queue for a registered stream
    pub fn queue(&self, id: &str) -> Result<Arc<SampleQueue<ImageSample>>> {
        let streams = self.streams.read();
        streams
            .iter()
            .find(|s| s.id == id)
            .map(|s| Arc::clone(&s.queue))
            .ok_or_else(|| Error::UnknownStream(id.to_string()))
    }

    /// All registered identifiers, in registration order
    pub fn ids(&self) -> Vec<String> {
        self.streams.read().iter().map(|s| s.id.clone()).collect()
    }

    /// Whether an identifier has been registered
    pub fn contains(&self, id: &str) -> bool {
        self.streams.read().iter().any(|s| s.id == id)
    }

    /// Number of registered streams
    pub fn len(&self) -> usize {
        self.streams.read().len()
    }

    /// Whether no streams have been registered yet
    pub fn is_empty(&self) -> bool {
        self.streams.read().is_empty()
    }

    /// Block until at least `expected` streams have registered.
    ///
    /// Returns `true` once the count is reached, `false` on timeout. The
    /// caller decides how to treat a partial discovery (the dispatch loop
    /// logs a warning and proceeds with whatever registered).
    pub fn wait_ready(&self, expected: usize, timeout: Duration) -> bool {
        let mut count = self.ready_count.lock();
        if *count >= expected {
            return true;
        }
        let deadline = std::time::Instant::now() + timeout;
        while *count < expected {
            if self.ready.wait_until(&mut count, deadline).timed_out() {
                return *count >= expected;
            }
        }
        true
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}
