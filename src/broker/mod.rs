//! The data broker: per-stream buffering between acquisition and dispatch.
//!
//! Every sensor thread pushes into the broker; the dispatch loop drains
//! it. Nothing else is shared between threads.
//!
//! # Delivery Contract
//!
//! - **Per-stream FIFO is exact**: samples come back in push order and
//!   are never duplicated. Timestamps are not inspected; an out-of-order
//!   timestamp from a producer stays out of order.
//! - **At-most-once**: popping removes the sample; a sample is either
//!   delivered once or counted as an overflow drop.
//! - **No cross-stream ordering**: the consumer drains stream by stream,
//!   so relative order between streams is whatever the drain order makes
//!   it. Consumers needing a global timestamp order must merge themselves.
//! - **Non-blocking**: pushes and pops take bounded critical sections
//!   only. A pop on an empty queue returns `None` immediately, it never
//!   waits for a producer.
//!
//! The IMU stream is a distinguished singleton with its own queue; camera
//! streams are registered dynamically during the discovery phase and
//! fixed from then on.
//!
//! The broker is constructed explicitly and handed to producers and the
//! dispatch loop as an `Arc`. There is no global instance, which keeps
//! lifetimes visible and lets every test build its own broker.

mod queue;
mod registry;

pub use queue::SampleQueue;
pub use registry::StreamRegistry;

use crate::core::sample::{ImageSample, ImuSample};
use crate::error::Result;
use std::time::Duration;

/// Default IMU queue depth (a few seconds at typical board rates)
pub const DEFAULT_IMU_CAPACITY: usize = 1024;
/// Default per-camera queue depth (a couple of seconds at 30 fps)
pub const DEFAULT_IMAGE_CAPACITY: usize = 64;

/// Central hand-off point between acquisition threads and the dispatch loop
pub struct DataBroker {
    imu: SampleQueue<ImuSample>,
    streams: StreamRegistry,
    image_capacity: usize,
}

impl DataBroker {
    /// Create a broker with the given queue capacities
    pub fn new(imu_capacity: usize, image_capacity: usize) -> Self {
        Self {
            imu: SampleQueue::new(imu_capacity),
            streams: StreamRegistry::new(),
            image_capacity,
        }
    }

    /// Create a broker with default queue capacities
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_IMU_CAPACITY, DEFAULT_IMAGE_CAPACITY)
    }

    // ------------------------------------------------------------------
    // IMU stream
    // ------------------------------------------------------------------

    /// Append an IMU sample. Never blocks; on overflow the sample is
    /// dropped and counted.
    pub fn push_imu(&self, sample: ImuSample) {
        if !self.imu.push(sample) {
            log::trace!("IMU queue full, dropped sample (t={})", sample.timestamp_us);
        }
    }

    /// Remove and return the oldest pending IMU sample
    pub fn try_pop_imu(&self) -> Option<ImuSample> {
        self.imu.pop()
    }

    /// IMU samples dropped to overflow since startup
    pub fn dropped_imu(&self) -> u64 {
        self.imu.dropped()
    }

    /// IMU samples currently buffered
    pub fn pending_imu(&self) -> usize {
        self.imu.len()
    }

    // ------------------------------------------------------------------
    // Camera streams
    // ------------------------------------------------------------------

    /// Register a camera stream during discovery.
    ///
    /// Must happen before the stream is pushed to or polled; registering
    /// after the dispatch loop has snapshotted the stream set leaves the
    /// stream undrained.
    pub fn register_stream(&self, id: &str) -> Result<()> {
        self.streams.register(id, self.image_capacity)?;
        log::info!("Registered camera stream '{}'", id);
        Ok(())
    }

    /// Append an image sample to a registered stream.
    ///
    /// Fails with [`crate::error::Error::UnknownStream`] if the stream
    /// was never registered; no queue is touched in that case. Overflow
    /// drops are counted per stream.
    pub fn push_image(&self, id: &str, sample: ImageSample) -> Result<()> {
        let queue = self.streams.queue(id)?;
        if !queue.push(sample) {
            log::trace!("Image queue '{}' full, dropped frame", id);
        }
        Ok(())
    }

    /// Remove and return the oldest pending image for a registered stream
    pub fn try_pop_image(&self, id: &str) -> Result<Option<ImageSample>> {
        Ok(self.streams.queue(id)?.pop())
    }

    /// Image samples dropped to overflow for one stream
    pub fn dropped_images(&self, id: &str) -> Result<u64> {
        Ok(self.streams.queue(id)?.dropped())
    }

    /// Registered stream identifiers, in registration order
    pub fn stream_ids(&self) -> Vec<String> {
        self.streams.ids()
    }

    /// Whether a stream identifier has been registered
    pub fn is_registered(&self, id: &str) -> bool {
        self.streams.contains(id)
    }

    /// Block until `expected` streams have registered, or `timeout`.
    ///
    /// Returns `false` on timeout; the caller chooses whether a partial
    /// discovery is fatal.
    pub fn wait_streams_ready(&self, expected: usize, timeout: Duration) -> bool {
        self.streams.wait_ready(expected, timeout)
    }
}
