//! Publishing layer: where drained samples leave the process.
//!
//! The dispatch loop only knows [`SamplePublisher`]; the wire format and
//! transport live behind it. [`TcpPublisher`] is the shipped
//! implementation.

pub mod messages;
pub mod tcp;
pub mod wire;

pub use tcp::TcpPublisher;
pub use wire::{Serializer, WireFormat};

use crate::core::sample::{ImageSample, ImuSample};
use crate::core::time::WireTime;
use crate::error::Result;

/// Sink for drained samples.
///
/// Called only from the dispatch thread, one sample at a time, in drain
/// order. Implementations must not block indefinitely: a stuck publisher
/// stalls dispatch cycles (but never the acquisition threads).
pub trait SamplePublisher {
    /// Forward one IMU sample
    fn publish_imu(&mut self, stamp: WireTime, sample: &ImuSample) -> Result<()>;

    /// Forward one camera frame
    fn publish_image(&mut self, stream_id: &str, stamp: WireTime, sample: &ImageSample)
        -> Result<()>;

    /// Housekeeping hook, called once per dispatch cycle
    fn poll(&mut self) -> Result<()> {
        Ok(())
    }
}
