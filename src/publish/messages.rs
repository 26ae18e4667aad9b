//! Outbound message types.
//!
//! One message per drained sample, stamped with wire time. Image payloads
//! carry their pixel format so clients can decode without per-stream
//! configuration.

use crate::core::sample::{ImageSample, ImuSample, PixelFormat};
use crate::core::time::WireTime;
use serde::{Deserialize, Serialize};

/// Top-level message framed onto the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SensorMessage {
    Imu(ImuMessage),
    Image(ImageMessage),
}

/// One IMU reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImuMessage {
    pub stamp_sec: u32,
    pub stamp_nsec: u32,
    /// Angular velocity [x, y, z] (rad/s)
    pub angular_velocity: [f32; 3],
    /// Linear acceleration [x, y, z] (m/s²)
    pub linear_acceleration: [f32; 3],
}

impl ImuMessage {
    pub fn new(stamp: WireTime, sample: &ImuSample) -> Self {
        Self {
            stamp_sec: stamp.sec,
            stamp_nsec: stamp.nsec,
            angular_velocity: sample.angular_velocity,
            linear_acceleration: sample.linear_acceleration,
        }
    }
}

/// One camera frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMessage {
    pub stream_id: String,
    pub stamp_sec: u32,
    pub stamp_nsec: u32,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Row-major pixel data
    pub data: Vec<u8>,
}

impl ImageMessage {
    pub fn new(stream_id: &str, stamp: WireTime, sample: &ImageSample) -> Self {
        Self {
            stream_id: stream_id.to_string(),
            stamp_sec: stamp.sec,
            stamp_nsec: stamp.nsec,
            width: sample.frame.width,
            height: sample.frame.height,
            format: sample.frame.format,
            data: sample.frame.data.clone(),
        }
    }
}
