//! Sample types carried through the data broker.
//!
//! Samples are immutable once created: producers build them, the broker
//! buffers them, the dispatch loop consumes and discards them. Image
//! buffers are owned and moved, never shared, so a producer can never
//! alias a frame the dispatch loop is publishing.

use serde::{Deserialize, Serialize};

/// Pixel layout of one camera stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Single-channel 8-bit intensity
    Mono8,
    /// Interleaved 8-bit RGB
    Rgb8,
}

impl PixelFormat {
    /// Bytes per pixel for this format
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Mono8 => 1,
            PixelFormat::Rgb8 => 3,
        }
    }
}

/// One IMU reading from the sync board
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSample {
    /// Monotonic board time in microseconds
    pub timestamp_us: u64,
    /// Angular velocity [x, y, z] (rad/s)
    pub angular_velocity: [f32; 3],
    /// Linear acceleration [x, y, z] (m/s²)
    pub linear_acceleration: [f32; 3],
}

impl ImuSample {
    /// Create a new IMU sample
    pub fn new(timestamp_us: u64, angular_velocity: [f32; 3], linear_acceleration: [f32; 3]) -> Self {
        Self {
            timestamp_us,
            angular_velocity,
            linear_acceleration,
        }
    }
}

/// Owned pixel buffer for one captured frame
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Row-major pixel data, `width * height * bytes_per_pixel` bytes
    pub data: Vec<u8>,
}

impl ImageFrame {
    /// Create a zero-filled frame of the given dimensions
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = width as usize * height as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            format,
            data: vec![0u8; len],
        }
    }
}

/// One camera frame with its capture time
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSample {
    /// Monotonic capture time in microseconds
    pub timestamp_us: u64,
    /// The captured pixels, ownership moves with the sample
    pub frame: ImageFrame,
}

impl ImageSample {
    /// Create a new image sample
    pub fn new(timestamp_us: u64, frame: ImageFrame) -> Self {
        Self { timestamp_us, frame }
    }
}
