//! Acquisition producers: the threads that feed the broker.
//!
//! - [`protocol`]: IMU sync board frame format and parser
//! - [`serial`]: UART reader thread for the real board
//! - [`camera`]: [`camera::FrameSource`] seam and per-camera producer threads
//! - [`sim`]: synthetic IMU/camera sources for hardware-free runs
//!
//! Producers push, never pop. Each owns exactly one stream and stops
//! cooperatively via its shutdown flag.

pub mod camera;
pub mod protocol;
pub mod serial;
pub mod sim;

pub use camera::{CameraProducer, FrameSource};
pub use serial::ImuBoard;
pub use sim::{SimCamera, SimImuBoard};
