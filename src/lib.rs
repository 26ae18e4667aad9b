//! DrishtiIO - sensor bridge for camera/IMU sync boards
//!
//! This library acquires timestamped samples from a serial-attached IMU
//! sync board and any number of independently clocked cameras, buffers
//! them per stream, and hands them to a fixed-rate dispatch loop that
//! forwards each sample to TCP clients.
//!
//! ## Architecture
//!
//! ```text
//! imu-reader ──┐
//! cam-front  ──┼──▶ DataBroker ──▶ DispatchLoop ──▶ TcpPublisher
//! cam-down   ──┘    (per-stream     (fixed-rate      (length-prefixed
//!  (threads)         FIFO queues)    drain)           frames)
//! ```
//!
//! The broker is the only shared-mutable object: producers push, the
//! dispatch loop drains, nobody blocks anybody.

pub mod acquisition;
pub mod broker;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod error;
pub mod publish;

// Re-export commonly used types
pub use broker::DataBroker;
pub use config::Config;
pub use error::{Error, Result};
