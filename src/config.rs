//! Configuration for the DrishtiIO daemon.
//!
//! Loaded from a TOML file; `sim_defaults` gives a hardware-free setup
//! suitable for development and tests.

use crate::core::sample::PixelFormat;
use crate::error::Result;
use crate::publish::wire::WireFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level daemon configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub device: DeviceConfig,
    pub serial: SerialConfig,
    pub cameras: Vec<CameraConfig>,
    pub dispatch: DispatchConfig,
    pub queues: QueueConfig,
    pub network: NetworkConfig,
    pub logging: LoggingConfig,
}

/// Acquisition mode selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMode {
    /// Real IMU board on the serial port, cameras per [`CameraConfig`]
    Uart,
    /// Everything simulated
    Sim,
}

/// Device selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    pub mode: DeviceMode,
    /// RNG seed for simulated sources (0 = random each run)
    pub seed: u64,
}

/// Serial port for the IMU sync board
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SerialConfig {
    /// e.g. `/dev/ttyACM0`
    pub port: String,
    pub baud: u32,
}

/// One camera stream
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CameraConfig {
    /// Stream identifier, unique per camera
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Capture rate in frames per second
    pub rate_hz: u32,
}

/// Dispatch loop pacing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Steady-state cycle rate
    pub rate_hz: u32,
    /// How long discovery waits for all cameras to register
    pub discovery_timeout_ms: u64,
}

/// Broker queue capacities
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    pub imu_capacity: usize,
    pub image_capacity: usize,
}

/// Outbound streaming
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// TCP bind address, e.g. `0.0.0.0:5600`
    pub bind_address: String,
    pub wire_format: WireFormat,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Hardware-free defaults: simulated IMU board plus two simulated
    /// mono cameras
    pub fn sim_defaults() -> Self {
        Self {
            device: DeviceConfig {
                mode: DeviceMode::Sim,
                seed: 0,
            },
            serial: SerialConfig {
                port: "/dev/ttyACM0".to_string(),
                baud: 115_200,
            },
            cameras: vec![
                CameraConfig {
                    id: "cam_front".to_string(),
                    width: 640,
                    height: 480,
                    format: PixelFormat::Mono8,
                    rate_hz: 30,
                },
                CameraConfig {
                    id: "cam_down".to_string(),
                    width: 640,
                    height: 480,
                    format: PixelFormat::Mono8,
                    rate_hz: 30,
                },
            ],
            dispatch: DispatchConfig {
                rate_hz: 500,
                discovery_timeout_ms: 10_000,
            },
            queues: QueueConfig {
                imu_capacity: 1024,
                image_capacity: 64,
            },
            network: NetworkConfig {
                bind_address: "0.0.0.0:5600".to_string(),
                wire_format: WireFormat::Postcard,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::sim_defaults()
    }
}
