//! DrishtiIO - sensor bridge daemon
//!
//! Reads a UART-attached IMU sync board and a set of cameras, then
//! streams every sample to connected TCP clients with wire timestamps.
//!
//! Startup sequence: load config, build the broker, start the producers,
//! run the dispatch loop on the main thread until Ctrl-C.

use drishti_io::acquisition::{CameraProducer, ImuBoard, SimCamera, SimImuBoard};
use drishti_io::broker::DataBroker;
use drishti_io::config::{Config, DeviceMode};
use drishti_io::dispatch::DispatchLoop;
use drishti_io::error::Result;
use drishti_io::publish::TcpPublisher;
use std::env;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Sim IMU board sample rate
const SIM_IMU_RATE_HZ: u32 = 200;

/// Parse config path from command line arguments.
///
/// Supports:
/// - `drishti-io <path>` (positional)
/// - `drishti-io --config <path>` (flag-based)
/// - `drishti-io -c <path>` (short flag)
///
/// Defaults to `/etc/drishti.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    "/etc/drishti.toml".to_string()
}

fn main() -> Result<()> {
    let config_path = parse_config_path();

    // Explicitly requested config files must exist; the default path may
    // be absent, in which case the sim setup keeps the daemon usable
    let config = if Path::new(&config_path).exists() {
        Config::from_file(&config_path)?
    } else {
        Config::sim_defaults()
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.logging.level),
    )
    .init();

    log::info!("DrishtiIO starting (config: {})", config_path);
    if !Path::new(&config_path).exists() {
        log::warn!("Config file not found, using sim defaults");
    }

    // The broker is built here and handed to everyone explicitly
    let broker = Arc::new(DataBroker::new(
        config.queues.imu_capacity,
        config.queues.image_capacity,
    ));

    // Shutdown flag, set from SIGINT
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| drishti_io::Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    // IMU producer
    let mut imu_board = None;
    let mut sim_imu = None;
    match config.device.mode {
        DeviceMode::Uart => {
            imu_board = Some(ImuBoard::start(
                &config.serial.port,
                config.serial.baud,
                Arc::clone(&broker),
            )?);
        }
        DeviceMode::Sim => {
            sim_imu = Some(SimImuBoard::start(
                SIM_IMU_RATE_HZ,
                config.device.seed,
                Arc::clone(&broker),
            )?);
        }
    }

    // Camera producers; real camera SDK integration plugs in behind
    // FrameSource, sim sources stand in for every configured stream
    let mut cameras = Vec::new();
    for (i, cam) in config.cameras.iter().enumerate() {
        let seed = config.device.seed.wrapping_add(i as u64);
        let source = SimCamera::new(&cam.id, cam.width, cam.height, cam.format, cam.rate_hz, seed);
        cameras.push(CameraProducer::start(Box::new(source), Arc::clone(&broker))?);
    }

    let mut publisher = TcpPublisher::bind(&config.network.bind_address, config.network.wire_format)?;

    log::info!("DrishtiIO running. Press Ctrl-C to stop.");
    let mut dispatch = DispatchLoop::new(
        Arc::clone(&broker),
        Arc::clone(&running),
        config.dispatch.rate_hz,
        config.cameras.len(),
        Duration::from_millis(config.dispatch.discovery_timeout_ms),
    );
    dispatch.run(&mut publisher)?;

    // Dispatch has exited; stop the producers
    log::info!("Shutting down...");
    for camera in cameras.iter_mut() {
        camera.stop();
    }
    if let Some(ref mut board) = imu_board {
        board.stop();
    }
    if let Some(ref mut board) = sim_imu {
        board.stop();
    }

    log::info!("DrishtiIO stopped");
    Ok(())
}
