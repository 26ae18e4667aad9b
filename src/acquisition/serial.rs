//! UART producer for the IMU sync board.
//!
//! Opens the configured serial port and runs a dedicated reader thread
//! that parses IMU frames and pushes them into the broker. The thread is
//! the stream's single producer; it checks the shutdown flag between
//! frames and exits cooperatively.

use crate::acquisition::protocol::FrameReader;
use crate::broker::DataBroker;
use crate::error::{Error, Result};
use serialport::SerialPort;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Serial read timeout; bounds how long shutdown can lag
const READ_TIMEOUT_MS: u64 = 50;

/// Handle to the IMU board reader thread
pub struct ImuBoard {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ImuBoard {
    /// Open the port and start the reader thread
    pub fn start(port_path: &str, baud: u32, broker: Arc<DataBroker>) -> Result<Self> {
        let port = serialport::new(port_path, baud)
            .timeout(Duration::from_millis(READ_TIMEOUT_MS))
            .open()
            .map_err(Error::Serial)?;

        log::info!("IMU board connected on {} @ {} baud", port_path, baud);

        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shutdown = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name("imu-reader".to_string())
            .spawn(move || reader_loop(port, broker, thread_shutdown))?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Signal the reader thread and wait for it to exit
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ImuBoard {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Reader loop: parse frames, push samples, until shutdown.
///
/// Read timeouts pace the loop; transient errors back off briefly rather
/// than spinning or killing the thread.
fn reader_loop(mut port: Box<dyn SerialPort>, broker: Arc<DataBroker>, shutdown: Arc<AtomicBool>) {
    let mut reader = FrameReader::new();

    while !shutdown.load(Ordering::Relaxed) {
        match reader.read_sample(&mut port) {
            Ok(Some(sample)) => broker.push_imu(sample),
            Ok(None) => {}
            Err(e) => {
                log::error!("IMU read error: {}", e);
                thread::sleep(Duration::from_millis(10));
            }
        }
    }

    log::info!("IMU reader thread exiting");
}
