//! Camera producers.
//!
//! Camera hardware lives behind the [`FrameSource`] trait; the daemon
//! only sees timestamped frames. One producer thread per source: it
//! opens the device, registers the stream with the broker (the
//! discovery handshake the dispatch loop waits on), then captures and
//! pushes frames until shutdown.

use crate::broker::DataBroker;
use crate::core::sample::ImageSample;
use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A camera stream the daemon can capture frames from.
///
/// Implementations wrap a camera SDK or a simulator. `capture` may block
/// until the next frame is due; it must observe its own pacing, the
/// producer loop adds none.
pub trait FrameSource: Send {
    /// Stable identifier of this stream
    fn stream_id(&self) -> &str;

    /// Prepare the device for capture
    fn open(&mut self) -> Result<()>;

    /// Capture the next frame, or `None` when no frame is due yet
    fn capture(&mut self) -> Result<Option<ImageSample>>;
}

/// Handle to one camera producer thread
pub struct CameraProducer {
    stream_id: String,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CameraProducer {
    /// Spawn the producer thread for `source`.
    ///
    /// The stream is registered from inside the thread once the device
    /// opens, so a camera that fails to open never appears in the
    /// registry. Its absence surfaces as a discovery timeout, not a
    /// crash.
    pub fn start(mut source: Box<dyn FrameSource>, broker: Arc<DataBroker>) -> Result<Self> {
        let stream_id = source.stream_id().to_string();
        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shutdown = Arc::clone(&shutdown);
        let thread_id = stream_id.clone();

        let handle = thread::Builder::new()
            .name(format!("cam-{}", stream_id))
            .spawn(move || {
                if let Err(e) = source.open() {
                    log::error!("Camera '{}' failed to open: {}", thread_id, e);
                    return;
                }
                if let Err(e) = broker.register_stream(&thread_id) {
                    log::error!("Camera '{}' failed to register: {}", thread_id, e);
                    return;
                }
                capture_loop(source, &thread_id, &broker, &thread_shutdown);
            })?;

        Ok(Self {
            stream_id,
            shutdown,
            handle: Some(handle),
        })
    }

    /// Identifier of the stream this producer feeds
    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    /// Signal the producer thread and wait for it to exit
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CameraProducer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn capture_loop(
    mut source: Box<dyn FrameSource>,
    stream_id: &str,
    broker: &DataBroker,
    shutdown: &AtomicBool,
) {
    while !shutdown.load(Ordering::Relaxed) {
        match source.capture() {
            Ok(Some(sample)) => {
                if let Err(e) = broker.push_image(stream_id, sample) {
                    // UnknownStream here means a sequencing bug, not bad data
                    log::error!("Camera '{}' push failed: {}", stream_id, e);
                }
            }
            Ok(None) => thread::sleep(Duration::from_millis(1)),
            Err(e) => {
                log::error!("Camera '{}' capture error: {}", stream_id, e);
                thread::sleep(Duration::from_millis(10));
            }
        }
    }

    log::info!("Camera '{}' producer exiting", stream_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sample::{ImageFrame, PixelFormat};

    /// Source producing a fixed number of frames, then idling
    struct CountingSource {
        id: String,
        produced: u64,
        limit: u64,
    }

    impl FrameSource for CountingSource {
        fn stream_id(&self) -> &str {
            &self.id
        }

        fn open(&mut self) -> Result<()> {
            Ok(())
        }

        fn capture(&mut self) -> Result<Option<ImageSample>> {
            if self.produced >= self.limit {
                return Ok(None);
            }
            self.produced += 1;
            Ok(Some(ImageSample::new(
                self.produced,
                ImageFrame::new(2, 2, PixelFormat::Mono8),
            )))
        }
    }

    #[test]
    fn test_producer_registers_and_pushes() {
        let broker = Arc::new(DataBroker::with_defaults());
        let source = CountingSource {
            id: "cam_test".to_string(),
            produced: 0,
            limit: 5,
        };

        let mut producer = CameraProducer::start(Box::new(source), Arc::clone(&broker)).unwrap();
        assert!(broker.wait_streams_ready(1, Duration::from_secs(5)));

        // Drain until all five frames arrive, in capture order
        let mut got = Vec::new();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while got.len() < 5 && std::time::Instant::now() < deadline {
            while let Some(sample) = broker.try_pop_image("cam_test").unwrap() {
                got.push(sample.timestamp_us);
            }
            thread::sleep(Duration::from_millis(1));
        }
        producer.stop();

        assert_eq!(got, vec![1, 2, 3, 4, 5]);
    }
}
