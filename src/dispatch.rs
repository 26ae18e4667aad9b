//! The dispatch loop: drains the broker and feeds the publisher.
//!
//! Two phases:
//!
//! 1. **Discovery**: block until the expected number of camera streams
//!    have registered (or the timeout passes, which is logged and
//!    tolerated), then snapshot the stream set once. The set is fixed
//!    for the rest of the run.
//! 2. **Steady state**: at a fixed cycle rate, accept publisher
//!    housekeeping, drain all pending IMU samples, then drain each
//!    camera stream in registration order, forwarding every sample with
//!    its wire time. Sleep to the next cycle deadline.
//!
//! The shutdown flag is observed only at cycle boundaries; a cycle that
//! has started always finishes its drain, so no accepted sample is
//! stranded in a half-drained queue on exit.

use crate::broker::DataBroker;
use crate::core::time::WireTime;
use crate::error::Result;
use crate::publish::SamplePublisher;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How often steady-state statistics are logged
const STATS_INTERVAL: Duration = Duration::from_secs(10);

/// Fixed-rate polling consumer of the broker
pub struct DispatchLoop {
    broker: Arc<DataBroker>,
    running: Arc<AtomicBool>,
    cycle: Duration,
    expected_streams: usize,
    discovery_timeout: Duration,
}

impl DispatchLoop {
    /// Create a dispatch loop.
    ///
    /// `expected_streams` is how many camera registrations discovery
    /// waits for; `running` is the cooperative shutdown flag shared with
    /// the process lifecycle handler.
    pub fn new(
        broker: Arc<DataBroker>,
        running: Arc<AtomicBool>,
        rate_hz: u32,
        expected_streams: usize,
        discovery_timeout: Duration,
    ) -> Self {
        Self {
            broker,
            running,
            cycle: Duration::from_secs_f64(1.0 / rate_hz.max(1) as f64),
            expected_streams,
            discovery_timeout,
        }
    }

    /// Run discovery, then steady-state cycles until shutdown
    pub fn run(&mut self, publisher: &mut dyn SamplePublisher) -> Result<()> {
        // Phase 1: discovery
        log::info!(
            "Waiting up to {:?} for {} camera stream(s) to register...",
            self.discovery_timeout,
            self.expected_streams
        );
        if !self
            .broker
            .wait_streams_ready(self.expected_streams, self.discovery_timeout)
        {
            log::warn!(
                "Discovery timed out: {} of {} stream(s) registered, proceeding",
                self.broker.stream_ids().len(),
                self.expected_streams
            );
        }

        let stream_ids = self.broker.stream_ids();
        log::info!(
            "Dispatching IMU + {} camera stream(s): {:?}",
            stream_ids.len(),
            stream_ids
        );

        // Phase 2: steady state
        let mut imu_published = 0u64;
        let mut images_published = 0u64;
        let mut cycles = 0u64;
        let mut last_stats = Instant::now();
        let mut next_deadline = Instant::now() + self.cycle;

        while self.running.load(Ordering::Relaxed) {
            if let Err(e) = publisher.poll() {
                log::warn!("Publisher poll error: {}", e);
            }

            // Drain all pending IMU samples
            while let Some(sample) = self.broker.try_pop_imu() {
                match WireTime::from_micros(sample.timestamp_us) {
                    Ok(stamp) => {
                        if let Err(e) = publisher.publish_imu(stamp, &sample) {
                            log::warn!("Failed to publish IMU sample: {}", e);
                        } else {
                            imu_published += 1;
                        }
                    }
                    Err(e) => log::error!("Dropping IMU sample: {}", e),
                }
            }

            // Drain each camera stream, registration order
            for id in &stream_ids {
                while let Some(sample) = self.broker.try_pop_image(id)? {
                    match WireTime::from_micros(sample.timestamp_us) {
                        Ok(stamp) => {
                            if let Err(e) = publisher.publish_image(id, stamp, &sample) {
                                log::warn!("Failed to publish '{}' frame: {}", id, e);
                            } else {
                                images_published += 1;
                            }
                        }
                        Err(e) => log::error!("Dropping '{}' frame: {}", id, e),
                    }
                }
            }

            cycles += 1;
            if last_stats.elapsed() >= STATS_INTERVAL {
                self.log_stats(&stream_ids, cycles, imu_published, images_published);
                last_stats = Instant::now();
            }

            // Absolute-deadline pacing; resynchronize instead of bursting
            // when a cycle overruns
            let now = Instant::now();
            if next_deadline > now {
                std::thread::sleep(next_deadline - now);
                next_deadline += self.cycle;
            } else {
                next_deadline = now + self.cycle;
            }
        }

        log::info!(
            "Dispatch loop stopped ({} cycles, {} IMU, {} images published)",
            cycles,
            imu_published,
            images_published
        );
        Ok(())
    }

    fn log_stats(&self, stream_ids: &[String], cycles: u64, imu: u64, images: u64) {
        let mut dropped_images = 0u64;
        for id in stream_ids {
            dropped_images += self.broker.dropped_images(id).unwrap_or(0);
        }
        log::info!(
            "Dispatch: {} cycles, published {} IMU / {} images, dropped {} IMU / {} images",
            cycles,
            imu,
            images,
            self.broker.dropped_imu(),
            dropped_images
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sample::{ImageFrame, ImageSample, ImuSample, PixelFormat};
    use crate::error::Result;
    use std::sync::Mutex;
    use std::thread;

    /// Event log entry: (kind, stream, timestamp, wire time)
    type Event = (&'static str, String, u64, (u32, u32));

    struct RecordingPublisher {
        events: Arc<Mutex<Vec<Event>>>,
    }

    impl SamplePublisher for RecordingPublisher {
        fn publish_imu(&mut self, stamp: WireTime, sample: &ImuSample) -> Result<()> {
            self.events.lock().unwrap().push((
                "imu",
                String::new(),
                sample.timestamp_us,
                (stamp.sec, stamp.nsec),
            ));
            Ok(())
        }

        fn publish_image(
            &mut self,
            stream_id: &str,
            stamp: WireTime,
            sample: &ImageSample,
        ) -> Result<()> {
            self.events.lock().unwrap().push((
                "image",
                stream_id.to_string(),
                sample.timestamp_us,
                (stamp.sec, stamp.nsec),
            ));
            Ok(())
        }
    }

    fn imu(t: u64) -> ImuSample {
        ImuSample::new(t, [0.0; 3], [0.0; 3])
    }

    fn image(t: u64) -> ImageSample {
        ImageSample::new(t, ImageFrame::new(2, 2, PixelFormat::Mono8))
    }

    #[test]
    fn test_drains_everything_in_order_then_stops() {
        let broker = Arc::new(DataBroker::with_defaults());
        broker.register_stream("camA").unwrap();
        broker.register_stream("camB").unwrap();

        for t in [100u64, 50, 200] {
            broker.push_imu(imu(t));
        }
        broker.push_image("camA", image(2_000)).unwrap();
        broker.push_image("camB", image(3_000)).unwrap();
        broker.push_image("camB", image(4_000)).unwrap();

        let running = Arc::new(AtomicBool::new(true));
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut publisher = RecordingPublisher {
            events: Arc::clone(&events),
        };

        let mut dispatch = DispatchLoop::new(
            Arc::clone(&broker),
            Arc::clone(&running),
            1000,
            2,
            Duration::from_secs(1),
        );

        let handle = thread::spawn(move || dispatch.run(&mut publisher));

        // Wait until everything pushed so far has been published
        let deadline = Instant::now() + Duration::from_secs(5);
        while events.lock().unwrap().len() < 6 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        running.store(false, Ordering::Relaxed);
        handle.join().unwrap().unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 6);

        // IMU samples first, in push order (not timestamp order)
        assert_eq!(events[0], ("imu", String::new(), 100, (0, 100_000)));
        assert_eq!(events[1], ("imu", String::new(), 50, (0, 50_000)));
        assert_eq!(events[2], ("imu", String::new(), 200, (0, 200_000)));

        // Then camA, then camB in registration order
        assert_eq!(events[3], ("image", "camA".to_string(), 2_000, (0, 2_000_000)));
        assert_eq!(events[4], ("image", "camB".to_string(), 3_000, (0, 3_000_000)));
        assert_eq!(events[5], ("image", "camB".to_string(), 4_000, (0, 4_000_000)));
    }

    #[test]
    fn test_discovery_timeout_proceeds_with_partial_set() {
        let broker = Arc::new(DataBroker::with_defaults());
        broker.register_stream("cam_only").unwrap();
        broker.push_image("cam_only", image(10)).unwrap();

        let running = Arc::new(AtomicBool::new(true));
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut publisher = RecordingPublisher {
            events: Arc::clone(&events),
        };

        // Expect two streams but only one will ever register
        let mut dispatch = DispatchLoop::new(
            Arc::clone(&broker),
            Arc::clone(&running),
            1000,
            2,
            Duration::from_millis(50),
        );

        let handle = thread::spawn(move || dispatch.run(&mut publisher));

        let deadline = Instant::now() + Duration::from_secs(5);
        while events.lock().unwrap().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        running.store(false, Ordering::Relaxed);
        handle.join().unwrap().unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].1, "cam_only");
    }

    #[test]
    fn test_overflowing_timestamp_never_published() {
        use crate::core::time::MAX_TIMESTAMP_US;

        let broker = Arc::new(DataBroker::with_defaults());
        broker.push_imu(imu(MAX_TIMESTAMP_US + 1));
        broker.push_imu(imu(1_000));

        let running = Arc::new(AtomicBool::new(true));
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut publisher = RecordingPublisher {
            events: Arc::clone(&events),
        };

        let mut dispatch = DispatchLoop::new(
            Arc::clone(&broker),
            Arc::clone(&running),
            1000,
            0,
            Duration::from_millis(10),
        );

        let handle = thread::spawn(move || dispatch.run(&mut publisher));

        let deadline = Instant::now() + Duration::from_secs(5);
        while events.lock().unwrap().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        running.store(false, Ordering::Relaxed);
        handle.join().unwrap().unwrap();

        // Only the valid sample made it out
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].2, 1_000);
    }
}
