//! Simulated acquisition sources for hardware-free runs.
//!
//! The sim IMU board and sim cameras generate plausible, noisy samples at
//! their configured rates. They drive the exact same broker paths as the
//! real producers, which is what the integration tests and `mode = "sim"`
//! daemon runs rely on.

use crate::acquisition::camera::FrameSource;
use crate::broker::DataBroker;
use crate::core::sample::{ImageFrame, ImageSample, ImuSample, PixelFormat};
use crate::error::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

fn seeded_rng(seed: u64) -> StdRng {
    if seed == 0 {
        StdRng::from_entropy()
    } else {
        StdRng::seed_from_u64(seed)
    }
}

// ---------------------------------------------------------------------------
// Sim camera
// ---------------------------------------------------------------------------

/// Synthetic camera: scrolling gradient plus Gaussian pixel noise
pub struct SimCamera {
    id: String,
    width: u32,
    height: u32,
    format: PixelFormat,
    interval: Duration,
    epoch: Instant,
    next_due: Instant,
    frame_count: u64,
    rng: StdRng,
    noise: Normal<f32>,
}

impl SimCamera {
    /// Create a sim camera producing `rate_hz` frames per second
    pub fn new(id: &str, width: u32, height: u32, format: PixelFormat, rate_hz: u32, seed: u64) -> Self {
        let now = Instant::now();
        Self {
            id: id.to_string(),
            width,
            height,
            format,
            interval: Duration::from_secs_f64(1.0 / rate_hz.max(1) as f64),
            epoch: now,
            next_due: now,
            frame_count: 0,
            rng: seeded_rng(seed),
            noise: Normal::new(0.0, 4.0).expect("valid stddev"),
        }
    }

    fn render(&mut self) -> ImageFrame {
        let mut frame = ImageFrame::new(self.width, self.height, self.format);
        let bpp = self.format.bytes_per_pixel();
        let scroll = self.frame_count as u32;

        for y in 0..self.height {
            for x in 0..self.width {
                let base = ((x + y + scroll) % 256) as f32;
                let value = (base + self.noise.sample(&mut self.rng)).clamp(0.0, 255.0) as u8;
                let idx = (y * self.width + x) as usize * bpp;
                for c in 0..bpp {
                    frame.data[idx + c] = value;
                }
            }
        }
        frame
    }
}

impl FrameSource for SimCamera {
    fn stream_id(&self) -> &str {
        &self.id
    }

    fn open(&mut self) -> Result<()> {
        self.epoch = Instant::now();
        self.next_due = self.epoch;
        log::debug!(
            "Sim camera '{}' ready ({}x{} {:?} @ {:.1} fps)",
            self.id,
            self.width,
            self.height,
            self.format,
            1.0 / self.interval.as_secs_f64()
        );
        Ok(())
    }

    fn capture(&mut self) -> Result<Option<ImageSample>> {
        let now = Instant::now();
        if now < self.next_due {
            thread::sleep(self.next_due - now);
        }

        let timestamp_us = self.epoch.elapsed().as_micros() as u64;
        let frame = self.render();
        self.frame_count += 1;

        // Catch up instead of bursting if capture fell behind
        self.next_due += self.interval;
        if self.next_due < Instant::now() {
            self.next_due = Instant::now() + self.interval;
        }

        Ok(Some(ImageSample::new(timestamp_us, frame)))
    }
}

// ---------------------------------------------------------------------------
// Sim IMU board
// ---------------------------------------------------------------------------

/// Handle to the simulated IMU board thread.
///
/// Generates samples at the configured rate: gyro noise around zero with
/// a slow random-walk bias, accel noise around gravity.
pub struct SimImuBoard {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SimImuBoard {
    /// Start the generator thread at `rate_hz`
    pub fn start(rate_hz: u32, seed: u64, broker: Arc<DataBroker>) -> Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shutdown = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("imu-sim".to_string())
            .spawn(move || generator_loop(rate_hz, seed, broker, thread_shutdown))?;

        log::info!("Sim IMU board started @ {} Hz", rate_hz);
        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Signal the generator thread and wait for it to exit
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SimImuBoard {
    fn drop(&mut self) {
        self.stop();
    }
}

fn generator_loop(rate_hz: u32, seed: u64, broker: Arc<DataBroker>, shutdown: Arc<AtomicBool>) {
    let interval = Duration::from_secs_f64(1.0 / rate_hz.max(1) as f64);
    let mut rng = seeded_rng(seed);
    let gyro_noise = Normal::new(0.0f32, 0.01).expect("valid stddev");
    let accel_noise = Normal::new(0.0f32, 0.05).expect("valid stddev");
    let mut gyro_bias = [0.0f32; 3];

    let epoch = Instant::now();
    let mut next_due = epoch;

    while !shutdown.load(Ordering::Relaxed) {
        let now = Instant::now();
        if now < next_due {
            thread::sleep(next_due - now);
        }
        next_due += interval;

        // Slow random-walk bias on each gyro axis
        for b in gyro_bias.iter_mut() {
            *b += rng.gen_range(-1e-5..1e-5);
        }

        let sample = ImuSample::new(
            epoch.elapsed().as_micros() as u64,
            [
                gyro_bias[0] + gyro_noise.sample(&mut rng),
                gyro_bias[1] + gyro_noise.sample(&mut rng),
                gyro_bias[2] + gyro_noise.sample(&mut rng),
            ],
            [
                accel_noise.sample(&mut rng),
                accel_noise.sample(&mut rng),
                9.81 + accel_noise.sample(&mut rng),
            ],
        );
        broker.push_imu(sample);
    }

    log::info!("Sim IMU board exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_camera_frame_shape() {
        let mut cam = SimCamera::new("cam_sim", 8, 4, PixelFormat::Mono8, 1000, 42);
        cam.open().unwrap();

        let sample = cam.capture().unwrap().expect("frame due immediately");
        assert_eq!(sample.frame.width, 8);
        assert_eq!(sample.frame.height, 4);
        assert_eq!(sample.frame.data.len(), 32);
    }

    #[test]
    fn test_sim_camera_timestamps_monotone() {
        let mut cam = SimCamera::new("cam_sim", 4, 4, PixelFormat::Mono8, 2000, 7);
        cam.open().unwrap();

        let mut last = 0u64;
        for _ in 0..5 {
            let sample = cam.capture().unwrap().unwrap();
            assert!(sample.timestamp_us >= last);
            last = sample.timestamp_us;
        }
    }

    #[test]
    fn test_sim_imu_produces_samples() {
        let broker = Arc::new(DataBroker::with_defaults());
        let mut board = SimImuBoard::start(500, 42, Arc::clone(&broker)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while broker.pending_imu() < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        board.stop();

        let mut last = 0u64;
        let mut n = 0;
        while let Some(sample) = broker.try_pop_imu() {
            assert!(sample.timestamp_us >= last, "timestamps non-decreasing");
            last = sample.timestamp_us;
            // Accel hovers around gravity on Z
            assert!((sample.linear_acceleration[2] - 9.81).abs() < 1.0);
            n += 1;
        }
        assert!(n >= 3);
    }
}
