//! Concurrency stress tests for the data broker.
//!
//! Independent producer threads push into their own streams while one
//! consumer drains everything, the way the real daemon runs. Whatever
//! the interleaving, nothing may be lost, duplicated, or reordered
//! within a stream.

use drishti_io::broker::DataBroker;
use drishti_io::core::sample::{ImageFrame, ImageSample, ImuSample, PixelFormat};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const STREAMS: usize = 4;
const PER_STREAM: u64 = 1_000;

fn image(t: u64) -> ImageSample {
    ImageSample::new(t, ImageFrame::new(2, 2, PixelFormat::Mono8))
}

#[test]
fn concurrent_producers_single_drainer_lossless() {
    // Capacities large enough that overflow never kicks in; any missing
    // sample is then a real broker bug
    let broker = Arc::new(DataBroker::new(4096, 2048));

    let stream_ids: Vec<String> = (0..STREAMS).map(|i| format!("cam{}", i)).collect();
    for id in &stream_ids {
        broker.register_stream(id).unwrap();
    }

    let mut producers = Vec::new();
    for id in &stream_ids {
        let broker = Arc::clone(&broker);
        let id = id.clone();
        producers.push(thread::spawn(move || {
            for seq in 0..PER_STREAM {
                broker.push_image(&id, image(seq)).unwrap();
                if seq % 64 == 0 {
                    thread::yield_now();
                }
            }
        }));
    }

    let imu_broker = Arc::clone(&broker);
    producers.push(thread::spawn(move || {
        for seq in 0..PER_STREAM {
            imu_broker.push_imu(ImuSample::new(seq, [0.0; 3], [0.0; 3]));
            if seq % 64 == 0 {
                thread::yield_now();
            }
        }
    }));

    // Single consumer drains all streams repeatedly, interleaved with the
    // pushes above
    let mut collected: HashMap<String, Vec<u64>> = HashMap::new();
    let mut imu_collected: Vec<u64> = Vec::new();
    let expected_total = (STREAMS as u64 + 1) * PER_STREAM;
    let deadline = Instant::now() + Duration::from_secs(30);

    loop {
        while let Some(sample) = broker.try_pop_imu() {
            imu_collected.push(sample.timestamp_us);
        }
        for id in &stream_ids {
            while let Some(sample) = broker.try_pop_image(id).unwrap() {
                collected.entry(id.clone()).or_default().push(sample.timestamp_us);
            }
        }

        let total = imu_collected.len() as u64
            + collected.values().map(|v| v.len() as u64).sum::<u64>();
        if total == expected_total {
            break;
        }
        assert!(Instant::now() < deadline, "timed out with {} of {} samples", total, expected_total);
        thread::yield_now();
    }

    for producer in producers {
        producer.join().unwrap();
    }

    // Every stream delivered exactly its pushes, in push order
    let expected: Vec<u64> = (0..PER_STREAM).collect();
    assert_eq!(imu_collected, expected, "IMU stream lost/duplicated/reordered");
    for id in &stream_ids {
        assert_eq!(collected[id], expected, "stream {} lost/duplicated/reordered", id);
    }

    // Nothing was counted as dropped either
    assert_eq!(broker.dropped_imu(), 0);
    for id in &stream_ids {
        assert_eq!(broker.dropped_images(id).unwrap(), 0);
    }
}

#[test]
fn overflow_under_stalled_consumer_is_bounded_and_counted() {
    let broker = Arc::new(DataBroker::new(4096, 16));
    broker.register_stream("cam_burst").unwrap();

    // Producer bursts with no consumer draining
    for seq in 0..100u64 {
        broker.push_image("cam_burst", image(seq)).unwrap();
    }

    assert_eq!(broker.dropped_images("cam_burst").unwrap(), 84);

    // The oldest 16 frames survive, still in order
    let mut survivors = Vec::new();
    while let Some(sample) = broker.try_pop_image("cam_burst").unwrap() {
        survivors.push(sample.timestamp_us);
    }
    let expected: Vec<u64> = (0..16).collect();
    assert_eq!(survivors, expected);
}
