//! End-to-end pipeline tests over the synthetic source and stub backend.
//!
//! The stub:// stream renders 120 frames in alternating 40-frame scenes
//! (empty, occupied, empty), so a full run exercises warm-up, one entry
//! transition, one exit transition, and clean end-of-stream shutdown.

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use people_counter::{
    DriverConfig, InferenceSlot, NullSink, RecordingPublisher, StreamDriver, StubBackend,
    TelemetryEvent, TensorShape, VideoSource,
};

const STREAM_LEN: usize = 120;
const SCENE_LEN: usize = 40;

fn small_shape() -> TensorShape {
    TensorShape {
        batch: 1,
        channels: 3,
        height: 8,
        width: 8,
    }
}

/// Raw per-frame counts the stub backend reports for the synthetic stream.
fn synthetic_raw_counts() -> Vec<u32> {
    (0..STREAM_LEN)
        .map(|i| ((i / SCENE_LEN) % 2 == 1) as u32)
        .collect()
}

/// Reference smoothing: trailing-window sum over capacity, strict threshold.
fn expected_decisions(raw: &[u32], capacity: usize, threshold: f32) -> Vec<u32> {
    let mut window: VecDeque<u32> = VecDeque::new();
    raw.iter()
        .map(|&count| {
            while window.len() >= capacity {
                window.pop_front();
            }
            window.push_back(count);
            let mean = window.iter().sum::<u32>() as f32 / capacity as f32;
            (mean > threshold) as u32
        })
        .collect()
}

fn run_driver(backend: StubBackend) -> (people_counter::DriverSummary, Vec<TelemetryEvent>, bool) {
    let source = VideoSource::open("stub://pipeline-test", 10).expect("open stub source");
    let publisher = RecordingPublisher::new();
    let events = publisher.events();
    let disconnected = publisher.disconnected_flag();

    let driver = StreamDriver::new(
        DriverConfig::default(),
        source,
        InferenceSlot::new(backend),
        Box::new(publisher),
        Box::new(NullSink),
        Arc::new(AtomicBool::new(false)),
    );
    let summary = driver.run().expect("driver run");

    let recorded = events.lock().unwrap().clone();
    let was_disconnected = *disconnected.lock().unwrap();
    (summary, recorded, was_disconnected)
}

#[test]
fn full_run_emits_counts_totals_and_durations_in_order() {
    let (summary, events, disconnected) = run_driver(StubBackend::new(small_shape()));

    assert_eq!(summary.frames_processed as usize, STREAM_LEN);
    assert_eq!(summary.frames_skipped, 0);
    assert_eq!(summary.total_entries, 1);
    assert!(disconnected);

    // Every processed frame emits exactly one count, in frame order.
    let counts: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            TelemetryEvent::Count(c) => Some(*c),
            _ => None,
        })
        .collect();
    let expected = expected_decisions(&synthetic_raw_counts(), 30, 0.2);
    assert_eq!(counts, expected);

    // One entry, one exit.
    let totals: Vec<u64> = events
        .iter()
        .filter_map(|e| match e {
            TelemetryEvent::Total(t) => Some(*t),
            _ => None,
        })
        .collect();
    assert_eq!(totals, vec![1]);

    let durations: Vec<u64> = events
        .iter()
        .filter_map(|e| match e {
            TelemetryEvent::Duration(d) => Some(*d),
            _ => None,
        })
        .collect();
    // The test run takes well under a second of wall time between the entry
    // and exit transitions, so the truncated dwell is zero.
    assert_eq!(durations, vec![0]);

    // The entry total is published before that frame's count.
    let total_pos = events
        .iter()
        .position(|e| matches!(e, TelemetryEvent::Total(_)))
        .unwrap();
    assert!(matches!(events[total_pos + 1], TelemetryEvent::Count(1)));

    // The exit duration is published before that frame's count.
    let duration_pos = events
        .iter()
        .position(|e| matches!(e, TelemetryEvent::Duration(_)))
        .unwrap();
    assert!(matches!(events[duration_pos + 1], TelemetryEvent::Count(0)));
}

#[test]
fn entry_transition_lands_where_the_window_mean_crosses_the_threshold() {
    let (_, events, _) = run_driver(StubBackend::new(small_shape()));

    let counts: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            TelemetryEvent::Count(c) => Some(*c),
            _ => None,
        })
        .collect();

    // Occupied scene starts at frame 40; the mean needs 7 positive samples
    // to strictly exceed 0.2, so the decision flips at frame 46.
    assert_eq!(counts[45], 0);
    assert_eq!(counts[46], 1);
}

#[test]
fn failed_inference_skips_the_frame_without_losing_the_stream() {
    // Fail three requests inside the occupied scene.
    let backend = StubBackend::new(small_shape()).fail_on(&[50, 51, 90]);
    let (summary, events, _) = run_driver(backend);

    assert_eq!(summary.frames_processed as usize, STREAM_LEN - 3);
    assert_eq!(summary.frames_skipped, 3);
    // Skipped frames emit no telemetry at all.
    let counts = events
        .iter()
        .filter(|e| matches!(e, TelemetryEvent::Count(_)))
        .count();
    assert_eq!(counts, STREAM_LEN - 3);
    // The occupancy signal still produces its single entry.
    assert_eq!(summary.total_entries, 1);
}

#[test]
fn all_empty_stream_publishes_no_transitions() {
    // Fail every occupied-scene request so the state machine only ever sees
    // zeros.
    let occupied: Vec<u64> = (40..80).collect();
    let backend = StubBackend::new(small_shape()).fail_on(&occupied);
    let (summary, events, _) = run_driver(backend);

    assert_eq!(summary.total_entries, 0);
    assert!(events
        .iter()
        .all(|e| matches!(e, TelemetryEvent::Count(0))));
}
