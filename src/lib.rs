//! People counter pipeline.
//!
//! Ingests a video stream, runs person detection on every frame, and derives
//! occupancy telemetry: the current smoothed count, the cumulative number of
//! entries, and the dwell duration of each visit, published over MQTT.
//!
//! # Architecture
//!
//! - `ingest`: video sources (local file via FFmpeg, still images, V4L2
//!   camera, synthetic stub), yielding RGB24 frames in arrival order
//! - `detect`: preprocessing, the inference backend contract with its
//!   single-slot request handle, confidence filtering
//! - `occupancy`: trailing-window smoothing and the entry/exit state machine
//! - `telemetry`: the MQTT publisher and the wire payloads
//! - `driver`: the per-frame loop tying the stages together
//!
//! One inference request is in flight at any time; the pending-request handle
//! borrows the backend slot, so resubmission before retirement does not
//! compile. All occupancy state is owned by the single driver thread.

pub mod annotate;
pub mod config;
pub mod detect;
pub mod driver;
pub mod frame;
pub mod ingest;
pub mod occupancy;
pub mod sink;
pub mod telemetry;

pub use config::CounterConfig;
pub use detect::{
    build_backend, filter_detections, Device, FramePreprocessor, InferenceBackend,
    InferenceOutcome, InferenceSlot, StubBackend, TensorShape,
};
pub use driver::{install_stop_handler, DriverConfig, DriverSummary, StreamDriver};
pub use frame::Frame;
pub use ingest::VideoSource;
pub use occupancy::{
    DurationEvent, FrameTelemetry, OccupancySmoother, OccupancyStateMachine, OccupancyWindow,
};
pub use sink::{FrameSink, NullSink, StdoutSink};
pub use telemetry::{
    MqttPublisher, MqttSettings, NullPublisher, RecordingPublisher, TelemetryEvent,
    TelemetryPublisher,
};
