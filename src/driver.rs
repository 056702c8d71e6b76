//! Per-frame stream driver.
//!
//! Pulls frames in arrival order and pushes each through preprocess,
//! inference, filtering, smoothing, and the occupancy state machine, then
//! publishes telemetry and writes the annotated frame to the sink. Single
//! thread of control: the only blocking point is the inference wait, and
//! telemetry for frame N is always emitted before frame N+1 is touched.
//!
//! Failure policy per frame: a failed inference request drops that frame's
//! detections (no telemetry, no state-machine advance) and the loop carries
//! on. Stop requests are honored between frames, never mid-wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::annotate::annotate_frame;
use crate::detect::{
    filter_detections, FramePreprocessor, InferenceBackend, InferenceOutcome, InferenceSlot,
};
use crate::ingest::VideoSource;
use crate::occupancy::{OccupancySmoother, OccupancyStateMachine};
use crate::sink::FrameSink;
use crate::telemetry::TelemetryPublisher;

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Pipeline tuning passed in by the caller. No ambient state: everything the
/// loop needs arrives through this struct and the injected collaborators.
#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// Confidence threshold for the detection filter (strict greater-than).
    pub confidence_threshold: f32,
    /// Trailing-mean threshold for the occupancy decision.
    pub tracking_threshold: f32,
    /// Smoothing window capacity in frames.
    pub window_capacity: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            tracking_threshold: crate::occupancy::DEFAULT_TRACKING_THRESHOLD,
            window_capacity: crate::occupancy::DEFAULT_WINDOW_CAPACITY,
        }
    }
}

/// Counters reported after a run.
#[derive(Clone, Copy, Debug, Default)]
pub struct DriverSummary {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub total_entries: u64,
}

/// Owns everything for one stream's lifetime. The backend slot admits one
/// request at a time; the occupancy state is exclusive to this driver, so the
/// loop needs no locking.
pub struct StreamDriver<B: InferenceBackend> {
    config: DriverConfig,
    source: VideoSource,
    slot: InferenceSlot<B>,
    publisher: Box<dyn TelemetryPublisher>,
    sink: Box<dyn FrameSink>,
    stop: Arc<AtomicBool>,
}

impl<B: InferenceBackend> StreamDriver<B> {
    pub fn new(
        config: DriverConfig,
        source: VideoSource,
        slot: InferenceSlot<B>,
        publisher: Box<dyn TelemetryPublisher>,
        sink: Box<dyn FrameSink>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            source,
            slot,
            publisher,
            sink,
            stop,
        }
    }

    /// Drive the stream to completion. Cleanup (publisher disconnect, backend
    /// release via drop) runs on every exit path.
    pub fn run(mut self) -> Result<DriverSummary> {
        let result = self.run_loop();
        if let Err(e) = self.publisher.disconnect() {
            log::warn!("telemetry disconnect failed: {}", e);
        }
        result
    }

    fn run_loop(&mut self) -> Result<DriverSummary> {
        let preprocessor = FramePreprocessor::new(self.slot.input_shape())?;
        let mut smoother = OccupancySmoother::new(
            self.config.window_capacity,
            self.config.tracking_threshold,
        );
        let mut machine = OccupancyStateMachine::new();
        let mut summary = DriverSummary::default();
        let mut last_health_log = Instant::now();

        log::info!(
            "stream driver running: backend={} window={} thresholds confidence={} tracking={}",
            self.slot.backend_name(),
            self.config.window_capacity,
            self.config.confidence_threshold,
            self.config.tracking_threshold
        );

        loop {
            // Stop requests are only observed here, between frames.
            if self.stop.load(Ordering::Relaxed) {
                log::info!("stop requested, shutting down");
                break;
            }

            let mut frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    log::info!("end of stream");
                    break;
                }
                Err(e) => {
                    log::error!("frame read failed: {:#}", e);
                    break;
                }
            };

            let tensor = match preprocessor.prepare(&frame) {
                Ok(tensor) => tensor,
                Err(e) => {
                    log::warn!("frame {} preprocessing failed: {:#}", frame.index, e);
                    summary.frames_skipped += 1;
                    continue;
                }
            };

            // One request in flight: the pending handle borrows the slot
            // until it is retired by wait.
            let pending = self.slot.submit(tensor).context("submit inference")?;
            match pending.wait().context("wait for inference")? {
                InferenceOutcome::Complete { output, latency } => {
                    let detections = filter_detections(
                        &output,
                        self.config.confidence_threshold,
                        frame.width,
                        frame.height,
                    );
                    let present = smoother.observe(detections.raw_count as u32);
                    let telemetry = machine.advance(present, Instant::now());

                    if let Some(total) = telemetry.total {
                        if let Err(e) = self.publisher.publish_total(total) {
                            log::warn!("publish total failed: {}", e);
                        }
                    }
                    if let Some(duration) = telemetry.duration {
                        if let Err(e) = self.publisher.publish_duration(&duration) {
                            log::warn!("publish duration failed: {}", e);
                        }
                    }
                    if let Err(e) = self.publisher.publish_count(telemetry.current) {
                        log::warn!("publish count failed: {}", e);
                    }

                    annotate_frame(&mut frame, &detections.boxes, latency);
                    summary.frames_processed += 1;
                }
                InferenceOutcome::Failed => {
                    log::warn!("inference failed for frame {}, skipping", frame.index);
                    summary.frames_skipped += 1;
                }
            }

            self.sink.write_frame(&frame)?;

            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                let stats = self.source.stats();
                log::info!(
                    "source health={} frames={} input={}",
                    self.source.is_healthy(),
                    stats.frames_captured,
                    stats.input
                );
                last_health_log = Instant::now();
            }
        }

        summary.total_entries = machine.total_entries();
        log::info!(
            "stream finished: processed={} skipped={} total_entries={}",
            summary.frames_processed,
            summary.frames_skipped,
            summary.total_entries
        );
        Ok(summary)
    }
}

/// Install a Ctrl-C handler that flips the shared stop flag.
pub fn install_stop_handler() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    })
    .context("install interrupt handler")?;
    Ok(stop)
}
