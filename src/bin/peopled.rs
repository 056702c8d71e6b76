//! peopled - people counter daemon
//!
//! Pulls frames from a video input, runs person detection on each one, and
//! publishes occupancy telemetry (current count, cumulative entries, dwell
//! durations) to an MQTT broker while streaming annotated frames to stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use people_counter::{
    build_backend, install_stop_handler, CounterConfig, InferenceSlot, MqttPublisher, NullPublisher,
    NullSink, StdoutSink, StreamDriver, TelemetryPublisher, VideoSource,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Per-frame person detection with occupancy telemetry")]
struct Args {
    /// Path to the ONNX detection model. Without a model the deterministic
    /// stub backend is used.
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Input source: a local video file, a still image (jpg/bmp), `CAM` for
    /// the live camera, or a `stub://` synthetic stream. Required unless the
    /// config file or PEOPLED_INPUT supplies one.
    #[arg(short, long)]
    input: Option<String>,

    /// Target device for inference (cpu, gpu, accel).
    #[arg(short, long)]
    device: Option<String>,

    /// Confidence threshold for detection filtering.
    #[arg(long, value_name = "THRESHOLD")]
    prob_threshold: Option<f32>,

    /// MQTT broker address as host:port.
    #[arg(long, env = "PEOPLED_MQTT_BROKER_ADDR")]
    mqtt_broker_addr: Option<String>,

    /// Disable MQTT publishing (telemetry is discarded).
    #[arg(long)]
    no_mqtt: bool,

    /// Discard annotated frames instead of streaming them to stdout.
    #[arg(long)]
    no_output: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = CounterConfig::load()?;
    if let Some(model) = args.model {
        cfg.model = Some(model);
    }
    if let Some(input) = args.input {
        cfg.input = Some(input);
    }
    if let Some(device) = args.device {
        cfg.device = device.parse()?;
    }
    if let Some(threshold) = args.prob_threshold {
        cfg.confidence_threshold = threshold;
    }
    if let Some(addr) = args.mqtt_broker_addr {
        cfg.mqtt.broker_addr = addr;
    }
    if args.no_mqtt {
        cfg.mqtt_enabled = false;
    }
    // CLI values bypassed the checks inside load, so the merged config is
    // validated again before anything is built from it.
    cfg.validate()?;
    let input = cfg.require_input()?.to_string();

    let stop = install_stop_handler()?;

    // Load-time fatal: model or device problems abort before the stream opens.
    let backend = build_backend(cfg.model.as_deref(), cfg.device, cfg.model_shape())
        .context("load inference backend")?;
    let slot = InferenceSlot::new(backend);
    log::info!(
        "backend={} device={} input shape={:?}",
        slot.backend_name(),
        cfg.device,
        slot.input_shape()
    );

    // Stream-open fatal: an unreadable input aborts with a descriptive error.
    let source = VideoSource::open(&input, cfg.target_fps).context("open video input")?;

    let publisher: Box<dyn TelemetryPublisher> = if cfg.mqtt_enabled {
        Box::new(MqttPublisher::connect(cfg.mqtt.clone()).context("connect to mqtt broker")?)
    } else {
        log::info!("mqtt disabled, telemetry will be discarded");
        Box::new(NullPublisher)
    };

    let sink: Box<dyn people_counter::FrameSink> = if args.no_output {
        Box::new(NullSink)
    } else {
        Box::new(StdoutSink)
    };

    let driver = StreamDriver::new(cfg.driver_config(), source, slot, publisher, sink, stop);
    let summary = driver.run()?;
    log::info!(
        "done: {} frames processed, {} skipped, {} entries",
        summary.frames_processed,
        summary.frames_skipped,
        summary.total_entries
    );
    Ok(())
}
