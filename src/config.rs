use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::detect::{Device, TensorShape};
use crate::driver::DriverConfig;
use crate::telemetry::MqttSettings;

const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const DEFAULT_TARGET_FPS: u32 = 10;
// Input geometry of the SSD person-detection model family.
const DEFAULT_MODEL_WIDTH: usize = 544;
const DEFAULT_MODEL_HEIGHT: usize = 320;

#[derive(Debug, Deserialize, Default)]
struct CounterConfigFile {
    model: Option<PathBuf>,
    input: Option<String>,
    device: Option<String>,
    confidence_threshold: Option<f32>,
    target_fps: Option<u32>,
    model_input: Option<ModelInputConfigFile>,
    smoothing: Option<SmoothingConfigFile>,
    mqtt: Option<MqttConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelInputConfigFile {
    width: Option<usize>,
    height: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct SmoothingConfigFile {
    window_capacity: Option<usize>,
    tracking_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct MqttConfigFile {
    broker_addr: Option<String>,
    client_id: Option<String>,
    keepalive_secs: Option<u64>,
    occupancy_topic: Option<String>,
    duration_topic: Option<String>,
    enabled: Option<bool>,
}

/// Resolved daemon configuration: defaults, then the `PEOPLED_CONFIG` file,
/// then `PEOPLED_*` environment overrides. CLI flags are layered on top by
/// the binary.
#[derive(Debug, Clone)]
pub struct CounterConfig {
    pub model: Option<PathBuf>,
    /// Video input. Required before a stream can open, but it may arrive from
    /// any layer, so absence is only an error at `require_input` time.
    pub input: Option<String>,
    pub device: Device,
    pub confidence_threshold: f32,
    pub target_fps: u32,
    pub model_input_width: usize,
    pub model_input_height: usize,
    pub window_capacity: usize,
    pub tracking_threshold: f32,
    pub mqtt: MqttSettings,
    pub mqtt_enabled: bool,
}

impl CounterConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PEOPLED_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// The input source, which no layer supplied a default for. Missing input
    /// is a startup error, not a silent synthetic run.
    pub fn require_input(&self) -> Result<&str> {
        self.input.as_deref().ok_or_else(|| {
            anyhow!("no input source configured (set --input, PEOPLED_INPUT, or the config file)")
        })
    }

    /// Tensor shape the backend is configured for.
    pub fn model_shape(&self) -> TensorShape {
        TensorShape {
            batch: 1,
            channels: 3,
            height: self.model_input_height,
            width: self.model_input_width,
        }
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            confidence_threshold: self.confidence_threshold,
            tracking_threshold: self.tracking_threshold,
            window_capacity: self.window_capacity,
        }
    }

    fn from_file(file: CounterConfigFile) -> Result<Self> {
        let device = match file.device {
            Some(raw) => Device::from_str(&raw)?,
            None => Device::default(),
        };
        let smoothing = file.smoothing.unwrap_or_default();
        let model_input = file.model_input.unwrap_or_default();
        let mqtt_defaults = MqttSettings::default();
        let (mqtt, mqtt_enabled) = match file.mqtt {
            Some(mqtt) => (
                MqttSettings {
                    broker_addr: mqtt.broker_addr.unwrap_or(mqtt_defaults.broker_addr),
                    client_id: mqtt.client_id.unwrap_or(mqtt_defaults.client_id),
                    keepalive_secs: mqtt.keepalive_secs.unwrap_or(mqtt_defaults.keepalive_secs),
                    occupancy_topic: mqtt.occupancy_topic.unwrap_or(mqtt_defaults.occupancy_topic),
                    duration_topic: mqtt.duration_topic.unwrap_or(mqtt_defaults.duration_topic),
                },
                mqtt.enabled.unwrap_or(true),
            ),
            None => (mqtt_defaults, true),
        };

        Ok(Self {
            model: file.model,
            input: file.input,
            device,
            confidence_threshold: file
                .confidence_threshold
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            target_fps: file.target_fps.unwrap_or(DEFAULT_TARGET_FPS),
            model_input_width: model_input.width.unwrap_or(DEFAULT_MODEL_WIDTH),
            model_input_height: model_input.height.unwrap_or(DEFAULT_MODEL_HEIGHT),
            window_capacity: smoothing
                .window_capacity
                .unwrap_or(crate::occupancy::DEFAULT_WINDOW_CAPACITY),
            tracking_threshold: smoothing
                .tracking_threshold
                .unwrap_or(crate::occupancy::DEFAULT_TRACKING_THRESHOLD),
            mqtt,
            mqtt_enabled,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(model) = std::env::var("PEOPLED_MODEL") {
            if !model.trim().is_empty() {
                self.model = Some(PathBuf::from(model));
            }
        }
        if let Ok(input) = std::env::var("PEOPLED_INPUT") {
            if !input.trim().is_empty() {
                self.input = Some(input);
            }
        }
        if let Ok(device) = std::env::var("PEOPLED_DEVICE") {
            if !device.trim().is_empty() {
                self.device = Device::from_str(&device)?;
            }
        }
        if let Ok(addr) = std::env::var("PEOPLED_MQTT_BROKER_ADDR") {
            if !addr.trim().is_empty() {
                self.mqtt.broker_addr = addr;
            }
        }
        if let Ok(threshold) = std::env::var("PEOPLED_CONFIDENCE_THRESHOLD") {
            self.confidence_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("PEOPLED_CONFIDENCE_THRESHOLD must be a number"))?;
        }
        Ok(())
    }

    /// Range checks over the merged configuration. `load` runs this once, and
    /// callers that overlay further values (the CLI) must run it again before
    /// handing the config to the driver.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(anyhow!(
                "confidence threshold {} must be within [0, 1]",
                self.confidence_threshold
            ));
        }
        if self.tracking_threshold <= 0.0 {
            return Err(anyhow!("tracking threshold must be greater than zero"));
        }
        if self.window_capacity == 0 {
            return Err(anyhow!("smoothing window capacity must be greater than zero"));
        }
        if self.model_input_width == 0 || self.model_input_height == 0 {
            return Err(anyhow!("model input dimensions must be non-zero"));
        }
        if let Some(input) = &self.input {
            if input.trim().is_empty() {
                return Err(anyhow!("input source must not be empty"));
            }
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<CounterConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
