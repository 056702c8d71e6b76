//! Backend construction and target-device selection.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::detect::backend::InferenceBackend;
use crate::detect::tensor::TensorShape;

mod stub;
#[cfg(feature = "backend-tract")]
mod tract;

pub use stub::StubBackend;
#[cfg(feature = "backend-tract")]
pub use tract::TractBackend;

/// Target device class for inference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Device {
    #[default]
    Cpu,
    Gpu,
    Accel,
}

impl FromStr for Device {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            "gpu" => Ok(Device::Gpu),
            "accel" => Ok(Device::Accel),
            other => Err(anyhow!(
                "unknown device '{}' (expected cpu, gpu, or accel)",
                other
            )),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Device::Cpu => "cpu",
            Device::Gpu => "gpu",
            Device::Accel => "accel",
        };
        f.write_str(name)
    }
}

/// Build the inference backend for a run.
///
/// With no model path the deterministic stub backend is used regardless of
/// device. With a model path, loading requires the `backend-tract` feature
/// and a supported device; an unsupported device is a load-time failure, not
/// something discovered mid-stream.
pub fn build_backend(
    model_path: Option<&Path>,
    device: Device,
    shape: TensorShape,
) -> Result<Box<dyn InferenceBackend>> {
    let Some(model_path) = model_path else {
        log::info!("no model configured, using stub backend on {}", device);
        return Ok(Box::new(StubBackend::new(shape)));
    };

    #[cfg(feature = "backend-tract")]
    {
        if device != Device::Cpu {
            return Err(anyhow!(
                "device '{}' is not supported by the tract backend (cpu only)",
                device
            ));
        }
        let backend = TractBackend::load(model_path, shape)?;
        Ok(Box::new(backend))
    }

    #[cfg(not(feature = "backend-tract"))]
    {
        let _ = device;
        Err(anyhow!(
            "model {} requires the backend-tract feature",
            model_path.display()
        ))
    }
}
