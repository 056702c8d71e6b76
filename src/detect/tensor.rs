//! Tensor and detection record types shared across the detect layer.

use anyhow::{anyhow, Result};

/// Input tensor layout required by a backend: (batch, channels, height, width).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TensorShape {
    pub batch: usize,
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl TensorShape {
    pub fn element_count(&self) -> usize {
        self.batch * self.channels * self.height * self.width
    }
}

/// Preprocessed frame data in the backend's declared shape.
pub struct InputTensor {
    pub shape: TensorShape,
    pub data: Vec<f32>,
}

impl InputTensor {
    pub fn new(shape: TensorShape, data: Vec<f32>) -> Result<Self> {
        if data.len() != shape.element_count() {
            return Err(anyhow!(
                "tensor data length {} does not match shape {:?} ({} elements)",
                data.len(),
                shape,
                shape.element_count()
            ));
        }
        Ok(Self { shape, data })
    }
}

/// One raw detection record from the model: confidence plus a normalized box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawDetection {
    pub confidence: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Ordered raw model output for one frame. Consumed once by the filter.
#[derive(Clone, Debug, Default)]
pub struct DetectionTensor {
    pub records: Vec<RawDetection>,
}

/// A detection box converted to pixel space for annotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelBox {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

/// Filtered per-frame result: count of confident detections plus their boxes.
#[derive(Clone, Debug, Default)]
pub struct FrameDetections {
    pub raw_count: usize,
    pub boxes: Vec<PixelBox>,
}
