#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::{InferenceBackend, RequestStatus};
use crate::detect::tensor::{DetectionTensor, InputTensor, RawDetection, TensorShape};

/// Tract-based ONNX backend for SSD-style person detection models.
///
/// `begin` stores the prepared tensor; the model runs inside `wait`, matching
/// the submit-then-block usage of the driver. Inference errors retire the
/// request as `Failed` so a bad frame is dropped instead of killing the
/// stream. Model loading never touches the network.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    shape: TensorShape,
    pending: Option<InputTensor>,
    output: Option<DetectionTensor>,
}

impl TractBackend {
    /// Load an ONNX model from disk and fix its input shape.
    pub fn load<P: AsRef<Path>>(model_path: P, shape: TensorShape) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(shape.batch, shape.channels, shape.height, shape.width),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            shape,
            pending: None,
            output: None,
        })
    }

    /// Parse SSD detection output: rows of
    /// `[image_id, label, confidence, x1, y1, x2, y2]`, terminated by a
    /// negative image_id.
    fn parse_output(&self, outputs: TVec<Tensor>) -> Result<DetectionTensor> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;

        let flat: Vec<f32> = view.iter().copied().collect();
        let mut records = Vec::new();
        for row in flat.chunks_exact(7) {
            if row[0] < 0.0 {
                break;
            }
            records.push(RawDetection {
                confidence: row[2],
                x1: row[3],
                y1: row[4],
                x2: row[5],
                y2: row[6],
            });
        }
        Ok(DetectionTensor { records })
    }
}

impl InferenceBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn input_shape(&self) -> TensorShape {
        self.shape
    }

    fn begin(&mut self, input: InputTensor) -> Result<()> {
        if input.shape != self.shape {
            return Err(anyhow!(
                "input tensor shape {:?} does not match model input {:?}",
                input.shape,
                self.shape
            ));
        }
        self.pending = Some(input);
        Ok(())
    }

    fn wait(&mut self) -> Result<RequestStatus> {
        let input = self
            .pending
            .take()
            .ok_or_else(|| anyhow!("wait called with no request in flight"))?;

        let tensor = tract_ndarray::Array4::from_shape_vec(
            (
                self.shape.batch,
                self.shape.channels,
                self.shape.height,
                self.shape.width,
            ),
            input.data,
        )
        .context("tensor data did not match declared shape")?
        .into_tensor();

        match self.model.run(tvec!(tensor)) {
            Ok(outputs) => {
                self.output = Some(self.parse_output(outputs)?);
                Ok(RequestStatus::Complete)
            }
            Err(e) => {
                log::warn!("ONNX inference failed: {}", e);
                Ok(RequestStatus::Failed)
            }
        }
    }

    fn take_output(&mut self) -> Result<DetectionTensor> {
        self.output
            .take()
            .ok_or_else(|| anyhow!("take_output called before a completed wait"))
    }
}
