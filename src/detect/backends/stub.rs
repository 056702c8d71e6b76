//! Deterministic stub backend for tests and stub:// runs.

use anyhow::{anyhow, Result};

use crate::detect::backend::{InferenceBackend, RequestStatus};
use crate::detect::tensor::{DetectionTensor, InputTensor, RawDetection, TensorShape};

/// Mean-brightness threshold above which the stub reports a person. The
/// synthetic source renders its "occupied" scenes bright.
const BRIGHTNESS_THRESHOLD: f32 = 0.5;

/// Stub person detector.
///
/// Reports a single confident, centered detection whenever the mean of the
/// input tensor exceeds a brightness threshold. Deterministic: the same frame
/// always produces the same output. Individual requests can be scripted to
/// fail for driver fail-soft tests.
pub struct StubBackend {
    shape: TensorShape,
    requests_seen: u64,
    fail_requests: Vec<u64>,
    pending: Option<InputTensor>,
    output: Option<DetectionTensor>,
}

impl StubBackend {
    pub fn new(shape: TensorShape) -> Self {
        Self {
            shape,
            requests_seen: 0,
            fail_requests: Vec::new(),
            pending: None,
            output: None,
        }
    }

    /// Script the given request ordinals (0-based) to report failure.
    pub fn fail_on(mut self, requests: &[u64]) -> Self {
        self.fail_requests = requests.to_vec();
        self
    }
}

impl InferenceBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn input_shape(&self) -> TensorShape {
        self.shape
    }

    fn begin(&mut self, input: InputTensor) -> Result<()> {
        self.pending = Some(input);
        Ok(())
    }

    fn wait(&mut self) -> Result<RequestStatus> {
        let input = self
            .pending
            .take()
            .ok_or_else(|| anyhow!("wait called with no request in flight"))?;

        let request = self.requests_seen;
        self.requests_seen += 1;
        if self.fail_requests.contains(&request) {
            return Ok(RequestStatus::Failed);
        }

        let mean = if input.data.is_empty() {
            0.0
        } else {
            input.data.iter().sum::<f32>() / input.data.len() as f32
        };

        let records = if mean > BRIGHTNESS_THRESHOLD {
            vec![RawDetection {
                confidence: 0.95,
                x1: 0.25,
                y1: 0.2,
                x2: 0.75,
                y2: 0.95,
            }]
        } else {
            Vec::new()
        };

        self.output = Some(DetectionTensor { records });
        Ok(RequestStatus::Complete)
    }

    fn take_output(&mut self) -> Result<DetectionTensor> {
        self.output
            .take()
            .ok_or_else(|| anyhow!("take_output called before a completed wait"))
    }
}
