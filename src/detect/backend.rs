//! Inference backend contract and the single-slot request handle.
//!
//! A backend executes one request at a time. The driver owns an
//! `InferenceSlot`, and `submit` returns a `PendingInference` that mutably
//! borrows the slot. The borrow checker rejects a second `submit` while a
//! request is unretired, so the single-request-in-flight invariant holds at
//! compile time.
//!
//! Backend resource teardown is RAII: dropping the backend releases it exactly
//! once on every exit path, including early-exit errors.

use std::time::{Duration, Instant};

use anyhow::Result;

use crate::detect::tensor::{DetectionTensor, InputTensor, TensorShape};

/// Completion status reported by a backend's `wait`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestStatus {
    Complete,
    Failed,
}

/// Detector backend trait.
///
/// Usage is strictly `begin` then `wait` then (on `Complete`) `take_output`.
/// `take_output` before a successful `wait` is a contract violation and
/// backends may return an error. Callers go through `InferenceSlot`, which
/// enforces the sequencing.
pub trait InferenceBackend: Send {
    /// Backend identifier for logs.
    fn name(&self) -> &'static str;

    /// Input layout, queried once at startup to configure preprocessing.
    fn input_shape(&self) -> TensorShape;

    /// Begin processing a request. Must not block past submission.
    fn begin(&mut self, input: InputTensor) -> Result<()>;

    /// Block until the in-flight request completes or fails.
    fn wait(&mut self) -> Result<RequestStatus>;

    /// Retrieve the output of a completed request.
    fn take_output(&mut self) -> Result<DetectionTensor>;
}

impl<T: InferenceBackend + ?Sized> InferenceBackend for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn input_shape(&self) -> TensorShape {
        (**self).input_shape()
    }

    fn begin(&mut self, input: InputTensor) -> Result<()> {
        (**self).begin(input)
    }

    fn wait(&mut self) -> Result<RequestStatus> {
        (**self).wait()
    }

    fn take_output(&mut self) -> Result<DetectionTensor> {
        (**self).take_output()
    }
}

/// Result of retiring an inference request.
pub enum InferenceOutcome {
    Complete {
        output: DetectionTensor,
        latency: Duration,
    },
    /// The request failed; the frame is dropped by the caller. Recoverable.
    Failed,
}

/// Driver-owned slot wrapping a backend. Exactly one request in flight.
pub struct InferenceSlot<B: InferenceBackend> {
    backend: B,
}

impl<B: InferenceBackend> InferenceSlot<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn input_shape(&self) -> TensorShape {
        self.backend.input_shape()
    }

    /// Submit a request. The returned handle borrows the slot mutably, so no
    /// further submission can happen until the handle is retired via `wait`.
    pub fn submit(&mut self, input: InputTensor) -> Result<PendingInference<'_, B>> {
        let submitted_at = Instant::now();
        self.backend.begin(input)?;
        Ok(PendingInference {
            slot: self,
            submitted_at,
        })
    }
}

/// An unretired inference request. Must be waited to completion before the
/// slot accepts another submission.
pub struct PendingInference<'a, B: InferenceBackend> {
    slot: &'a mut InferenceSlot<B>,
    submitted_at: Instant,
}

impl<B: InferenceBackend> PendingInference<'_, B> {
    /// Block until the request retires. Consuming `self` releases the slot.
    pub fn wait(self) -> Result<InferenceOutcome> {
        match self.slot.backend.wait()? {
            RequestStatus::Complete => {
                let latency = self.submitted_at.elapsed();
                let output = self.slot.backend.take_output()?;
                Ok(InferenceOutcome::Complete { output, latency })
            }
            RequestStatus::Failed => Ok(InferenceOutcome::Failed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::tensor::RawDetection;

    struct ScriptedBackend {
        shape: TensorShape,
        fail: bool,
        output: Option<DetectionTensor>,
    }

    impl InferenceBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn input_shape(&self) -> TensorShape {
            self.shape
        }

        fn begin(&mut self, _input: InputTensor) -> Result<()> {
            if !self.fail {
                self.output = Some(DetectionTensor {
                    records: vec![RawDetection {
                        confidence: 0.9,
                        x1: 0.1,
                        y1: 0.1,
                        x2: 0.5,
                        y2: 0.9,
                    }],
                });
            }
            Ok(())
        }

        fn wait(&mut self) -> Result<RequestStatus> {
            Ok(if self.fail {
                RequestStatus::Failed
            } else {
                RequestStatus::Complete
            })
        }

        fn take_output(&mut self) -> Result<DetectionTensor> {
            self.output
                .take()
                .ok_or_else(|| anyhow::anyhow!("no completed request"))
        }
    }

    fn shape() -> TensorShape {
        TensorShape {
            batch: 1,
            channels: 3,
            height: 2,
            width: 2,
        }
    }

    fn tensor() -> InputTensor {
        InputTensor::new(shape(), vec![0.0; 12]).unwrap()
    }

    #[test]
    fn complete_outcome_carries_output_and_latency() {
        let mut slot = InferenceSlot::new(ScriptedBackend {
            shape: shape(),
            fail: false,
            output: None,
        });
        let pending = slot.submit(tensor()).unwrap();
        match pending.wait().unwrap() {
            InferenceOutcome::Complete { output, .. } => {
                assert_eq!(output.records.len(), 1);
            }
            InferenceOutcome::Failed => panic!("expected completion"),
        }
        // Slot is free again after the handle retired.
        let pending = slot.submit(tensor()).unwrap();
        assert!(pending.wait().is_ok());
    }

    #[test]
    fn failed_outcome_is_recoverable() {
        let mut slot = InferenceSlot::new(ScriptedBackend {
            shape: shape(),
            fail: true,
            output: None,
        });
        let pending = slot.submit(tensor()).unwrap();
        assert!(matches!(pending.wait().unwrap(), InferenceOutcome::Failed));
    }
}
