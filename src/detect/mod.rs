mod backend;
mod backends;
mod filter;
mod preprocess;
mod tensor;

pub use backend::{
    InferenceBackend, InferenceOutcome, InferenceSlot, PendingInference, RequestStatus,
};
pub use backends::{build_backend, Device, StubBackend};
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use filter::filter_detections;
pub use preprocess::FramePreprocessor;
pub use tensor::{
    DetectionTensor, FrameDetections, InputTensor, PixelBox, RawDetection, TensorShape,
};
