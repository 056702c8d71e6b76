//! Video input sources.
//!
//! Input kinds, selected by the input string:
//! - `stub://<name>`: deterministic synthetic stream (always available)
//! - `CAM`: live camera via V4L2 (feature: ingest-v4l2)
//! - still image path (jpg/bmp): one-frame stream (always available)
//! - local video file path: FFmpeg decode (feature: ingest-file-ffmpeg)
//!
//! Every source yields RGB24 `Frame`s in arrival order with monotonically
//! increasing indices, and signals end-of-stream with `Ok(None)` rather than
//! an error, so the driver shuts down cleanly on a finite input.

#[cfg(feature = "ingest-v4l2")]
pub mod camera;
pub mod file;
#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod file_ffmpeg;
#[cfg(feature = "ingest-v4l2")]
pub(crate) mod normalize;

#[cfg(feature = "ingest-v4l2")]
pub use camera::CameraSource;
pub use file::{FileSource, SourceStats};

use anyhow::Result;

use crate::frame::Frame;

/// Sentinel input value selecting the live camera.
pub const CAMERA_SENTINEL: &str = "CAM";

/// A video input stream.
pub enum VideoSource {
    File(FileSource),
    #[cfg(feature = "ingest-v4l2")]
    Camera(CameraSource),
}

impl VideoSource {
    /// Open the input named on the command line. Failure here is fatal for
    /// the run.
    pub fn open(input: &str, target_fps: u32) -> Result<Self> {
        if input == CAMERA_SENTINEL {
            #[cfg(feature = "ingest-v4l2")]
            {
                let mut source = CameraSource::new(target_fps)?;
                source.connect()?;
                return Ok(Self::Camera(source));
            }
            #[cfg(not(feature = "ingest-v4l2"))]
            {
                anyhow::bail!("camera input requires the ingest-v4l2 feature");
            }
        }
        let mut source = FileSource::new(input, target_fps)?;
        source.connect()?;
        Ok(Self::File(source))
    }

    /// Pull the next frame. `Ok(None)` is end-of-stream.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self {
            Self::File(source) => source.next_frame(),
            #[cfg(feature = "ingest-v4l2")]
            Self::Camera(source) => source.next_frame(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        match self {
            Self::File(source) => source.is_healthy(),
            #[cfg(feature = "ingest-v4l2")]
            Self::Camera(source) => source.is_healthy(),
        }
    }

    pub fn stats(&self) -> SourceStats {
        match self {
            Self::File(source) => source.stats(),
            #[cfg(feature = "ingest-v4l2")]
            Self::Camera(source) => source.stats(),
        }
    }
}
