//! Local file frame source.
//!
//! `stub://` inputs select a synthetic generator used by tests and broker-free
//! smoke runs. Still images (jpg/bmp) decode to a one-frame stream. Anything
//! else must be a local video path decoded via FFmpeg (feature:
//! ingest-file-ffmpeg); URL schemes are rejected.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::GenericImageView;

#[cfg(feature = "ingest-file-ffmpeg")]
use super::file_ffmpeg::FfmpegFileSource;
use crate::frame::{pixel_len, Frame};

/// Statistics for a video source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub input: String,
}

/// Local file frame source.
pub struct FileSource {
    backend: FileBackend,
}

enum FileBackend {
    Synthetic(SyntheticSource),
    Still(StillImageSource),
    #[cfg(feature = "ingest-file-ffmpeg")]
    Ffmpeg(FfmpegFileSource),
}

impl FileSource {
    pub fn new(path: &str, target_fps: u32) -> Result<Self> {
        if !is_local_file_path(path) {
            return Err(anyhow!(
                "file ingestion only supports local paths (no URL schemes)"
            ));
        }
        if path.starts_with("stub://") {
            Ok(Self {
                backend: FileBackend::Synthetic(SyntheticSource::new(path)),
            })
        } else if is_still_image_path(path) {
            Ok(Self {
                backend: FileBackend::Still(StillImageSource::new(path)?),
            })
        } else {
            #[cfg(feature = "ingest-file-ffmpeg")]
            {
                Ok(Self {
                    backend: FileBackend::Ffmpeg(FfmpegFileSource::new(path, target_fps)?),
                })
            }
            #[cfg(not(feature = "ingest-file-ffmpeg"))]
            {
                let _ = target_fps;
                Err(anyhow!(
                    "file ingestion requires the ingest-file-ffmpeg feature"
                ))
            }
        }
    }

    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source.connect(),
            FileBackend::Still(source) => source.connect(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.connect(),
        }
    }

    /// Decode the next frame. `Ok(None)` is clean end-of-stream.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source.next_frame(),
            FileBackend::Still(source) => source.next_frame(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.next_frame(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            FileBackend::Synthetic(_) => true,
            FileBackend::Still(_) => true,
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.is_healthy(),
        }
    }

    pub fn stats(&self) -> SourceStats {
        match &self.backend {
            FileBackend::Synthetic(source) => source.stats(),
            FileBackend::Still(source) => source.stats(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.stats(),
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests and smoke runs
// ----------------------------------------------------------------------------

const SYNTHETIC_WIDTH: u32 = 64;
const SYNTHETIC_HEIGHT: u32 = 48;
const SYNTHETIC_FRAME_COUNT: u64 = 120;
/// Scene length in frames; alternate scenes render bright ("occupied").
const SYNTHETIC_SCENE_LEN: u64 = 40;

/// Deterministic synthetic stream.
///
/// Renders alternating 40-frame scenes: dark (empty) then bright (occupied),
/// which the stub backend reports as person detections. Ends after a fixed
/// number of frames so driver tests exercise the end-of-stream path.
struct SyntheticSource {
    input: String,
    frames_emitted: u64,
    frame_limit: u64,
}

impl SyntheticSource {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
            frames_emitted: 0,
            frame_limit: SYNTHETIC_FRAME_COUNT,
        }
    }

    fn connect(&mut self) -> Result<()> {
        log::info!("FileSource: connected to {} (synthetic)", self.input);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.frames_emitted >= self.frame_limit {
            return Ok(None);
        }
        let index = self.frames_emitted;
        self.frames_emitted += 1;

        let occupied = (index / SYNTHETIC_SCENE_LEN) % 2 == 1;
        let level = if occupied { 230 } else { 20 };
        let pixels = vec![level; pixel_len(SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT)?];
        Ok(Some(Frame::new(
            pixels,
            SYNTHETIC_WIDTH,
            SYNTHETIC_HEIGHT,
            index,
        )?))
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frames_emitted,
            input: self.input.clone(),
        }
    }
}

// ----------------------------------------------------------------------------
// Still image source (jpg/bmp): a one-frame stream
// ----------------------------------------------------------------------------

/// Single still image decoded up front and emitted as a one-frame stream.
///
/// The frame runs through the same detection and annotation path as video;
/// end-of-stream follows immediately after it.
struct StillImageSource {
    input: String,
    frame: Option<Frame>,
    frames_emitted: u64,
}

impl StillImageSource {
    fn new(path: &str) -> Result<Self> {
        let decoded = image::open(path)
            .with_context(|| format!("failed to decode still image {}", path))?;
        let (width, height) = decoded.dimensions();
        let pixels = decoded.into_rgb8().into_raw();
        Ok(Self {
            input: path.to_string(),
            frame: Some(Frame::new(pixels, width, height, 0)?),
            frames_emitted: 0,
        })
    }

    fn connect(&mut self) -> Result<()> {
        log::info!("FileSource: connected to {} (still image)", self.input);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let frame = self.frame.take();
        if frame.is_some() {
            self.frames_emitted += 1;
        }
        Ok(frame)
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frames_emitted,
            input: self.input.clone(),
        }
    }
}

fn is_still_image_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            matches!(
                ext.to_ascii_lowercase().as_str(),
                "jpg" | "jpeg" | "bmp"
            )
        })
        .unwrap_or(false)
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.starts_with("stub://") {
        return true;
    }
    !path.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_url_schemes() {
        assert!(FileSource::new("rtsp://camera/stream", 10).is_err());
        assert!(FileSource::new("http://example/video.mp4", 10).is_err());
        assert!(FileSource::new("", 10).is_err());
    }

    #[test]
    fn synthetic_source_ends_cleanly() {
        let mut source = FileSource::new("stub://test", 10).unwrap();
        source.connect().unwrap();
        let mut frames = 0;
        while let Some(frame) = source.next_frame().unwrap() {
            assert_eq!(frame.index, frames);
            frames += 1;
        }
        assert_eq!(frames, SYNTHETIC_FRAME_COUNT);
        // End-of-stream is sticky.
        assert!(source.next_frame().unwrap().is_none());
        assert_eq!(source.stats().frames_captured, SYNTHETIC_FRAME_COUNT);
    }

    #[test]
    fn still_image_yields_exactly_one_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.bmp");
        let mut img = image::RgbImage::new(2, 2);
        img.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        img.save(&path).unwrap();

        let mut source = FileSource::new(path.to_str().unwrap(), 10).unwrap();
        source.connect().unwrap();
        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!((frame.width, frame.height), (2, 2));
        assert_eq!(&frame.pixels()[..3], &[255, 0, 0]);
        // End-of-stream right after the single frame, and it is sticky.
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.next_frame().unwrap().is_none());
        assert_eq!(source.stats().frames_captured, 1);
    }

    #[test]
    fn still_image_extensions_are_case_insensitive() {
        assert!(is_still_image_path("room.jpg"));
        assert!(is_still_image_path("room.JPG"));
        assert!(is_still_image_path("room.jpeg"));
        assert!(is_still_image_path("room.bmp"));
        assert!(!is_still_image_path("room.mp4"));
        assert!(!is_still_image_path("room"));
    }

    #[test]
    fn synthetic_scenes_alternate_brightness() {
        let mut source = FileSource::new("stub://test", 10).unwrap();
        let first = source.next_frame().unwrap().unwrap();
        assert!(first.pixels().iter().all(|&b| b == 20));
        for _ in 1..SYNTHETIC_SCENE_LEN {
            source.next_frame().unwrap();
        }
        let occupied = source.next_frame().unwrap().unwrap();
        assert!(occupied.pixels().iter().all(|&b| b == 230));
    }
}
