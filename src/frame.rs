//! Frame container.
//!
//! A `Frame` is an owned RGB24 pixel buffer with its stream position. Sources
//! produce frames in arrival order; the driver owns each frame for exactly one
//! loop iteration and hands it to the output sink at the end.

use anyhow::{anyhow, Result};

/// One decoded video frame in RGB24 layout (3 bytes per pixel, row-major).
pub struct Frame {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Monotonically increasing position in the stream, assigned by the source.
    pub index: u64,
}

impl Frame {
    /// Create a frame, validating that the buffer matches the dimensions.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, index: u64) -> Result<Self> {
        let expected = pixel_len(width, height)?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "frame {} buffer length mismatch: expected {} RGB bytes, got {}",
                index,
                expected,
                pixels.len()
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
            index,
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Set one pixel, ignoring coordinates outside the frame.
    pub fn put_pixel(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.pixels[idx..idx + 3].copy_from_slice(&rgb);
    }
}

/// Byte length of a width x height RGB24 buffer.
pub fn pixel_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(3))
        .ok_or_else(|| anyhow!("frame dimensions overflow"))
}
