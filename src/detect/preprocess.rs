//! Frame preprocessing into the backend's input layout.

use anyhow::{anyhow, Result};

use crate::detect::tensor::{InputTensor, TensorShape};
use crate::frame::Frame;

/// Converts RGB24 frames into the (batch, channels, height, width) tensor a
/// backend expects: nearest-neighbor resize, HWC to CHW reorder, and scale to
/// [0, 1]. The resize is deterministic, so preprocessing is a pure function of
/// the frame contents.
pub struct FramePreprocessor {
    shape: TensorShape,
}

impl FramePreprocessor {
    pub fn new(shape: TensorShape) -> Result<Self> {
        if shape.batch != 1 {
            return Err(anyhow!("unsupported batch size {}", shape.batch));
        }
        if shape.channels != 3 {
            return Err(anyhow!(
                "unsupported channel count {} (RGB24 input requires 3)",
                shape.channels
            ));
        }
        if shape.width == 0 || shape.height == 0 {
            return Err(anyhow!("backend declared a zero-sized input shape"));
        }
        Ok(Self { shape })
    }

    pub fn shape(&self) -> TensorShape {
        self.shape
    }

    /// Produce an input tensor for a well-formed frame. The output length is
    /// always `shape.element_count()` regardless of the frame's dimensions.
    pub fn prepare(&self, frame: &Frame) -> Result<InputTensor> {
        if frame.width == 0 || frame.height == 0 {
            return Err(anyhow!("frame {} has zero dimensions", frame.index));
        }

        let tw = self.shape.width;
        let th = self.shape.height;
        let src = frame.pixels();
        let src_w = frame.width as usize;

        let mut data = vec![0.0f32; self.shape.element_count()];
        let plane = tw * th;
        for ty in 0..th {
            // Nearest-neighbor source row for this target row.
            let sy = (ty * frame.height as usize) / th;
            for tx in 0..tw {
                let sx = (tx * src_w) / tw;
                let src_idx = (sy * src_w + sx) * 3;
                let dst_idx = ty * tw + tx;
                for channel in 0..3 {
                    data[channel * plane + dst_idx] = src[src_idx + channel] as f32 / 255.0;
                }
            }
        }

        InputTensor::new(self.shape, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(w: usize, h: usize) -> TensorShape {
        TensorShape {
            batch: 1,
            channels: 3,
            height: h,
            width: w,
        }
    }

    #[test]
    fn output_always_matches_declared_shape() {
        let pre = FramePreprocessor::new(shape(4, 4)).unwrap();
        for (w, h) in [(2u32, 2u32), (4, 4), (7, 3), (640, 480)] {
            let frame = Frame::new(vec![128u8; (w * h * 3) as usize], w, h, 0).unwrap();
            let tensor = pre.prepare(&frame).unwrap();
            assert_eq!(tensor.data.len(), pre.shape().element_count());
        }
    }

    #[test]
    fn reorders_channels_to_chw() {
        // 1x1 source pixel (10, 20, 30) upscaled to 2x2: each channel plane
        // must be contiguous in the output.
        let pre = FramePreprocessor::new(shape(2, 2)).unwrap();
        let frame = Frame::new(vec![10, 20, 30], 1, 1, 0).unwrap();
        let tensor = pre.prepare(&frame).unwrap();
        let expected: Vec<f32> = [10u8, 10, 10, 10, 20, 20, 20, 20, 30, 30, 30, 30]
            .iter()
            .map(|&b| b as f32 / 255.0)
            .collect();
        assert_eq!(tensor.data, expected);
    }

    #[test]
    fn rejects_non_rgb_shapes() {
        assert!(FramePreprocessor::new(TensorShape {
            batch: 1,
            channels: 1,
            height: 4,
            width: 4,
        })
        .is_err());
        assert!(FramePreprocessor::new(TensorShape {
            batch: 2,
            channels: 3,
            height: 4,
            width: 4,
        })
        .is_err());
    }
}
