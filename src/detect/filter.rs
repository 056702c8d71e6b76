//! Confidence filtering and pixel-space conversion of raw detections.

use crate::detect::tensor::{DetectionTensor, FrameDetections, PixelBox};

/// Threshold raw detections and convert the survivors to pixel-space boxes.
///
/// A record survives iff its confidence strictly exceeds `threshold`.
/// Normalized coordinates are scaled by the frame dimensions and truncated to
/// integers. Detector order is preserved for annotation. An empty tensor
/// yields a zero count and no boxes.
///
/// Pure function: identical inputs always produce identical results.
pub fn filter_detections(
    tensor: &DetectionTensor,
    threshold: f32,
    frame_width: u32,
    frame_height: u32,
) -> FrameDetections {
    let mut boxes = Vec::new();
    for record in &tensor.records {
        if record.confidence > threshold {
            boxes.push(PixelBox {
                x1: (record.x1 * frame_width as f32) as i64,
                y1: (record.y1 * frame_height as f32) as i64,
                x2: (record.x2 * frame_width as f32) as i64,
                y2: (record.y2 * frame_height as f32) as i64,
            });
        }
    }
    FrameDetections {
        raw_count: boxes.len(),
        boxes,
    }
}
