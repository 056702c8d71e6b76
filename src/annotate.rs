//! Frame annotation: detection box outlines and the inference-latency overlay.
//!
//! Drawing happens directly on the RGB24 buffer. Text uses a small built-in
//! 5x7 bitmap font so no font assets ship with the binary; the glyph set
//! covers exactly the latency line.

use std::time::Duration;

use crate::detect::PixelBox;
use crate::frame::Frame;

const BOX_COLOR: [u8; 3] = [150, 0, 150];
const TEXT_COLOR: [u8; 3] = [200, 10, 10];
const TEXT_ORIGIN: (i64, i64) = (30, 30);
const TEXT_SCALE: i64 = 2;
const GLYPH_WIDTH: i64 = 5;
const GLYPH_HEIGHT: i64 = 7;

/// Draw detection boxes and the latency text onto the frame.
pub fn annotate_frame(frame: &mut Frame, boxes: &[PixelBox], latency: Duration) {
    for b in boxes {
        draw_box(frame, b);
    }
    let text = format!("inference time: {:.3}ms", latency.as_secs_f64() * 1000.0);
    draw_text(frame, TEXT_ORIGIN.0, TEXT_ORIGIN.1, &text);
}

/// 1-pixel rectangle outline, clipped to the frame by `put_pixel`.
fn draw_box(frame: &mut Frame, b: &PixelBox) {
    for x in b.x1..=b.x2 {
        frame.put_pixel(x, b.y1, BOX_COLOR);
        frame.put_pixel(x, b.y2, BOX_COLOR);
    }
    for y in b.y1..=b.y2 {
        frame.put_pixel(b.x1, y, BOX_COLOR);
        frame.put_pixel(b.x2, y, BOX_COLOR);
    }
}

fn draw_text(frame: &mut Frame, x: i64, y: i64, text: &str) {
    let mut cursor = x;
    for ch in text.chars() {
        if let Some(rows) = glyph(ch) {
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                        for dy in 0..TEXT_SCALE {
                            for dx in 0..TEXT_SCALE {
                                frame.put_pixel(
                                    cursor + col * TEXT_SCALE + dx,
                                    y + row as i64 * TEXT_SCALE + dy,
                                    TEXT_COLOR,
                                );
                            }
                        }
                    }
                }
            }
        }
        cursor += (GLYPH_WIDTH + 1) * TEXT_SCALE;
    }
}

/// 5x7 glyphs for the latency line. Unknown characters render as a blank cell.
fn glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'i' => [0x04, 0x00, 0x0C, 0x04, 0x04, 0x04, 0x0E],
        'n' => [0x00, 0x00, 0x16, 0x19, 0x11, 0x11, 0x11],
        'f' => [0x06, 0x09, 0x08, 0x1C, 0x08, 0x08, 0x08],
        'e' => [0x00, 0x00, 0x0E, 0x11, 0x1F, 0x10, 0x0E],
        'r' => [0x00, 0x00, 0x16, 0x19, 0x10, 0x10, 0x10],
        'c' => [0x00, 0x00, 0x0E, 0x11, 0x10, 0x11, 0x0E],
        't' => [0x08, 0x08, 0x1C, 0x08, 0x08, 0x09, 0x06],
        'm' => [0x00, 0x00, 0x1A, 0x15, 0x15, 0x15, 0x15],
        's' => [0x00, 0x00, 0x0F, 0x10, 0x0E, 0x01, 0x1E],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ' ' => [0x00; 7],
        _ => return None,
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_frame(w: u32, h: u32) -> Frame {
        Frame::new(vec![0u8; (w * h * 3) as usize], w, h, 0).unwrap()
    }

    #[test]
    fn draws_box_outline_only() {
        let mut frame = blank_frame(10, 10);
        draw_box(
            &mut frame,
            &PixelBox {
                x1: 2,
                y1: 2,
                x2: 7,
                y2: 7,
            },
        );
        let pixel = |f: &Frame, x: usize, y: usize| {
            let idx = (y * 10 + x) * 3;
            [f.pixels()[idx], f.pixels()[idx + 1], f.pixels()[idx + 2]]
        };
        assert_eq!(pixel(&frame, 2, 2), BOX_COLOR);
        assert_eq!(pixel(&frame, 7, 5), BOX_COLOR);
        // Interior untouched.
        assert_eq!(pixel(&frame, 4, 4), [0, 0, 0]);
    }

    #[test]
    fn boxes_outside_the_frame_are_clipped() {
        let mut frame = blank_frame(8, 8);
        draw_box(
            &mut frame,
            &PixelBox {
                x1: -5,
                y1: -5,
                x2: 20,
                y2: 20,
            },
        );
        // No panic; nothing landed inside an 8x8 frame whose outline rows are
        // all out of range.
        assert!(frame.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn latency_text_marks_pixels() {
        let mut frame = blank_frame(640, 480);
        annotate_frame(&mut frame, &[], Duration::from_millis(12));
        assert!(frame.pixels().iter().any(|&b| b != 0));
    }

    #[test]
    fn glyph_set_covers_the_latency_line() {
        for ch in "inference time: 0123456789.ms".chars() {
            assert!(glyph(ch).is_some(), "missing glyph for {:?}", ch);
        }
    }
}
