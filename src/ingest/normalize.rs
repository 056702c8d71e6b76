use anyhow::{anyhow, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PixelFormat {
    Rgb24,
    Yuyv,
}

pub(crate) fn normalize_to_rgb(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<Vec<u8>> {
    match format {
        PixelFormat::Rgb24 => {
            let expected = width
                .checked_mul(height)
                .and_then(|v| v.checked_mul(3))
                .ok_or_else(|| anyhow!("RGB frame dimensions overflow"))? as usize;
            if pixels.len() != expected {
                return Err(anyhow!(
                    "RGB frame length mismatch: expected {}, got {}",
                    expected,
                    pixels.len()
                ));
            }
            Ok(pixels.to_vec())
        }
        PixelFormat::Yuyv => yuyv_to_rgb(pixels, width, height),
    }
}

fn yuyv_to_rgb(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let w = width as usize;
    let h = height as usize;
    let expected = w
        .checked_mul(h)
        .and_then(|v| v.checked_mul(2))
        .ok_or_else(|| anyhow!("YUYV frame dimensions overflow"))?;
    if pixels.len() != expected {
        return Err(anyhow!(
            "YUYV frame length mismatch: expected {}, got {}",
            expected,
            pixels.len()
        ));
    }

    let mut rgb = vec![0u8; w * h * 3];
    for j in 0..h {
        for i in 0..w {
            // Each 4-byte YUYV group covers two horizontally adjacent pixels.
            let group = (j * w + i) / 2 * 4;
            let y = pixels[group + (i % 2) * 2] as f32;
            let u = pixels[group + 1] as f32 - 128.0;
            let v = pixels[group + 3] as f32 - 128.0;

            let r = y + 1.402_f32 * v;
            let g = y - 0.344_136_f32 * u - 0.714_136_f32 * v;
            let b = y + 1.772_f32 * u;

            let out = (j * w + i) * 3;
            rgb[out] = r.clamp(0.0, 255.0) as u8;
            rgb[out + 1] = g.clamp(0.0, 255.0) as u8;
            rgb[out + 2] = b.clamp(0.0, 255.0) as u8;
        }
    }
    Ok(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_passthrough_validates_length() {
        assert!(normalize_to_rgb(&[0u8; 12], 2, 2, PixelFormat::Rgb24).is_ok());
        assert!(normalize_to_rgb(&[0u8; 11], 2, 2, PixelFormat::Rgb24).is_err());
    }

    #[test]
    fn yuyv_grey_converts_to_grey() {
        // Y=128, U=V=128 is mid-grey in both spaces.
        let yuyv = [128u8; 8];
        let rgb = normalize_to_rgb(&yuyv, 2, 2, PixelFormat::Yuyv).unwrap();
        assert_eq!(rgb.len(), 12);
        for &b in &rgb {
            assert!((b as i32 - 128).abs() <= 1);
        }
    }

    #[test]
    fn yuyv_rejects_wrong_length() {
        assert!(normalize_to_rgb(&[0u8; 7], 2, 2, PixelFormat::Yuyv).is_err());
    }
}
