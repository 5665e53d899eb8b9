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

/// YUYV 4:2:2 to RGB24. Two pixels per macropixel: Y0 U Y1 V.
fn yuyv_to_rgb(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let w = width as usize;
    let h = height as usize;
    if w % 2 != 0 {
        return Err(anyhow!("YUYV requires an even width, got {}", w));
    }
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
        for i in (0..w).step_by(2) {
            let base = (j * w + i) * 2;
            let y0 = pixels[base] as f32;
            let u = pixels[base + 1] as f32 - 128.0;
            let y1 = pixels[base + 2] as f32;
            let v = pixels[base + 3] as f32 - 128.0;

            for (k, y) in [(0usize, y0), (1, y1)] {
                let r = y + 1.402_f32 * v;
                let g = y - 0.344_136_f32 * u - 0.714_136_f32 * v;
                let b = y + 1.772_f32 * u;

                let offset = (j * w + i + k) * 3;
                rgb[offset] = clamp_to_u8(r);
                rgb[offset + 1] = clamp_to_u8(g);
                rgb[offset + 2] = clamp_to_u8(b);
            }
        }
    }

    Ok(rgb)
}

fn clamp_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
