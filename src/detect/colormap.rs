//! Heat pseudo-color palette.
//!
//! Grayscale intensity maps to a blue-to-red ramp for the recorded
//! visualization. The red plane doubles as the detection signal (the "heat
//! channel"): it is monotone non-decreasing in intensity and reaches 255
//! only at intensity 255, so the absolute fire threshold of 255 selects
//! exactly the maximum-intensity pixels.

use image::{GrayImage, Rgb, RgbImage};

/// Map one intensity to palette RGB.
///
/// red = v, green peaks mid-range, blue = 255 - v.
pub fn heat_palette(v: u8) -> [u8; 3] {
    let green = 255 - (2 * v as i32 - 255).unsigned_abs().min(255) as u8;
    [v, green, 255 - v]
}

/// Render a grayscale image through the heat palette.
pub fn apply_heat_palette(gray: &GrayImage) -> RgbImage {
    let mut out = RgbImage::new(gray.width(), gray.height());
    for (src, dst) in gray.pixels().zip(out.pixels_mut()) {
        *dst = Rgb(heat_palette(src.0[0]));
    }
    out
}

/// Extract the red plane, the heat channel used for thresholding.
pub fn heat_channel(heatmap: &RgbImage) -> GrayImage {
    let mut out = GrayImage::new(heatmap.width(), heatmap.height());
    for (src, dst) in heatmap.pixels().zip(out.pixels_mut()) {
        dst.0[0] = src.0[0];
    }
    out
}
