//! Factor-based tonal adjustments.
//!
//! Each adjustment interpolates between a degenerate image and the original:
//! black for brightness, uniform mean-luma gray for contrast, the grayscale
//! rendition for saturation, and a smoothed copy for sharpness. Factor 1.0 is
//! always the identity, 0.0 is the degenerate, and factors past 1.0
//! extrapolate with channel clamping.

use super::calculations::{lerp_channel, luma};
use super::convolve::{self, SHARPEN, SMOOTH};
use image::RgbImage;
use rayon::prelude::*;

/// Pixelwise linear interpolation from `from` toward `to`.
///
/// Both images must share dimensions. `factor` may exceed 1.0; channels
/// saturate at the u8 range. Negative factors stop at `from`: an adjustment
/// never overshoots past its degenerate.
pub fn interpolate(from: &RgbImage, to: &RgbImage, factor: f32) -> RgbImage {
    debug_assert_eq!(from.dimensions(), to.dimensions());
    let factor = factor.max(0.0);
    let stride = to.width() as usize * 3;
    let mut out = to.clone();
    if stride == 0 {
        return out;
    }
    let from_raw = from.as_raw().as_slice();

    out.par_chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let offset = y * stride;
            for (i, value) in row.iter_mut().enumerate() {
                *value = lerp_channel(from_raw[offset + i], *value, factor);
            }
        });

    out
}

/// Broadcast each pixel's luma across all three channels.
pub fn grayscale(img: &RgbImage) -> RgbImage {
    let mut out = img.clone();
    for p in out.pixels_mut() {
        let l = luma(p[0], p[1], p[2]);
        p.0 = [l, l, l];
    }
    out
}

fn mean_luma(img: &RgbImage) -> u8 {
    let count = img.width() as u64 * img.height() as u64;
    if count == 0 {
        return 0;
    }
    let sum: u64 = img.pixels().map(|p| luma(p[0], p[1], p[2]) as u64).sum();
    (sum as f64 / count as f64 + 0.5) as u8
}

pub fn adjust_brightness(img: &RgbImage, factor: f32) -> RgbImage {
    let black = RgbImage::new(img.width(), img.height());
    interpolate(&black, img, factor)
}

pub fn adjust_contrast(img: &RgbImage, factor: f32) -> RgbImage {
    let mean = mean_luma(img);
    let gray = RgbImage::from_pixel(img.width(), img.height(), image::Rgb([mean, mean, mean]));
    interpolate(&gray, img, factor)
}

pub fn adjust_saturation(img: &RgbImage, factor: f32) -> RgbImage {
    interpolate(&grayscale(img), img, factor)
}

pub fn adjust_sharpness(img: &RgbImage, factor: f32) -> RgbImage {
    interpolate(&convolve::convolve3x3(img, &SMOOTH), img, factor)
}

/// The fixed enhancement pipeline behind the one-shot enhance operation:
/// contrast 1.2, brightness 1.1, sharpness 1.5, saturation 1.2, then an
/// edge-boosting kernel pass.
pub fn auto_adjust(img: &RgbImage) -> RgbImage {
    let img = adjust_contrast(img, 1.2);
    let img = adjust_brightness(&img, 1.1);
    let img = adjust_sharpness(&img, 1.5);
    let img = adjust_saturation(&img, 1.2);
    convolve::convolve3x3(&img, &SHARPEN)
}
