//! HSV color space conversion and the hue/vibrance operations.
//!
//! Hue is stored on the half-degree scale (0–179 spans the wheel) with
//! saturation and value on 0–255, matching the 8-bit HSV encoding the hue
//! shift's wrap-at-180 semantics come from. Conversions run in f32 so a
//! shift-and-convert round trip stays within one count per channel.

use super::calculations::{vibrance_saturation, wrap_hue};
use image::RgbImage;

/// Convert an RGB pixel to (hue, saturation, value).
///
/// Ranges: hue in [0, 180), saturation and value in [0, 255].
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let v = max;
    let s = if max == 0.0 { 0.0 } else { delta / max * 255.0 };

    let h = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    (h / 2.0, s, v)
}

/// Convert (hue, saturation, value) back to an RGB pixel.
///
/// Accepts the same ranges [`rgb_to_hsv`] produces.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let h_deg = (h * 2.0).rem_euclid(360.0);
    let s01 = (s / 255.0).clamp(0.0, 1.0);
    let v01 = (v / 255.0).clamp(0.0, 1.0);

    let c = v01 * s01;
    let x = c * (1.0 - ((h_deg / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = v01 - c;

    let (r1, g1, b1) = match h_deg {
        d if d < 60.0 => (c, x, 0.0),
        d if d < 120.0 => (x, c, 0.0),
        d if d < 180.0 => (0.0, c, x),
        d if d < 240.0 => (0.0, x, c),
        d if d < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_u8(r1), to_u8(g1), to_u8(b1))
}

/// Shift every pixel's hue by `shift` half-degrees, wrapping at 180.
pub fn shift_hue(img: &RgbImage, shift: f32) -> RgbImage {
    let mut out = img.clone();
    for p in out.pixels_mut() {
        let (h, s, v) = rgb_to_hsv(p[0], p[1], p[2]);
        let (r, g, b) = hsv_to_rgb(wrap_hue(h, shift), s, v);
        p.0 = [r, g, b];
    }
    out
}

/// Boost saturation weighted toward the less-saturated pixels.
pub fn boost_vibrance(img: &RgbImage, factor: f32) -> RgbImage {
    let mut out = img.clone();
    for p in out.pixels_mut() {
        let (h, s, v) = rgb_to_hsv(p[0], p[1], p[2]);
        let (r, g, b) = hsv_to_rgb(h, vibrance_saturation(s, factor), v);
        p.0 = [r, g, b];
    }
    out
}
