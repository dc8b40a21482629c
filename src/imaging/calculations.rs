//! Pure per-pixel and geometry math for the image operations.
//!
//! All functions here are pure and testable without any I/O or images. The
//! image-walking loops live in the operation modules; the formulas live here.

/// Linearly interpolate one channel value from `from` toward `to`.
///
/// `factor` 0.0 returns `from`, 1.0 returns `to`, values above 1.0
/// extrapolate. The result rounds to nearest and clamps to [0, 255].
///
/// This single formula drives both the enhancement operations (interpolating
/// from a degenerate image toward the original) and the special-cased filters
/// (interpolating from the original toward the fully-filtered image).
///
/// # Examples
/// ```
/// # use retouch::imaging::calculations::lerp_channel;
/// assert_eq!(lerp_channel(0, 200, 0.0), 0);
/// assert_eq!(lerp_channel(0, 200, 1.0), 200);
/// assert_eq!(lerp_channel(0, 200, 0.5), 100);
/// // Extrapolation clamps
/// assert_eq!(lerp_channel(0, 200, 2.0), 255);
/// ```
#[inline]
pub fn lerp_channel(from: u8, to: u8, factor: f32) -> u8 {
    let v = from as f32 + (to as f32 - from as f32) * factor;
    v.round().clamp(0.0, 255.0) as u8
}

/// Rec. 601 luminance of an RGB pixel, with the exact integer weights and
/// rounding the reference grayscale conversion uses.
///
/// # Examples
/// ```
/// # use retouch::imaging::calculations::luma;
/// assert_eq!(luma(255, 255, 255), 255);
/// assert_eq!(luma(0, 0, 0), 0);
/// // Green dominates perceived brightness
/// assert!(luma(0, 255, 0) > luma(255, 0, 0));
/// ```
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((19595 * r as u32 + 38470 * g as u32 + 7471 * b as u32 + 0x8000) >> 16) as u8
}

/// The identity color matrix: output equals input.
pub const IDENTITY_MATRIX: [f32; 12] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0,
];

/// Interpolate a 3x4 color matrix between identity and `filter` by `blend`.
///
/// Each of the 12 coefficients is interpolated independently:
/// `effective[i] = filter[i] * blend + identity[i] * (1 - blend)`.
///
/// # Examples
/// ```
/// # use retouch::imaging::calculations::{blend_matrix, IDENTITY_MATRIX};
/// let sepia = [1.2, 0.87, 0.54, 0.0, 0.66, 0.86, 0.47, 0.0, 0.2, 0.43, 0.8, 0.0];
/// assert_eq!(blend_matrix(&sepia, 0.0), IDENTITY_MATRIX);
/// assert_eq!(blend_matrix(&sepia, 1.0), sepia);
/// ```
pub fn blend_matrix(filter: &[f32; 12], blend: f32) -> [f32; 12] {
    let mut out = [0.0; 12];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = filter[i] * blend + IDENTITY_MATRIX[i] * (1.0 - blend);
    }
    out
}

/// Apply a 3x4 color matrix to one RGB pixel.
///
/// Each output channel is a weighted sum of the three input channels plus the
/// row's additive term, rounded and clamped to [0, 255].
#[inline]
pub fn apply_matrix_pixel(m: &[f32; 12], r: u8, g: u8, b: u8) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let mut out = [0u8; 3];
    for (row, slot) in out.iter_mut().enumerate() {
        let base = row * 4;
        let v = m[base] * rf + m[base + 1] * gf + m[base + 2] * bf + m[base + 3];
        *slot = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Shift a hue value on the half-degree scale and wrap into [0, 180).
///
/// Hue is stored in half-degrees (0–179 covers the full color wheel), so a
/// `shift` of 90 rotates the wheel by 180 real degrees.
///
/// # Examples
/// ```
/// # use retouch::imaging::calculations::wrap_hue;
/// assert_eq!(wrap_hue(0.0, 90.0), 90.0);
/// assert_eq!(wrap_hue(170.0, 20.0), 10.0);
/// assert_eq!(wrap_hue(10.0, -20.0), 170.0);
/// ```
#[inline]
pub fn wrap_hue(h: f32, shift: f32) -> f32 {
    (h + shift).rem_euclid(180.0)
}

/// Vibrance adjustment for one saturation value (0–255 scale).
///
/// Less-saturated pixels are boosted more: the increment is weighted by
/// `(255 - s) / 255`, so a fully saturated pixel never changes and a nearly
/// gray pixel gets the full factor. Result clamps to [0, 255].
///
/// # Examples
/// ```
/// # use retouch::imaging::calculations::vibrance_saturation;
/// // Identity at factor 1.0
/// assert_eq!(vibrance_saturation(100.0, 1.0), 100.0);
/// // Saturated pixels stay clamped
/// assert_eq!(vibrance_saturation(255.0, 3.0), 255.0);
/// // Mid saturation gets a partial boost
/// assert!(vibrance_saturation(100.0, 1.5) > 100.0);
/// ```
#[inline]
pub fn vibrance_saturation(s: f32, factor: f32) -> f32 {
    let mask = (255.0 - s) / 255.0;
    (s + mask * s * (factor - 1.0)).clamp(0.0, 255.0)
}

/// Canvas size that fits an image rotated by `degrees`, matching the
/// expand-on-rotate behavior: the whole rotated content stays visible.
///
/// # Examples
/// ```
/// # use retouch::imaging::calculations::rotated_bounds;
/// assert_eq!(rotated_bounds(200, 100, 90.0), (100, 200));
/// assert_eq!(rotated_bounds(200, 100, 180.0), (200, 100));
/// // 45 degrees needs room for both projections
/// let (w, h) = rotated_bounds(100, 100, 45.0);
/// assert!(w > 100 && h > 100);
/// ```
pub fn rotated_bounds(width: u32, height: u32, degrees: f32) -> (u32, u32) {
    let rad = degrees.to_radians();
    let (sin, cos) = (rad.sin().abs(), rad.cos().abs());
    let (w, h) = (width as f32, height as f32);
    // Shave float noise before the ceil so exact quarter turns keep exact bounds
    let out_w = (w * cos + h * sin - 1e-4).ceil().max(1.0) as u32;
    let out_h = (w * sin + h * cos - 1e-4).ceil().max(1.0) as u32;
    (out_w, out_h)
}

/// Catmull-Rom cubic weight (a = -0.5), the kernel behind bicubic sampling.
///
/// `t` is the distance from the sample point to the neighbor; weights are
/// nonzero for |t| < 2.
#[inline]
pub fn cubic_weight(t: f32) -> f32 {
    const A: f32 = -0.5;
    let t = t.abs();
    if t <= 1.0 {
        (A + 2.0) * t * t * t - (A + 3.0) * t * t + 1.0
    } else if t < 2.0 {
        A * t * t * t - 5.0 * A * t * t + 8.0 * A * t - 4.0 * A
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // lerp_channel
    // =========================================================================

    #[test]
    fn lerp_endpoints_are_exact() {
        assert_eq!(lerp_channel(37, 200, 0.0), 37);
        assert_eq!(lerp_channel(37, 200, 1.0), 200);
    }

    #[test]
    fn lerp_extrapolation_clamps_both_ends() {
        assert_eq!(lerp_channel(100, 200, 3.0), 255);
        assert_eq!(lerp_channel(100, 200, -3.0), 0);
    }

    #[test]
    fn lerp_rounds_to_nearest() {
        // 10 + (11 - 10) * 0.6 = 10.6 -> 11
        assert_eq!(lerp_channel(10, 11, 0.6), 11);
        assert_eq!(lerp_channel(10, 11, 0.4), 10);
    }

    // =========================================================================
    // luma
    // =========================================================================

    #[test]
    fn luma_gray_is_identity() {
        for v in [0u8, 1, 64, 128, 200, 255] {
            assert_eq!(luma(v, v, v), v);
        }
    }

    #[test]
    fn luma_channel_weights() {
        assert_eq!(luma(255, 0, 0), 76);
        assert_eq!(luma(0, 255, 0), 150);
        assert_eq!(luma(0, 0, 255), 29);
    }

    // =========================================================================
    // matrices
    // =========================================================================

    #[test]
    fn blend_zero_is_identity() {
        let m = [2.0, 0.5, 0.1, 9.0, 0.2, 1.5, 0.3, -4.0, 0.7, 0.8, 0.9, 1.0];
        assert_eq!(blend_matrix(&m, 0.0), IDENTITY_MATRIX);
    }

    #[test]
    fn blend_one_is_filter() {
        let m = [2.0, 0.5, 0.1, 9.0, 0.2, 1.5, 0.3, -4.0, 0.7, 0.8, 0.9, 1.0];
        assert_eq!(blend_matrix(&m, 1.0), m);
    }

    #[test]
    fn identity_matrix_preserves_pixels() {
        assert_eq!(apply_matrix_pixel(&IDENTITY_MATRIX, 12, 34, 56), [12, 34, 56]);
        assert_eq!(apply_matrix_pixel(&IDENTITY_MATRIX, 255, 0, 128), [255, 0, 128]);
    }

    #[test]
    fn matrix_clamps_overflow() {
        let doubled = [2.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0];
        assert_eq!(apply_matrix_pixel(&doubled, 200, 10, 130), [255, 20, 255]);
    }

    #[test]
    fn matrix_additive_term() {
        let lift = [1.0, 0.0, 0.0, 30.0, 0.0, 1.0, 0.0, 30.0, 0.0, 0.0, 1.0, 30.0];
        assert_eq!(apply_matrix_pixel(&lift, 0, 100, 250), [30, 130, 255]);
    }

    // =========================================================================
    // hue / vibrance
    // =========================================================================

    #[test]
    fn hue_wraps_positive_and_negative() {
        assert_eq!(wrap_hue(179.0, 1.0), 0.0);
        assert_eq!(wrap_hue(0.0, -1.0), 179.0);
        assert_eq!(wrap_hue(90.0, 360.0), 90.0);
    }

    #[test]
    fn vibrance_identity_at_factor_one() {
        for s in [0.0, 50.0, 128.0, 255.0] {
            assert_eq!(vibrance_saturation(s, 1.0), s);
        }
    }

    #[test]
    fn vibrance_boosts_low_saturation_more() {
        let low = vibrance_saturation(50.0, 1.5) - 50.0;
        let high = vibrance_saturation(200.0, 1.5) - 200.0;
        assert!(low > 0.0 && high > 0.0);
        // Relative boost favors the less-saturated pixel
        assert!(low / 50.0 > high / 200.0);
    }

    #[test]
    fn vibrance_monotonic_in_factor() {
        let mut prev = vibrance_saturation(100.0, 1.0);
        for factor in [1.2, 1.5, 2.0, 3.0] {
            let next = vibrance_saturation(100.0, factor);
            assert!(next > prev, "factor {factor} did not increase saturation");
            prev = next;
        }
    }

    #[test]
    fn vibrance_full_saturation_stays_clamped() {
        for factor in [1.0, 1.5, 5.0] {
            assert_eq!(vibrance_saturation(255.0, factor), 255.0);
        }
    }

    #[test]
    fn vibrance_reduces_below_factor_one() {
        assert!(vibrance_saturation(100.0, 0.5) < 100.0);
        assert_eq!(vibrance_saturation(0.0, 0.5), 0.0);
    }

    // =========================================================================
    // geometry
    // =========================================================================

    #[test]
    fn bounds_right_angles_swap_or_keep() {
        assert_eq!(rotated_bounds(300, 200, 0.0), (300, 200));
        assert_eq!(rotated_bounds(300, 200, 90.0), (200, 300));
        assert_eq!(rotated_bounds(300, 200, 270.0), (200, 300));
        assert_eq!(rotated_bounds(300, 200, 360.0), (300, 200));
    }

    #[test]
    fn bounds_45_degrees_grow() {
        let (w, h) = rotated_bounds(100, 100, 45.0);
        // 100 * sqrt(2) ~= 141.4
        assert!((141..=142).contains(&w));
        assert!((141..=142).contains(&h));
    }

    #[test]
    fn cubic_weight_partition() {
        // Weights at integer offsets reproduce the sample exactly
        assert!((cubic_weight(0.0) - 1.0).abs() < 1e-6);
        assert!(cubic_weight(1.0).abs() < 1e-6);
        assert!(cubic_weight(2.0).abs() < 1e-6);
        // Sum of the four taps is 1 for any phase
        for phase in [0.1f32, 0.25, 0.5, 0.75, 0.9] {
            let sum = cubic_weight(phase + 1.0)
                + cubic_weight(phase)
                + cubic_weight(1.0 - phase)
                + cubic_weight(2.0 - phase);
            assert!((sum - 1.0).abs() < 1e-5, "phase {phase}: sum {sum}");
        }
    }
}
