//! Geometric operations: exact resize, mirroring, and rotation.
//!
//! Rotation treats positive angles as clockwise, always expands the canvas
//! to hold the rotated bounds, and fills uncovered corners with black for
//! opaque images or transparency when an alpha channel is present. Exact
//! quarter turns take the lossless transpose paths; everything else is
//! resampled bicubically.

use super::alpha::has_alpha;
use super::calculations::{cubic_weight, rotated_bounds};
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage, RgbaImage};
use rayon::prelude::*;

/// Which axis a flip mirrors across.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipDirection {
    Horizontal,
    Vertical,
}

impl FlipDirection {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Some(Self::Horizontal),
            "vertical" => Some(Self::Vertical),
            _ => None,
        }
    }
}

/// Scale to exactly `width` x `height` without preserving aspect ratio.
pub fn resize(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    img.resize_exact(width, height, FilterType::Lanczos3)
}

pub fn flip(img: &DynamicImage, direction: FlipDirection) -> DynamicImage {
    match direction {
        FlipDirection::Horizontal => img.fliph(),
        FlipDirection::Vertical => img.flipv(),
    }
}

/// Rotate clockwise by `degrees` on an expanded canvas.
pub fn rotate(img: &DynamicImage, degrees: f32) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return img.clone();
    }

    let turns = degrees.rem_euclid(360.0);
    if turns == 0.0 {
        return img.clone();
    }
    if turns == 90.0 {
        return img.rotate90();
    }
    if turns == 180.0 {
        return img.rotate180();
    }
    if turns == 270.0 {
        return img.rotate270();
    }

    let (ow, oh) = rotated_bounds(w, h, turns);
    if has_alpha(img) {
        let src = img.to_rgba8();
        let mut out = RgbaImage::new(ow, oh);
        resample_rotation::<4>(src.as_raw(), w, h, &mut out, ow, oh, turns, [0, 0, 0, 0]);
        DynamicImage::ImageRgba8(out)
    } else {
        let src = img.to_rgb8();
        let mut out = RgbImage::new(ow, oh);
        resample_rotation::<3>(src.as_raw(), w, h, &mut out, ow, oh, turns, [0, 0, 0]);
        DynamicImage::ImageRgb8(out)
    }
}

/// Inverse-map each destination pixel back into the source and sample a
/// 4x4 Catmull-Rom neighborhood, clamping taps at the image edge. Pixels
/// whose source position falls outside the image get `fill`.
fn resample_rotation<const N: usize>(
    src: &[u8],
    sw: u32,
    sh: u32,
    out: &mut [u8],
    ow: u32,
    oh: u32,
    degrees: f32,
    fill: [u8; N],
) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let cx_out = ow as f32 / 2.0 - 0.5;
    let cy_out = oh as f32 / 2.0 - 0.5;
    let cx_in = sw as f32 / 2.0 - 0.5;
    let cy_in = sh as f32 / 2.0 - 0.5;
    let stride = ow as usize * N;

    out.par_chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let dy = y as f32 - cy_out;
            for x in 0..ow as usize {
                let dx = x as f32 - cx_out;
                // Undo the clockwise rotation to find the source position
                let sx = cos * dx + sin * dy + cx_in;
                let sy = -sin * dx + cos * dy + cy_in;

                let slot = &mut row[x * N..x * N + N];
                if sx < -0.5 || sx > sw as f32 - 0.5 || sy < -0.5 || sy > sh as f32 - 0.5 {
                    slot.copy_from_slice(&fill);
                    continue;
                }

                let x0 = sx.floor();
                let y0 = sy.floor();
                let tx = sx - x0;
                let ty = sy - y0;
                let mut wx = [0.0f32; 4];
                let mut wy = [0.0f32; 4];
                for i in 0..4 {
                    wx[i] = cubic_weight(tx - (i as f32 - 1.0));
                    wy[i] = cubic_weight(ty - (i as f32 - 1.0));
                }

                let mut acc = [0.0f32; N];
                for (j, &row_weight) in wy.iter().enumerate() {
                    let py = (y0 as i64 + j as i64 - 1).clamp(0, sh as i64 - 1) as usize;
                    for (i, &col_weight) in wx.iter().enumerate() {
                        let px = (x0 as i64 + i as i64 - 1).clamp(0, sw as i64 - 1) as usize;
                        let weight = col_weight * row_weight;
                        let base = (py * sw as usize + px) * N;
                        for c in 0..N {
                            acc[c] += src[base + c] as f32 * weight;
                        }
                    }
                }
                for c in 0..N {
                    slot[c] = acc[c].round().clamp(0.0, 255.0) as u8;
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn two_tone_strip() -> DynamicImage {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));
        DynamicImage::ImageRgb8(img)
    }

    // ==== resize and flip ====

    #[test]
    fn resize_hits_exact_dimensions() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 4, Rgb([7, 7, 7])));
        let out = resize(&img, 3, 9);
        assert_eq!((out.width(), out.height()), (3, 9));
    }

    #[test]
    fn flip_direction_parsing() {
        assert_eq!(FlipDirection::parse("horizontal"), Some(FlipDirection::Horizontal));
        assert_eq!(FlipDirection::parse(" Vertical "), Some(FlipDirection::Vertical));
        assert_eq!(FlipDirection::parse("diagonal"), None);
    }

    #[test]
    fn horizontal_flip_mirrors_columns() {
        let out = flip(&two_tone_strip(), FlipDirection::Horizontal).to_rgb8();
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 255]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn vertical_flip_mirrors_rows() {
        let mut img = RgbImage::new(1, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(0, 1, Rgb([0, 0, 255]));
        let out = flip(&DynamicImage::ImageRgb8(img), FlipDirection::Vertical).to_rgb8();
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 255]));
        assert_eq!(out.get_pixel(0, 1), &Rgb([255, 0, 0]));
    }

    #[test]
    fn double_flip_is_the_identity() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(5, 3, |x, y| {
            Rgb([(x * 50) as u8, (y * 80) as u8, (x + y) as u8])
        }));
        for direction in [FlipDirection::Horizontal, FlipDirection::Vertical] {
            let twice = flip(&flip(&img, direction), direction);
            assert_eq!(twice.to_rgb8(), img.to_rgb8());
        }
    }

    // ==== quarter turns ====

    #[test]
    fn quarter_turn_is_clockwise() {
        let out = rotate(&two_tone_strip(), 90.0).to_rgb8();
        assert_eq!((out.width(), out.height()), (1, 2));
        assert_eq!(out.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(out.get_pixel(0, 1), &Rgb([0, 0, 255]));
    }

    #[test]
    fn negative_angle_rotates_counterclockwise() {
        let out = rotate(&two_tone_strip(), -90.0).to_rgb8();
        assert_eq!((out.width(), out.height()), (1, 2));
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 255]));
        assert_eq!(out.get_pixel(0, 1), &Rgb([255, 0, 0]));
    }

    #[test]
    fn half_turn_reverses_the_strip() {
        let out = rotate(&two_tone_strip(), 180.0).to_rgb8();
        assert_eq!((out.width(), out.height()), (2, 1));
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 255]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn full_turn_is_identity() {
        let img = two_tone_strip();
        assert_eq!(rotate(&img, 360.0).to_rgb8(), img.to_rgb8());
    }

    // ==== arbitrary angles ====

    #[test]
    fn diagonal_rotation_expands_the_canvas() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([200, 200, 200])));
        let out = rotate(&img, 45.0);
        assert!(out.width() > 10);
        assert!(out.height() > 10);
    }

    #[test]
    fn opaque_corners_fill_black() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 20, Rgb([255, 255, 255])));
        let out = rotate(&img, 45.0).to_rgb8();
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 0]));
        let (w, h) = out.dimensions();
        assert_eq!(out.get_pixel(w - 1, h - 1), &Rgb([0, 0, 0]));
    }

    #[test]
    fn alpha_corners_fill_transparent() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            20,
            20,
            image::Rgba([255, 0, 0, 255]),
        ));
        let out = rotate(&img, 30.0).to_rgba8();
        assert_eq!(out.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn rotation_preserves_uniform_interior() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(21, 21, Rgb([120, 60, 30])));
        let out = rotate(&img, 33.0).to_rgb8();
        let center = out.get_pixel(out.width() / 2, out.height() / 2);
        assert_eq!(center, &Rgb([120, 60, 30]));
    }
}
