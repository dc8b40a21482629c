//! 3x3 convolution kernels for the sharpen operation and the sharpness
//! degenerate used by enhancement interpolation.
//!
//! Border handling: the outermost pixel ring is copied from the source
//! unfiltered, so a kernel pass never reads outside the image.

use image::RgbImage;
use rayon::prelude::*;

/// A 3x3 convolution kernel with post-sum scaling.
#[derive(Debug, Clone, Copy)]
pub struct Kernel3 {
    pub coeffs: [f32; 9],
    pub divisor: f32,
    pub offset: f32,
}

/// Mild box-weighted smoothing, the degenerate image for sharpness
/// interpolation.
pub const SMOOTH: Kernel3 = Kernel3 {
    coeffs: [1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0],
    divisor: 13.0,
    offset: 0.0,
};

/// Edge-boosting kernel applied by the sharpen operation and the final
/// stage of auto enhancement.
pub const SHARPEN: Kernel3 = Kernel3 {
    coeffs: [-2.0, -2.0, -2.0, -2.0, 32.0, -2.0, -2.0, -2.0, -2.0],
    divisor: 16.0,
    offset: 0.0,
};

/// Convolve the interior of `img` with `kernel`, row-parallel.
///
/// Images narrower or shorter than 3 pixels have no interior and are
/// returned unchanged.
pub fn convolve3x3(img: &RgbImage, kernel: &Kernel3) -> RgbImage {
    let (w, h) = img.dimensions();
    let mut out = img.clone();
    if w < 3 || h < 3 {
        return out;
    }

    let stride = w as usize * 3;
    let src = img.as_raw().as_slice();

    out.par_chunks_exact_mut(stride)
        .enumerate()
        .skip(1)
        .take(h as usize - 2)
        .for_each(|(y, row)| {
            for x in 1..w as usize - 1 {
                for c in 0..3 {
                    let mut acc = 0.0f32;
                    let mut k = 0;
                    for dy in 0..3 {
                        let base = (y + dy - 1) * stride + (x - 1) * 3 + c;
                        for dx in 0..3 {
                            acc += src[base + dx * 3] as f32 * kernel.coeffs[k];
                            k += 1;
                        }
                    }
                    let value = acc / kernel.divisor + kernel.offset;
                    row[x * 3 + c] = value.round().clamp(0.0, 255.0) as u8;
                }
            }
        });

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn uniform_image_is_fixed_point_of_smooth() {
        let img = RgbImage::from_pixel(8, 8, Rgb([77, 130, 200]));
        let out = convolve3x3(&img, &SMOOTH);
        assert_eq!(out, img);
    }

    #[test]
    fn uniform_image_is_fixed_point_of_sharpen() {
        let img = RgbImage::from_pixel(8, 8, Rgb([10, 90, 250]));
        let out = convolve3x3(&img, &SHARPEN);
        assert_eq!(out, img);
    }

    #[test]
    fn border_ring_is_copied_from_source() {
        let mut img = RgbImage::from_pixel(5, 5, Rgb([0, 0, 0]));
        img.put_pixel(0, 0, Rgb([200, 10, 30]));
        img.put_pixel(4, 4, Rgb([1, 2, 3]));
        img.put_pixel(2, 0, Rgb([9, 9, 9]));
        let out = convolve3x3(&img, &SHARPEN);
        assert_eq!(out.get_pixel(0, 0), &Rgb([200, 10, 30]));
        assert_eq!(out.get_pixel(4, 4), &Rgb([1, 2, 3]));
        assert_eq!(out.get_pixel(2, 0), &Rgb([9, 9, 9]));
    }

    #[test]
    fn smooth_spreads_an_impulse() {
        let mut img = RgbImage::from_pixel(5, 5, Rgb([0, 0, 0]));
        img.put_pixel(2, 2, Rgb([130, 130, 130]));
        let out = convolve3x3(&img, &SMOOTH);
        // Center keeps most of the energy, neighbors pick some up
        assert_eq!(out.get_pixel(2, 2), &Rgb([50, 50, 50]));
        assert_eq!(out.get_pixel(1, 2), &Rgb([10, 10, 10]));
        assert_eq!(out.get_pixel(2, 1), &Rgb([10, 10, 10]));
    }

    #[test]
    fn sharpen_boosts_an_edge() {
        let img = RgbImage::from_fn(6, 6, |x, _| {
            if x < 3 { Rgb([50, 50, 50]) } else { Rgb([200, 200, 200]) }
        });
        let out = convolve3x3(&img, &SHARPEN);
        // Bright side of the edge overshoots, dark side undershoots
        assert!(out.get_pixel(3, 3)[0] > 200);
        assert!(out.get_pixel(2, 3)[0] < 50);
    }

    #[test]
    fn tiny_images_pass_through() {
        let img = RgbImage::from_fn(2, 2, |x, y| Rgb([(x + y * 2) as u8 * 60, 0, 0]));
        assert_eq!(convolve3x3(&img, &SHARPEN), img);
    }
}
