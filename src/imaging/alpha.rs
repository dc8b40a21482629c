//! Alpha-channel handling shared by every color operation.
//!
//! The engine's rule for pixel-level enhancements: transform the color planes,
//! never the transparency. [`map_color_planes`] is the one place that rule is
//! implemented — operations hand it a plain RGB transform and get alpha
//! preservation for free. Compositing helpers for the formats and operations
//! that deliberately flatten transparency live here too.

use image::{DynamicImage, GrayImage, Rgb, RgbImage, Rgba, RgbaImage};

/// Whether the image carries an alpha channel.
pub fn has_alpha(img: &DynamicImage) -> bool {
    img.color().has_alpha()
}

/// Apply an RGB transform to the color planes, preserving any alpha channel.
///
/// Images without alpha are converted to RGB and transformed directly. Images
/// with alpha are split, transformed on the color planes only, and re-merged
/// with the untouched alpha. The transform must preserve dimensions.
pub fn map_color_planes<F>(img: &DynamicImage, transform: F) -> DynamicImage
where
    F: FnOnce(&RgbImage) -> RgbImage,
{
    if has_alpha(img) {
        let rgba = img.to_rgba8();
        let (rgb, alpha) = split_alpha(&rgba);
        let out = transform(&rgb);
        DynamicImage::ImageRgba8(merge_alpha(&out, &alpha))
    } else {
        DynamicImage::ImageRgb8(transform(&img.to_rgb8()))
    }
}

/// Split an RGBA image into its color planes and alpha plane.
pub fn split_alpha(img: &RgbaImage) -> (RgbImage, GrayImage) {
    let (w, h) = img.dimensions();
    let mut rgb = RgbImage::new(w, h);
    let mut alpha = GrayImage::new(w, h);
    for (src, (dst, a)) in img
        .pixels()
        .zip(rgb.pixels_mut().zip(alpha.pixels_mut()))
    {
        *dst = Rgb([src[0], src[1], src[2]]);
        a[0] = src[3];
    }
    (rgb, alpha)
}

/// Recombine color planes with an alpha plane of the same dimensions.
pub fn merge_alpha(rgb: &RgbImage, alpha: &GrayImage) -> RgbaImage {
    debug_assert_eq!(rgb.dimensions(), alpha.dimensions());
    let (w, h) = rgb.dimensions();
    let mut out = RgbaImage::new(w, h);
    for (dst, (src, a)) in out
        .pixels_mut()
        .zip(rgb.pixels().zip(alpha.pixels()))
    {
        *dst = Rgba([src[0], src[1], src[2], a[0]]);
    }
    out
}

/// Alpha-composite an image onto a solid background (Porter-Duff "over").
///
/// With an opaque background the result is fully opaque; a translucent
/// background keeps partial alpha.
pub fn composite_over(fg: &RgbaImage, background: Rgba<u8>) -> RgbaImage {
    let (w, h) = fg.dimensions();
    let bg_a = background[3] as f32 / 255.0;
    let mut out = RgbaImage::new(w, h);
    for (dst, src) in out.pixels_mut().zip(fg.pixels()) {
        let fa = src[3] as f32 / 255.0;
        let out_a = fa + bg_a * (1.0 - fa);
        if out_a == 0.0 {
            *dst = Rgba([0, 0, 0, 0]);
            continue;
        }
        let mut px = [0u8; 4];
        for c in 0..3 {
            let v = (src[c] as f32 * fa + background[c] as f32 * bg_a * (1.0 - fa)) / out_a;
            px[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        px[3] = (out_a * 255.0).round() as u8;
        *dst = Rgba(px);
    }
    out
}

/// Flatten an image onto an opaque background color, discarding alpha.
///
/// Used when encoding to formats that cannot store transparency.
pub fn flatten_to_rgb(img: &DynamicImage, background: Rgb<u8>) -> RgbImage {
    if !has_alpha(img) {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut out = RgbImage::new(w, h);
    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        let a = src[3] as f32 / 255.0;
        let mut px = [0u8; 3];
        for c in 0..3 {
            let v = src[c] as f32 * a + background[c] as f32 * (1.0 - a);
            px[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        *dst = Rgb(px);
    }
    out
}
