//! Adaptive palette reduction used before palette-capable encodes.

use color_quant::NeuQuant;
use image::{RgbaImage, imageops};

/// NeuQuant sampling factor. 1 is exhaustive, 30 is fastest; 10 is a good
/// speed/fidelity middle ground for photos.
const SAMPLE_FACTOR: i32 = 10;

/// Reduce to an adaptive 256-color palette with error-diffusion dithering.
pub fn quantize_to_palette(img: &RgbaImage) -> RgbaImage {
    let mut out = img.clone();
    let quantizer = NeuQuant::new(SAMPLE_FACTOR, 256, out.as_raw());
    imageops::dither(&mut out, &quantizer);
    out
}
