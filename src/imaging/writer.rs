//! Format-negotiating output writer.
//!
//! The extension picks the encoder; alpha is flattened where the format
//! cannot carry it. A failed encode escalates through a forced RGB JPEG and
//! then a PNG written beside the target and renamed into place, so a
//! caller either gets a readable file at the returned path or an error,
//! never a half-written image.

use super::alpha::{flatten_to_rgb, has_alpha};
use super::params::Quality;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, Frame, ImageEncoder, Rgb};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("webp encoding failed: {0}")]
    WebP(String),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Formats this engine can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl OutputFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn supports_alpha(self) -> bool {
        !matches!(self, Self::Jpeg)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }
}

/// Encode `img` to `requested`, negotiating the format from its extension.
///
/// Requests without a recognized extension get `.png` appended when the
/// image carries alpha and `.jpg` otherwise. Returns the path actually
/// written, which therefore may differ from the request.
pub fn save_image(
    img: &DynamicImage,
    requested: &Path,
    quality: Quality,
) -> Result<PathBuf, WriteError> {
    let (target, format) = resolve_target(img, requested);

    let primary_err =
        match encode_bytes(img, format, quality).and_then(|bytes| write_file(&target, &bytes)) {
            Ok(()) => return Ok(target),
            Err(err) => err,
        };
    warn!(
        path = %target.display(),
        error = %primary_err,
        "encode failed, forcing opaque RGB JPEG"
    );

    match encode_bytes(img, OutputFormat::Jpeg, quality)
        .and_then(|bytes| write_file(&target, &bytes))
    {
        Ok(()) => return Ok(target),
        Err(err) => {
            warn!(path = %target.display(), error = %err, "forced JPEG failed, trying PNG fallback");
        }
    }

    let fallback = fallback_path(&target);
    match encode_bytes(img, OutputFormat::Png, quality)
        .and_then(|bytes| write_file(&fallback, &bytes))
    {
        // The fallback sits in the target's directory, so the rename stays on
        // one filesystem and replaces the target atomically.
        Ok(()) => match fs::rename(&fallback, &target) {
            Ok(()) => return Ok(target),
            Err(err) => {
                let _ = fs::remove_file(&fallback);
                warn!(path = %target.display(), error = %err, "could not move fallback into place");
            }
        },
        Err(err) => {
            warn!(path = %fallback.display(), error = %err, "PNG fallback failed");
        }
    }

    Err(primary_err)
}

fn resolve_target(img: &DynamicImage, requested: &Path) -> (PathBuf, OutputFormat) {
    match OutputFormat::from_path(requested) {
        Some(format) => (requested.to_path_buf(), format),
        None => {
            let format = if has_alpha(img) {
                OutputFormat::Png
            } else {
                OutputFormat::Jpeg
            };
            (append_extension(requested, format.extension()), format)
        }
    }
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output")
        .to_string();
    name.push('.');
    name.push_str(ext);
    path.with_file_name(name)
}

fn fallback_path(target: &Path) -> PathBuf {
    let stem = target
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    target.with_file_name(format!("{stem}_fallback.png"))
}

/// Encode fully in memory so a failed encode never touches the filesystem.
fn encode_bytes(
    img: &DynamicImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<Vec<u8>, WriteError> {
    let mut buf = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            let rgb = flatten_to_rgb(img, Rgb([255, 255, 255]));
            JpegEncoder::new_with_quality(&mut buf, quality.0 as u8).write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )?;
        }
        OutputFormat::Png => {
            let encoder =
                PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilterType::Adaptive);
            if has_alpha(img) {
                let rgba = img.to_rgba8();
                encoder.write_image(
                    rgba.as_raw(),
                    rgba.width(),
                    rgba.height(),
                    ExtendedColorType::Rgba8,
                )?;
            } else {
                let rgb = img.to_rgb8();
                encoder.write_image(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    ExtendedColorType::Rgb8,
                )?;
            }
        }
        OutputFormat::WebP => {
            let encoded = if has_alpha(img) {
                let rgba = img.to_rgba8();
                webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
                    .encode_simple(false, quality.0 as f32)
            } else {
                let rgb = img.to_rgb8();
                webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
                    .encode_simple(false, quality.0 as f32)
            }
            .map_err(|e| WriteError::WebP(format!("{e:?}")))?;
            buf.extend_from_slice(&encoded);
        }
        OutputFormat::Gif => {
            let mut encoder = GifEncoder::new_with_speed(&mut buf, 10);
            encoder.encode_frame(Frame::new(img.to_rgba8()))?;
        }
    }
    Ok(buf)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    fs::write(path, bytes).map_err(|source| {
        let _ = fs::remove_file(path);
        WriteError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage, RgbImage};
    use tempfile::TempDir;

    fn opaque_gradient() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, y| {
            image::Rgb([(x * 4) as u8, (y * 4) as u8, ((x * 7 + y * 13) % 256) as u8])
        }))
    }

    fn translucent_red() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 0])))
    }

    // ==== format selection ====

    #[test]
    fn extension_lookup() {
        assert_eq!(OutputFormat::from_extension("JPG"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_extension("jpeg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_extension("png"), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_extension("webp"), Some(OutputFormat::WebP));
        assert_eq!(OutputFormat::from_extension("gif"), Some(OutputFormat::Gif));
        assert_eq!(OutputFormat::from_extension("heic"), None);
    }

    #[test]
    fn only_jpeg_lacks_alpha_support() {
        assert!(!OutputFormat::Jpeg.supports_alpha());
        assert!(OutputFormat::Png.supports_alpha());
        assert!(OutputFormat::WebP.supports_alpha());
        assert!(OutputFormat::Gif.supports_alpha());
    }

    // ==== happy paths ====

    #[test]
    fn saving_alpha_to_jpg_flattens_onto_white() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flat.jpg");
        let written = save_image(&translucent_red(), &path, Quality::default()).unwrap();
        assert_eq!(written, path);

        let back = image::open(&path).unwrap();
        assert!(!has_alpha(&back));
        // Fully transparent pixels become the white backdrop (JPEG is lossy)
        let px = back.to_rgb8().get_pixel(4, 4).0;
        assert!(px.iter().all(|&c| c > 240), "expected near-white, got {px:?}");
    }

    #[test]
    fn saving_alpha_to_png_preserves_it_exactly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keep.png");
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(4, 4, |x, y| {
            Rgba([40, 80, 120, (x * 60 + y) as u8])
        }));
        save_image(&img, &path, Quality::default()).unwrap();
        assert_eq!(image::open(&path).unwrap().to_rgba8(), img.to_rgba8());
    }

    #[test]
    fn webp_and_gif_round_trip_through_their_decoders() {
        let dir = TempDir::new().unwrap();
        for name in ["out.webp", "out.gif"] {
            let path = dir.path().join(name);
            save_image(&opaque_gradient(), &path, Quality::default()).unwrap();
            let back = image::open(&path).unwrap();
            assert_eq!((back.width(), back.height()), (64, 64), "{name}");
        }
    }

    // ==== extension negotiation ====

    #[test]
    fn missing_extension_appends_by_alpha() {
        let dir = TempDir::new().unwrap();

        let opaque = save_image(&opaque_gradient(), &dir.path().join("a"), Quality::default())
            .unwrap();
        assert_eq!(opaque.file_name().unwrap(), "a.jpg");
        assert!(opaque.exists());

        let alpha = save_image(&translucent_red(), &dir.path().join("b"), Quality::default())
            .unwrap();
        assert_eq!(alpha.file_name().unwrap(), "b.png");
        assert!(alpha.exists());
    }

    #[test]
    fn unrecognized_extension_is_kept_and_suffixed() {
        let dir = TempDir::new().unwrap();
        let written = save_image(
            &translucent_red(),
            &dir.path().join("photo.xyz"),
            Quality::default(),
        )
        .unwrap();
        assert_eq!(written.file_name().unwrap(), "photo.xyz.png");
    }

    // ==== quality ====

    #[test]
    fn lower_quality_produces_smaller_jpegs() {
        let dir = TempDir::new().unwrap();
        let small = dir.path().join("q10.jpg");
        let large = dir.path().join("q90.jpg");
        save_image(&opaque_gradient(), &small, Quality::new(10)).unwrap();
        save_image(&opaque_gradient(), &large, Quality::new(90)).unwrap();
        let small_len = fs::metadata(&small).unwrap().len();
        let large_len = fs::metadata(&large).unwrap().len();
        assert!(small_len < large_len, "{small_len} vs {large_len}");
    }

    #[test]
    fn out_of_range_quality_behaves_like_the_clamp() {
        let dir = TempDir::new().unwrap();
        let clamped = dir.path().join("clamped.jpg");
        let max = dir.path().join("max.jpg");
        save_image(&opaque_gradient(), &clamped, Quality::new(500)).unwrap();
        save_image(&opaque_gradient(), &max, Quality::new(95)).unwrap();
        assert_eq!(fs::read(&clamped).unwrap(), fs::read(&max).unwrap());
    }

    // ==== failure ====

    #[test]
    fn unwritable_directory_surfaces_an_error_and_no_leftovers() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("no_such_subdir").join("out.png");
        let err = save_image(&opaque_gradient(), &missing, Quality::default()).unwrap_err();
        assert!(matches!(err, WriteError::Io { .. }));
        // Neither the target nor a stray fallback file should exist
        assert!(!missing.exists());
        assert!(!missing.with_file_name("out_fallback.png").exists());
    }
}
