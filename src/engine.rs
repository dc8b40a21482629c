//! The transform engine.
//!
//! One call = one operation on one image: parse and validate the request,
//! decode the input, run the transform, and hand the result to the
//! format-negotiating writer. Background removal is the only operation
//! that leaves the process, via the pluggable segmentation backend.
//!
//! The engine holds no mutable state, so a single instance can serve any
//! number of threads as long as concurrent calls write distinct paths.

use crate::extension;
use crate::imaging::alpha::{composite_over, map_color_planes};
use crate::imaging::decode::{self, DecodeError, ImageSource};
use crate::imaging::params::BackgroundColor;
use crate::imaging::segmentation::{CommandSegmenter, SegmentationBackend, SegmentationError};
use crate::imaging::writer::{self, OutputFormat, WriteError};
use crate::imaging::{enhance, filters, geometry, hsv, quantize};
use crate::operation::{OpDefaults, Operation, OperationParseError};
use image::DynamicImage;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unsupported operation `{0}`")]
    UnsupportedOperation(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(OperationParseError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("background removal failed: {0}")]
    Segmentation(#[from] SegmentationError),
}

impl From<OperationParseError> for EngineError {
    fn from(err: OperationParseError) -> Self {
        match err {
            OperationParseError::UnknownOperation(name) => Self::UnsupportedOperation(name),
            other => Self::InvalidParameter(other),
        }
    }
}

pub struct Engine {
    segmentation: Box<dyn SegmentationBackend>,
    defaults: OpDefaults,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Box::new(CommandSegmenter::default()), OpDefaults::default())
    }
}

impl Engine {
    pub fn new(segmentation: Box<dyn SegmentationBackend>, defaults: OpDefaults) -> Self {
        Self {
            segmentation,
            defaults,
        }
    }

    /// Run one named operation against an input and write the result.
    ///
    /// The output extension may be adjusted by policy (see
    /// [`crate::extension`]) or by the writer's format negotiation; the
    /// returned path is where the file actually landed.
    pub fn apply(
        &self,
        operation: &str,
        input: ImageSource<'_>,
        requested_output: &Path,
        params: &Map<String, Value>,
    ) -> Result<PathBuf, EngineError> {
        let op = Operation::parse(operation, params, &self.defaults)?;
        let input_ext = input.extension();
        let target = extension::finalize_output_path(requested_output, &op, input_ext.as_deref());
        debug!(op = op.name(), input = %input, output = %target.display(), "applying");

        let bytes = input.read_bytes()?;

        let (img, quality) = match &op {
            Operation::RemoveBackground { background } => {
                let cut = self.segmentation.segment(&bytes)?;
                let img = decode::decode_bytes(&cut)?;
                let img = match background {
                    BackgroundColor::Transparent => img,
                    BackgroundColor::Solid(color) => {
                        DynamicImage::ImageRgba8(composite_over(&img.to_rgba8(), *color))
                    }
                };
                (img, self.defaults.quality)
            }
            Operation::Compress { quality } => {
                let img = decode::decode_bytes(&bytes)?;
                (run(&op, &img, OutputFormat::from_path(&target)), *quality)
            }
            _ => {
                let img = decode::decode_bytes(&bytes)?;
                (
                    run(&op, &img, OutputFormat::from_path(&target)),
                    self.defaults.quality,
                )
            }
        };

        let written = writer::save_image(&img, &target, quality)?;
        info!(op = op.name(), output = %written.display(), "done");
        Ok(written)
    }
}

/// Dispatch a parsed operation over a decoded image.
fn run(op: &Operation, img: &DynamicImage, target: Option<OutputFormat>) -> DynamicImage {
    match op {
        Operation::Resize { width, height } => geometry::resize(img, *width, *height),
        Operation::Rotate { angle } => geometry::rotate(img, *angle),
        Operation::Flip { direction } => match direction {
            Some(direction) => geometry::flip(img, *direction),
            None => img.clone(),
        },
        Operation::Brightness { factor } => {
            map_color_planes(img, |rgb| enhance::adjust_brightness(rgb, *factor))
        }
        Operation::Contrast { factor } => {
            map_color_planes(img, |rgb| enhance::adjust_contrast(rgb, *factor))
        }
        Operation::Saturation { factor } => {
            map_color_planes(img, |rgb| enhance::adjust_saturation(rgb, *factor))
        }
        Operation::Hue { shift } => map_color_planes(img, |rgb| hsv::shift_hue(rgb, *shift)),
        Operation::Vibrance { factor } => {
            map_color_planes(img, |rgb| hsv::boost_vibrance(rgb, *factor))
        }
        Operation::Compress { .. } => {
            // Palette formats get an adaptive palette pass; everything else
            // is re-encoded as-is at the requested quality.
            if target == Some(OutputFormat::Gif) {
                DynamicImage::ImageRgba8(quantize::quantize_to_palette(&img.to_rgba8()))
            } else {
                img.clone()
            }
        }
        Operation::BlackWhite => map_color_planes(img, enhance::grayscale),
        Operation::Blur { radius } => map_color_planes(img, |rgb| {
            if *radius <= 0.0 {
                rgb.clone()
            } else {
                image::imageops::blur(rgb, *radius)
            }
        }),
        Operation::Sharpen { amount } => {
            map_color_planes(img, |rgb| enhance::adjust_sharpness(rgb, *amount))
        }
        Operation::Filter { kind, intensity } => match kind {
            Some(kind) => filters::apply(img, *kind, *intensity),
            None => img.clone(),
        },
        // Intercepted in apply() before decode; nothing to do per-pixel.
        Operation::RemoveBackground { .. } => img.clone(),
        Operation::Enhance => map_color_planes(img, enhance::auto_adjust),
    }
}
