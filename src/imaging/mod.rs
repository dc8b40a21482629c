//! Pixel-level image work — pure Rust, no system codec dependencies.
//!
//! | Concern | Module |
//! |---|---|
//! | **Decode** | [`decode`] — bytes or path → `DynamicImage` |
//! | **Geometry** | [`geometry`] — resize, rotate (expanding canvas), flip |
//! | **Tone** | [`enhance`] — brightness/contrast/saturation/sharpness as interpolation |
//! | **Color** | [`hsv`], [`filters`] — hue shift, vibrance, named filter matrices |
//! | **Alpha** | [`alpha`] — split/merge color planes, flatten, composite |
//! | **Encode** | [`writer`] — format dispatch by extension + fallback chain |
//! | **Cut-out** | [`segmentation`] — external subject-separation command behind a trait |
//!
//! The module is split into:
//! - **Calculations**: pure functions for coefficient and coordinate math (unit testable)
//! - **Parameters**: validated value types ([`Quality`], [`Intensity`], [`BackgroundColor`])
//! - **Transforms**: per-pixel operations, each preserving alpha unless defined to discard it
//! - **Codec edges**: [`decode`] in, [`writer`] out, [`quantize`] for palette targets

pub mod alpha;
pub mod calculations;
pub mod convolve;
pub mod decode;
pub mod enhance;
pub mod filters;
pub mod geometry;
pub mod hsv;
pub mod params;
pub mod quantize;
pub mod segmentation;
pub mod writer;

pub use decode::ImageSource;
pub use filters::FilterKind;
pub use params::{BackgroundColor, Intensity, Quality};
pub use segmentation::{CommandSegmenter, SegmentationBackend};
pub use writer::OutputFormat;
