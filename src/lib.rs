//! # Retouch
//!
//! A scriptable image editing engine with a thin CLI. One call applies one
//! named operation — resize, rotate, flip, tone and color adjustment, a named
//! filter, compression, background removal — to one image, keeps the alpha
//! channel intact through every transform, and writes the result in a format
//! the operation is compatible with.
//!
//! # Architecture: One Call, Four Stages
//!
//! [`engine::Engine::apply`] takes an operation name, an input (path or bytes),
//! a requested output path, and a loosely-typed parameter map, and runs:
//!
//! ```text
//! 1. Parse      name + params   →  Operation       (validated, defaulted)
//! 2. Resolve    op + input ext  →  output path     (extension policy)
//! 3. Transform  decoded image   →  edited image    (alpha-safe pixel work)
//! 4. Write      edited image    →  encoded file    (format dispatch + fallbacks)
//! ```
//!
//! Parsing and path resolution happen before any pixel is touched, so an
//! unknown operation or a bad parameter never leaves a file behind. Each call
//! is self-contained and stateless; calls with distinct output paths are safe
//! to run concurrently.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Entry point — parses the request, runs the transform, writes the result |
//! | [`operation`] | Operation names, aliases, parameter coercion and defaults |
//! | [`extension`] | Output-extension policy: transparency-capable formats when the operation needs them |
//! | [`imaging`] | Pixel work: geometry, enhancement, filters, HSV, alpha handling, codecs |
//! | [`config`] | `retouch.toml` loading, validation, merging |
//!
//! # Design Decisions
//!
//! ## Alpha Through Every Transform
//!
//! Most pixel operations only make sense on color channels, but dropping alpha
//! on the way through is the classic way editors destroy transparent logos.
//! One helper, [`imaging::alpha::map_color_planes`], owns the split: it hands
//! the transform an RGB view and reattaches the untouched alpha plane
//! afterwards. Operations never duplicate that plumbing.
//!
//! ## Enhancement as Interpolation
//!
//! Brightness, contrast, saturation, and sharpness share one definition:
//! linear interpolation from a degenerate image (black, mean gray, grayscale,
//! smoothed) toward the original. Factor 1.0 is exact identity, 0.0 is the
//! degenerate, values above 1.0 extrapolate. This matches what photo editors
//! ship and makes all four adjustable with a single tested primitive,
//! [`imaging::enhance::interpolate`].
//!
//! ## Format Dispatch, Then Fallbacks
//!
//! The output extension is resolved once into an [`imaging::OutputFormat`] tag
//! and every encode decision dispatches on that tag — no extension-string
//! comparisons scattered through save paths. When an encode fails, the writer
//! escalates: forced opaque JPEG at the same path, then PNG via a sibling
//! `_fallback` file renamed into place. Encodes are staged in memory, so a
//! failed save never leaves a half-written file at the requested path.
//!
//! ## Background Removal as an External Command
//!
//! Subject cut-out runs a configurable command (`rembg i` by default) that
//! reads the image from stdin and writes a cut-out with alpha to stdout,
//! behind the [`imaging::SegmentationBackend`] trait. The model stays out of
//! the binary, users can swap in their own tool from `retouch.toml`, and
//! tests substitute a recording mock.
//!
//! ## Pure-Rust Imaging (No ImageMagick, No FFmpeg)
//!
//! Decode and encode go through the `image` crate plus `webp` for lossy WebP
//! and `color_quant` for adaptive palettes — all pure Rust. No system
//! dependencies, no version conflicts; the binary is fully self-contained.

pub mod config;
pub mod engine;
pub mod extension;
pub mod imaging;
pub mod operation;
