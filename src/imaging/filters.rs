//! Named color filters.
//!
//! Matrix filters are 3x4 affine color transforms blended against the
//! identity matrix by intensity before the per-pixel pass. Grayscale,
//! invert, and high-contrast are nonlinear, so they are computed at full
//! strength and mixed with the original image instead. Both routes make
//! intensity 0 the untouched input and intensity 100 the full effect.

use super::alpha::map_color_planes;
use super::calculations::{apply_matrix_pixel, blend_matrix};
use super::enhance;
use super::params::Intensity;
use image::{DynamicImage, RgbImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Sepia,
    Cool,
    Warm,
    Vintage,
    Nostalgia,
    Dramatic,
    Cinema,
    Chrome,
    Fade,
    Grayscale,
    Invert,
    HighContrast,
}

const SEPIA: [f32; 12] = [
    1.2, 0.87, 0.54, 0.0, //
    0.66, 0.86, 0.47, 0.0, //
    0.2, 0.43, 0.8, 0.0,
];

const VINTAGE: [f32; 12] = [
    1.1, 0.75, 0.39, 0.0, //
    0.58, 0.9, 0.35, 0.0, //
    0.18, 0.38, 0.85, 0.0,
];

const COOL: [f32; 12] = [
    0.8, 0.1, 0.1, 0.0, //
    0.1, 0.9, 0.1, 0.0, //
    0.1, 0.1, 1.2, 0.0,
];

const WARM: [f32; 12] = [
    1.2, 0.1, 0.1, 0.0, //
    0.1, 1.0, 0.1, 0.0, //
    0.1, 0.1, 0.7, 0.0,
];

const NOSTALGIA: [f32; 12] = [
    1.05, 0.2, 0.1, 10.0, //
    0.12, 0.95, 0.1, 6.0, //
    0.08, 0.1, 0.78, 0.0,
];

const DRAMATIC: [f32; 12] = [
    1.3, 0.1, 0.0, -25.0, //
    0.1, 1.3, 0.1, -25.0, //
    0.0, 0.1, 1.3, -25.0,
];

const CINEMA: [f32; 12] = [
    1.15, 0.1, 0.0, -8.0, //
    0.05, 1.05, 0.1, 0.0, //
    0.0, 0.15, 0.95, 12.0,
];

const CHROME: [f32; 12] = [
    1.15, 0.05, 0.05, 5.0, //
    0.05, 1.15, 0.05, 5.0, //
    0.05, 0.05, 1.15, 5.0,
];

const FADE: [f32; 12] = [
    0.85, 0.05, 0.05, 30.0, //
    0.05, 0.85, 0.05, 30.0, //
    0.05, 0.05, 0.85, 30.0,
];

impl FilterKind {
    /// All selectable filters, in presentation order.
    pub const ALL: [FilterKind; 12] = [
        Self::Sepia,
        Self::Cool,
        Self::Warm,
        Self::Vintage,
        Self::Nostalgia,
        Self::Dramatic,
        Self::Cinema,
        Self::Chrome,
        Self::Fade,
        Self::Grayscale,
        Self::Invert,
        Self::HighContrast,
    ];

    /// Look up a filter by name. `None` covers both the explicit "none"
    /// selection and unrecognized names, which leave the image unchanged.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sepia" => Some(Self::Sepia),
            "cool" => Some(Self::Cool),
            "warm" => Some(Self::Warm),
            "vintage" => Some(Self::Vintage),
            "nostalgia" => Some(Self::Nostalgia),
            "dramatic" => Some(Self::Dramatic),
            "cinema" => Some(Self::Cinema),
            "chrome" => Some(Self::Chrome),
            "fade" => Some(Self::Fade),
            "grayscale" => Some(Self::Grayscale),
            "invert" => Some(Self::Invert),
            "high_contrast" => Some(Self::HighContrast),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sepia => "sepia",
            Self::Cool => "cool",
            Self::Warm => "warm",
            Self::Vintage => "vintage",
            Self::Nostalgia => "nostalgia",
            Self::Dramatic => "dramatic",
            Self::Cinema => "cinema",
            Self::Chrome => "chrome",
            Self::Fade => "fade",
            Self::Grayscale => "grayscale",
            Self::Invert => "invert",
            Self::HighContrast => "high_contrast",
        }
    }

    fn matrix(self) -> Option<&'static [f32; 12]> {
        match self {
            Self::Sepia => Some(&SEPIA),
            Self::Cool => Some(&COOL),
            Self::Warm => Some(&WARM),
            Self::Vintage => Some(&VINTAGE),
            Self::Nostalgia => Some(&NOSTALGIA),
            Self::Dramatic => Some(&DRAMATIC),
            Self::Cinema => Some(&CINEMA),
            Self::Chrome => Some(&CHROME),
            Self::Fade => Some(&FADE),
            Self::Grayscale | Self::Invert | Self::HighContrast => None,
        }
    }
}

/// Apply `kind` at the given intensity, preserving any alpha channel.
pub fn apply(img: &DynamicImage, kind: FilterKind, intensity: Intensity) -> DynamicImage {
    map_color_planes(img, |rgb| match kind.matrix() {
        Some(m) => apply_matrix(rgb, &blend_matrix(m, intensity.blend())),
        None => enhance::interpolate(rgb, &fully_applied(rgb, kind), intensity.blend()),
    })
}

fn apply_matrix(img: &RgbImage, m: &[f32; 12]) -> RgbImage {
    let mut out = img.clone();
    for p in out.pixels_mut() {
        p.0 = apply_matrix_pixel(m, p[0], p[1], p[2]);
    }
    out
}

fn fully_applied(img: &RgbImage, kind: FilterKind) -> RgbImage {
    match kind {
        FilterKind::Grayscale => enhance::grayscale(img),
        FilterKind::Invert => {
            let mut out = img.clone();
            for p in out.pixels_mut() {
                p.0 = [255 - p[0], 255 - p[1], 255 - p[2]];
            }
            out
        }
        FilterKind::HighContrast => enhance::adjust_contrast(&enhance::grayscale(img), 2.0),
        _ => img.clone(),
    }
}
