//! Parameter types shared by the image operations.
//!
//! These types normalize the loosely-typed values callers send (JSON numbers,
//! strings from web sliders, hex color codes) into validated, clamped values
//! the pixel code can trust. Out-of-range values clamp instead of erroring —
//! a request for quality 500 means "as good as it gets", not a bug report.
//!
//! ## Types
//!
//! - [`Quality`] — lossy encoding quality (1–95, default 85). Clamped on construction.
//! - [`Intensity`] — filter strength (0–100, default 100). Clamped on construction.
//! - [`BackgroundColor`] — parsed background fill: transparent sentinel or a solid RGBA.

use image::Rgba;

/// Quality setting for lossy image encoding (1-95).
///
/// 95 is the ceiling: JPEG quality above it balloons file size for no visible
/// gain. Values outside the range clamp, so negative and oversized requests
/// behave like the nearest bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: i64) -> Self {
        Self(value.clamp(1, 95) as u32)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Filter intensity (0-100): 0 leaves the image untouched, 100 applies the
/// filter fully. Clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intensity(pub u32);

impl Intensity {
    pub fn new(value: i64) -> Self {
        Self(value.clamp(0, 100) as u32)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Mix factor in [0.0, 1.0] for blending against the unmodified image.
    pub fn blend(self) -> f32 {
        self.0 as f32 / 100.0
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self(100)
    }
}

/// A background fill resolved from caller input.
///
/// `"transparent"` (case-insensitive) keeps the alpha channel as produced.
/// Anything else parses as a color; unparseable input falls back to opaque
/// white rather than failing the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundColor {
    Transparent,
    Solid(Rgba<u8>),
}

impl BackgroundColor {
    pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    /// Parse a color string: `"transparent"`, `#rgb`/`#rrggbb`/`#rrggbbaa` hex,
    /// a CSS color name, or an `rgb(r, g, b)` tuple.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("transparent") {
            return Self::Transparent;
        }
        Self::Solid(
            parse_hex(trimmed)
                .or_else(|| parse_named(trimmed))
                .or_else(|| parse_rgb_tuple(trimmed))
                .unwrap_or(Self::WHITE),
        )
    }

    pub fn is_transparent(self) -> bool {
        matches!(self, Self::Transparent)
    }
}

fn parse_hex(s: &str) -> Option<Rgba<u8>> {
    let hex = s.strip_prefix('#')?;
    let nibble = |c: u8| char::from(c).to_digit(16).map(|d| d as u8);
    let byte = |pair: &[u8]| Some(nibble(pair[0])? * 16 + nibble(pair[1])?);
    match hex.len() {
        // #rgb shorthand: each nibble doubles (#f80 -> #ff8800)
        3 => {
            let b = hex.as_bytes();
            let r = nibble(b[0])?;
            let g = nibble(b[1])?;
            let bl = nibble(b[2])?;
            Some(Rgba([r * 17, g * 17, bl * 17, 255]))
        }
        6 => {
            let b = hex.as_bytes();
            Some(Rgba([byte(&b[0..2])?, byte(&b[2..4])?, byte(&b[4..6])?, 255]))
        }
        8 => {
            let b = hex.as_bytes();
            Some(Rgba([
                byte(&b[0..2])?,
                byte(&b[2..4])?,
                byte(&b[4..6])?,
                byte(&b[6..8])?,
            ]))
        }
        _ => None,
    }
}

/// The CSS color names callers actually send. Not the full CSS list — color
/// pickers submit hex, names only show up from hand-written requests.
fn parse_named(s: &str) -> Option<Rgba<u8>> {
    let rgb: [u8; 3] = match s.to_ascii_lowercase().as_str() {
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "red" => [255, 0, 0],
        "lime" => [0, 255, 0],
        "green" => [0, 128, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "cyan" | "aqua" => [0, 255, 255],
        "magenta" | "fuchsia" => [255, 0, 255],
        "gray" | "grey" => [128, 128, 128],
        "silver" => [192, 192, 192],
        "maroon" => [128, 0, 0],
        "olive" => [128, 128, 0],
        "teal" => [0, 128, 128],
        "navy" => [0, 0, 128],
        "purple" => [128, 0, 128],
        "orange" => [255, 165, 0],
        "pink" => [255, 192, 203],
        "brown" => [165, 42, 42],
        _ => return None,
    };
    Some(Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

fn parse_rgb_tuple(s: &str) -> Option<Rgba<u8>> {
    let inner = s
        .strip_prefix("rgb(")
        .or_else(|| s.strip_prefix("rgba("))?
        .strip_suffix(')')?;
    let mut parts = inner.split(',').map(str::trim);
    let r = parts.next()?.parse::<u8>().ok()?;
    let g = parts.next()?.parse::<u8>().ok()?;
    let b = parts.next()?.parse::<u8>().ok()?;
    let a = match parts.next() {
        Some(p) => p.parse::<u8>().ok()?,
        None => 255,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(Rgba([r, g, b, a]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(-5).value(), 1);
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(500).value(), 95);
    }

    #[test]
    fn quality_default_is_85() {
        assert_eq!(Quality::default().value(), 85);
    }

    #[test]
    fn intensity_clamps_and_blends() {
        assert_eq!(Intensity::new(-1).value(), 0);
        assert_eq!(Intensity::new(100).value(), 100);
        assert_eq!(Intensity::new(250).value(), 100);
        assert_eq!(Intensity::new(50).blend(), 0.5);
        assert_eq!(Intensity::default().blend(), 1.0);
    }

    #[test]
    fn transparent_sentinel_case_insensitive() {
        assert_eq!(
            BackgroundColor::parse("Transparent"),
            BackgroundColor::Transparent
        );
        assert_eq!(
            BackgroundColor::parse("  TRANSPARENT "),
            BackgroundColor::Transparent
        );
    }

    #[test]
    fn empty_input_means_no_background() {
        assert_eq!(BackgroundColor::parse(""), BackgroundColor::Transparent);
        assert_eq!(BackgroundColor::parse("   "), BackgroundColor::Transparent);
    }

    #[test]
    fn hex_six_digit() {
        assert_eq!(
            BackgroundColor::parse("#ff8800"),
            BackgroundColor::Solid(Rgba([255, 136, 0, 255]))
        );
    }

    #[test]
    fn hex_shorthand_expands() {
        assert_eq!(
            BackgroundColor::parse("#f80"),
            BackgroundColor::Solid(Rgba([255, 136, 0, 255]))
        );
    }

    #[test]
    fn hex_with_alpha() {
        assert_eq!(
            BackgroundColor::parse("#00ff0080"),
            BackgroundColor::Solid(Rgba([0, 255, 0, 128]))
        );
    }

    #[test]
    fn named_colors() {
        assert_eq!(
            BackgroundColor::parse("red"),
            BackgroundColor::Solid(Rgba([255, 0, 0, 255]))
        );
        assert_eq!(
            BackgroundColor::parse("Navy"),
            BackgroundColor::Solid(Rgba([0, 0, 128, 255]))
        );
    }

    #[test]
    fn rgb_tuple() {
        assert_eq!(
            BackgroundColor::parse("rgb(10, 20, 30)"),
            BackgroundColor::Solid(Rgba([10, 20, 30, 255]))
        );
        assert_eq!(
            BackgroundColor::parse("rgba(10, 20, 30, 40)"),
            BackgroundColor::Solid(Rgba([10, 20, 30, 40]))
        );
    }

    #[test]
    fn unparseable_color_falls_back_to_white() {
        assert_eq!(
            BackgroundColor::parse("not-a-color"),
            BackgroundColor::Solid(Rgba([255, 255, 255, 255]))
        );
        assert_eq!(
            BackgroundColor::parse("#zzzzzz"),
            BackgroundColor::Solid(Rgba([255, 255, 255, 255]))
        );
        assert_eq!(
            BackgroundColor::parse("rgb(300, 0, 0)"),
            BackgroundColor::Solid(Rgba([255, 255, 255, 255]))
        );
    }
}
