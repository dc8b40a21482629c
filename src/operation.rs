//! Operation names and request-parameter parsing.
//!
//! Parameters arrive as loose JSON maps (web sliders and form fields send
//! numbers as strings), so numeric getters accept both representations and
//! integer parameters truncate fractional values. Validation happens here,
//! before any pixel work or file write.

use crate::imaging::filters::FilterKind;
use crate::imaging::geometry::FlipDirection;
use crate::imaging::params::{BackgroundColor, Intensity, Quality};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Upper bound on a single requested resize dimension, in pixels.
const MAX_PIXEL_DIMENSION: i64 = 30_000;

#[derive(Debug, Error)]
pub enum OperationParseError {
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),
    #[error("missing required parameter `{0}`")]
    MissingParameter(&'static str),
    #[error("parameter `{name}` is not a valid {expected}: got {value}")]
    InvalidValue {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Fallbacks for parameters a request may omit, sourced from config.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpDefaults {
    pub quality: Quality,
    pub intensity: Intensity,
}

/// A fully validated transform request.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Resize { width: u32, height: u32 },
    Rotate { angle: f32 },
    /// `direction: None` means an unrecognized direction was requested;
    /// the image passes through unchanged.
    Flip { direction: Option<FlipDirection> },
    Brightness { factor: f32 },
    Contrast { factor: f32 },
    Saturation { factor: f32 },
    Hue { shift: f32 },
    Vibrance { factor: f32 },
    Compress { quality: Quality },
    BlackWhite,
    Blur { radius: f32 },
    Sharpen { amount: f32 },
    Filter {
        kind: Option<FilterKind>,
        intensity: Intensity,
    },
    RemoveBackground { background: BackgroundColor },
    Enhance,
}

/// Operation names with their parameters, for help output.
pub const CATALOG: &[(&str, &str, &str)] = &[
    ("resize", "width=<px> height=<px>", "scale to exact dimensions"),
    ("rotate", "angle=<degrees> (default 90)", "rotate clockwise, expanding the canvas"),
    ("flip", "direction=horizontal|vertical", "mirror along an axis"),
    ("brightness", "factor=<float> (1.0 = unchanged)", "lighten or darken"),
    ("contrast", "factor=<float> (1.0 = unchanged)", "expand or flatten tonal range"),
    ("saturation", "factor=<float> (1.0 = unchanged)", "strengthen or mute colors"),
    ("hue", "factor=<half-degrees> (default 0)", "rotate hues around the color wheel"),
    ("vibrance", "factor=<float> (1.0 = unchanged)", "boost muted colors more than vivid ones"),
    ("compress", "quality=<1-95> (default from config)", "re-encode smaller"),
    ("bw", "", "black and white"),
    ("blur", "amount=<radius> (default 5)", "gaussian blur"),
    ("sharpen", "amount=<float> (default 1.5)", "sharpen edges"),
    ("filter", "type=<name> intensity=<0-100>", "named color filter"),
    ("remove_background", "color=<css color|transparent>", "cut out the subject"),
    ("enhance", "", "one-shot auto improvement"),
];

impl Operation {
    /// Parse an operation by name with its raw parameter map.
    pub fn parse(
        name: &str,
        params: &Map<String, Value>,
        defaults: &OpDefaults,
    ) -> Result<Self, OperationParseError> {
        match canonical(name).as_str() {
            "resize" => Ok(Self::Resize {
                width: require_dimension(params, "width")?,
                height: require_dimension(params, "height")?,
            }),
            "rotate" => Ok(Self::Rotate {
                angle: float_or(params, "angle", 90.0)?,
            }),
            "flip" => {
                let raw = string_param(params, "direction")
                    .unwrap_or_else(|| "horizontal".to_string());
                let direction = FlipDirection::parse(&raw);
                if direction.is_none() {
                    warn!(direction = %raw, "unrecognized flip direction, passing image through");
                }
                Ok(Self::Flip { direction })
            }
            "brightness" => Ok(Self::Brightness {
                factor: float_or(params, "factor", 1.0)?,
            }),
            "contrast" => Ok(Self::Contrast {
                factor: float_or(params, "factor", 1.0)?,
            }),
            "saturation" => Ok(Self::Saturation {
                factor: float_or(params, "factor", 1.0)?,
            }),
            "hue" => Ok(Self::Hue {
                shift: float_or(params, "factor", 0.0)?,
            }),
            "vibrance" => Ok(Self::Vibrance {
                factor: float_or(params, "factor", 1.0)?,
            }),
            "compress" => Ok(Self::Compress {
                quality: int_param(params, "quality")?
                    .map(Quality::new)
                    .unwrap_or(defaults.quality),
            }),
            "bw" => Ok(Self::BlackWhite),
            "blur" => Ok(Self::Blur {
                radius: float_or(params, "amount", 5.0)?,
            }),
            "sharpen" => Ok(Self::Sharpen {
                amount: float_or(params, "amount", 1.5)?,
            }),
            "filter" => {
                let requested = string_param(params, "type");
                let kind = requested.as_deref().and_then(FilterKind::parse);
                if let Some(name) = requested.as_deref() {
                    let name = name.trim();
                    if kind.is_none() && !name.is_empty() && !name.eq_ignore_ascii_case("none") {
                        warn!(filter = %name, "unrecognized filter type, passing image through");
                    }
                }
                Ok(Self::Filter {
                    kind,
                    intensity: int_param(params, "intensity")?
                        .map(Intensity::new)
                        .unwrap_or(defaults.intensity),
                })
            }
            "remove_background" => Ok(Self::RemoveBackground {
                background: match string_param(params, "color") {
                    Some(raw) => BackgroundColor::parse(&raw),
                    None => BackgroundColor::Transparent,
                },
            }),
            "enhance" => Ok(Self::Enhance),
            other => Err(OperationParseError::UnknownOperation(other.to_string())),
        }
    }

    /// Canonical name, for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Resize { .. } => "resize",
            Self::Rotate { .. } => "rotate",
            Self::Flip { .. } => "flip",
            Self::Brightness { .. } => "brightness",
            Self::Contrast { .. } => "contrast",
            Self::Saturation { .. } => "saturation",
            Self::Hue { .. } => "hue",
            Self::Vibrance { .. } => "vibrance",
            Self::Compress { .. } => "compress",
            Self::BlackWhite => "bw",
            Self::Blur { .. } => "blur",
            Self::Sharpen { .. } => "sharpen",
            Self::Filter { .. } => "filter",
            Self::RemoveBackground { .. } => "remove_background",
            Self::Enhance => "enhance",
        }
    }
}

fn canonical(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase().replace('-', "_");
    match lower.as_str() {
        "black_and_white" | "grayscale" => "bw".to_string(),
        "auto_adjust" => "enhance".to_string(),
        _ => lower,
    }
}

fn string_param(params: &Map<String, Value>, name: &str) -> Option<String> {
    match params.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn float_param(
    params: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<f32>, OperationParseError> {
    let Some(value) = params.get(name) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(f) => Ok(Some(f as f32)),
        None => Err(OperationParseError::InvalidValue {
            name,
            expected: "number",
            value: value.to_string(),
        }),
    }
}

fn float_or(
    params: &Map<String, Value>,
    name: &'static str,
    default: f32,
) -> Result<f32, OperationParseError> {
    Ok(float_param(params, name)?.unwrap_or(default))
}

fn int_param(
    params: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<i64>, OperationParseError> {
    Ok(float_param(params, name)?.map(|f| f.trunc() as i64))
}

fn require_dimension(
    params: &Map<String, Value>,
    name: &'static str,
) -> Result<u32, OperationParseError> {
    let value = int_param(params, name)?.ok_or(OperationParseError::MissingParameter(name))?;
    if (1..=MAX_PIXEL_DIMENSION).contains(&value) {
        Ok(value as u32)
    } else {
        Err(OperationParseError::InvalidValue {
            name,
            expected: "positive pixel size",
            value: value.to_string(),
        })
    }
}
