//! Tool configuration module.
//!
//! Handles loading, validating, and merging `retouch.toml`. Stock defaults
//! are overridden by an optional config file: either one passed explicitly
//! on the command line, or `retouch.toml` in the working directory.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! quality = 85           # Encode quality for JPEG/WebP (1-95)
//! filter_intensity = 100 # Default filter strength (0-100)
//!
//! [segmentation]
//! command = "rembg"      # Background-removal command (bytes in, bytes out)
//! args = ["i"]           # Arguments passed before the piped image
//!
//! [processing]
//! max_threads = 4        # Max parallel workers in batch mode (omit for auto)
//! ```
//!
//! Config files are sparse — override just the values you want. Unknown
//! keys are rejected to catch typos early.

use crate::imaging::params::{Intensity, Quality};
use crate::imaging::segmentation::CommandSegmenter;
use crate::operation::OpDefaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "retouch.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `retouch.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Output encoding defaults.
    pub output: OutputConfig,
    /// Background-removal command settings.
    pub segmentation: SegmentationConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=95).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-95".into(),
            ));
        }
        if self.output.filter_intensity > 100 {
            return Err(ConfigError::Validation(
                "output.filter_intensity must be 0-100".into(),
            ));
        }
        if self.segmentation.command.trim().is_empty() {
            return Err(ConfigError::Validation(
                "segmentation.command must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Per-operation defaults derived from the `[output]` section.
    pub fn op_defaults(&self) -> OpDefaults {
        OpDefaults {
            quality: Quality::new(self.output.quality as i64),
            intensity: Intensity::new(self.output.filter_intensity as i64),
        }
    }

    /// Build the segmentation backend described by `[segmentation]`.
    pub fn segmenter(&self) -> CommandSegmenter {
        CommandSegmenter::new(&self.segmentation.command, self.segmentation.args.clone())
    }
}

/// Output encoding defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Encode quality for lossy formats when a request omits it (1-95).
    pub quality: u32,
    /// Filter strength when a request omits it (0-100).
    pub filter_intensity: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quality: 85,
            filter_intensity: 100,
        }
    }
}

/// Background-removal command settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SegmentationConfig {
    /// Executable to run; receives the image on stdin, must write the
    /// cut-out image to stdout.
    pub command: String,
    /// Arguments passed to the command.
    pub args: Vec<String>,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            command: "rembg".to_string(),
            args: vec!["i".to_string()],
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers in batch mode.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_threads.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ToolConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ToolConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load configuration, merging user values on top of stock defaults.
///
/// An explicitly given path must exist; without one, `retouch.toml` in the
/// working directory is used when present, otherwise stock defaults apply.
pub fn load_config(explicit: Option<&Path>) -> Result<ToolConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = match explicit {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str(&content)?)
        }
        None => load_raw_config(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `retouch.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Retouch Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Retouch reads ./retouch.toml automatically, or pass --config <path>.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output encoding
# ---------------------------------------------------------------------------
[output]
# Encode quality for JPEG/WebP when an operation doesn't specify one (1-95).
quality = 85

# Default strength for named filters when not given per call (0-100).
filter_intensity = 100

# ---------------------------------------------------------------------------
# Background removal
# ---------------------------------------------------------------------------
[segmentation]
# External command used by remove_background. It receives the encoded image
# on stdin and must write the cut-out image (with alpha) to stdout.
command = "rembg"
args = ["i"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers in batch mode.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_threads = 4
"##
}
