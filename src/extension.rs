//! Output extension policy.
//!
//! Background removal introduces transparency, so its output must land in
//! an alpha-capable format no matter what the input was. PNG inputs keep
//! their lossless format through the operations that can add fill pixels
//! (rotate, flip) or re-render everything (enhance). Everything else keeps
//! the input's extension when one is known.

use crate::imaging::writer::OutputFormat;
use crate::operation::Operation;
use std::path::{Path, PathBuf};

/// The extension an output should use, or `None` when nothing can be
/// determined (callers fall back to JPEG).
pub fn resolve_output_extension(op: &Operation, input_ext: Option<&str>) -> Option<String> {
    if matches!(op, Operation::RemoveBackground { .. }) {
        return Some("png".to_string());
    }
    let input_is_png = input_ext.is_some_and(|e| e.eq_ignore_ascii_case("png"));
    if input_is_png
        && matches!(
            op,
            Operation::Enhance | Operation::Rotate { .. } | Operation::Flip { .. }
        )
    {
        return Some("png".to_string());
    }
    input_ext.map(|e| e.to_ascii_lowercase())
}

/// Apply the policy to a requested output path.
///
/// An explicit extension on the request wins, except that background
/// removal rewrites alpha-incapable extensions to `.png`. Requests without
/// an extension get the policy result, defaulting to `.jpg`.
pub fn finalize_output_path(
    requested: &Path,
    op: &Operation,
    input_ext: Option<&str>,
) -> PathBuf {
    if requested.extension().is_some() {
        let alpha_capable =
            OutputFormat::from_path(requested).is_some_and(OutputFormat::supports_alpha);
        if matches!(op, Operation::RemoveBackground { .. }) && !alpha_capable {
            return requested.with_extension("png");
        }
        return requested.to_path_buf();
    }
    match resolve_output_extension(op, input_ext) {
        Some(ext) => requested.with_extension(ext),
        None => requested.with_extension("jpg"),
    }
}
