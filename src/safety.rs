//! Safety checks run before any artifact is written.
//!
//! Every stage reads user-provided lyrics or aligner output and writes a
//! derived file next to them; these checks stop a typo in the CLI from
//! overwriting an input.

use std::path::Path;

use crate::error::{LyricError, Result};

/// Validates that an output path is safe to overwrite.
///
/// Checks:
/// - Output must carry the required extension (e.g., "json")
/// - Output cannot be the same as any of the provided source paths
pub fn validate_output_path(output: &Path, required_extension: &str, source_paths: &[&Path]) -> Result<()> {
    let extension = output.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !extension.eq_ignore_ascii_case(required_extension) {
        return Err(LyricError::unsafe_output(
            output,
            format!("output must have a .{} extension", required_extension),
        ));
    }

    for source in source_paths {
        if same_file(output, source) {
            return Err(LyricError::unsafe_output(
                output,
                format!("cannot be the same as source '{}'", source.display()),
            ));
        }
    }

    Ok(())
}

/// Compare canonical paths when both exist, raw paths otherwise.
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
