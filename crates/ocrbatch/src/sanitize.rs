//! Helpers for turning user-supplied names into safe on-disk names, and for
//! keeping full paths out of tracing span attributes.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals the file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Reduces an uploaded filename to a flat ASCII name safe to join onto a
/// directory.
///
/// - path separators become spaces, then whitespace runs become `_`
/// - only `[A-Za-z0-9_.-]` survive
/// - leading/trailing `.` and `_` are stripped
///
/// Returns `None` when nothing usable is left (e.g. `"../.."`).
pub fn secure_filename(filename: &str) -> Option<String> {
    let flattened: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Splits a filename at its last `.`; the stem is the whole name when there
/// is no extension.
pub fn file_stem(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => filename,
    }
}
