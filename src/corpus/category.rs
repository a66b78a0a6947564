//! Image class derived from the file name.

use std::path::Path;

/// Separator between class and image name in a test set file name.
pub const CLASS_SEPARATOR: &str = "___";

/// Class of a test image, or `""` when the name has no class prefix.
///
/// The base name (without extension) is split on [`CLASS_SEPARATOR`]; with
/// more than one segment the class is the first one.
#[must_use]
pub fn file_class(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    let mut segments = stem.split(CLASS_SEPARATOR);
    match (segments.next(), segments.next()) {
        (Some(class), Some(_)) => class.to_string(),
        _ => String::new(),
    }
}
