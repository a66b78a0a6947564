//! Image discovery in directories.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Extension of the canonical test bitmaps.
pub const TEST_SET_EXTENSION: &str = "bmp";

/// List the bitmaps directly inside `path`, sorted by path.
///
/// Subdirectories are not searched. Failing to read the directory is the
/// only error; unreadable entries are skipped.
pub fn discover_test_set(path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    if !path.is_dir() {
        return Err(Error::TestSet(format!("Path is not a directory: {}", path.display())));
    }

    let entries = fs::read_dir(path).map_err(|e| {
        Error::TestSet(format!("Failed to read directory {}: {}", path.display(), e))
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && has_extension(p, TEST_SET_EXTENSION))
        .collect();
    files.sort();

    Ok(files)
}

/// Recursively collect files with the given extension under `root`.
pub(crate) fn discover_recursive(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk(root, extension, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(current: &Path, extension: &str, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(current).map_err(|e| {
        Error::TestSet(format!("Failed to read directory {}: {}", current.display(), e))
    })?;

    for entry in entries {
        let path = entry
            .map_err(|e| {
                Error::TestSet(format!("Failed to read entry in {}: {}", current.display(), e))
            })?
            .path();

        if path.is_dir() {
            walk(&path, extension, files)?;
        } else if path.is_file() && has_extension(&path, extension) {
            files.push(path);
        }
    }

    Ok(())
}

pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case(extension))
}
