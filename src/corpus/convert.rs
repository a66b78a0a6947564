//! Conversion of PNG trees into a flat test set of 24-bit RGB bitmaps.
//!
//! The directory of each source image relative to the root becomes its
//! image class: `root/photo/kodak/k01.png` is written as
//! `out/photo_kodak___k01.bmp`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::ImageFormat;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::corpus::CLASS_SEPARATOR;
use crate::corpus::discovery::discover_recursive;
use crate::error::{Error, Result};

/// Extension of the images picked up for conversion.
pub const SOURCE_EXTENSION: &str = "png";

/// Outcome of a conversion run.
#[derive(Debug, Clone, Default)]
pub struct ConvertSummary {
    /// Number of images written.
    pub converted: usize,
    /// Number of images that could not be converted.
    pub failed: usize,
    /// Paths of the written bitmaps, sorted.
    pub outputs: Vec<PathBuf>,
}

/// Convert every PNG under `root` into `out`.
///
/// `out` is deleted and recreated first. Individual failures are logged and
/// counted; only directory-level problems are returned as errors.
pub fn convert_directory(root: &Path, out: &Path) -> Result<ConvertSummary> {
    if out.exists() {
        fs::remove_dir_all(out)?;
    }
    fs::create_dir_all(out)?;

    let files = discover_recursive(root, SOURCE_EXTENSION)?;
    let count = files.len();
    let done = AtomicUsize::new(0);
    let outputs = Mutex::new(Vec::with_capacity(count));

    let failed = files
        .par_iter()
        .filter(|file| {
            let target = out.join(output_name(root, file));
            match convert_file(file, &target) {
                Ok(()) => {
                    let i = done.fetch_add(1, Ordering::Relaxed) + 1;
                    info!("Proceed {} of {} images, save to {}.", i, count, target.display());
                    outputs
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner)
                        .push(target);
                    false
                }
                Err(e) => {
                    warn!("{e}");
                    true
                }
            }
        })
        .count();

    let mut outputs = outputs
        .into_inner()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    outputs.sort();

    Ok(ConvertSummary {
        converted: outputs.len(),
        failed,
        outputs,
    })
}

/// Decode any supported image and save it as an 8-bit RGB bitmap.
pub fn convert_file(source: &Path, target: &Path) -> Result<()> {
    let img = image::open(source).map_err(|e| Error::Convert {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;

    img.to_rgb8()
        .save_with_format(target, ImageFormat::Bmp)
        .map_err(|e| Error::Convert {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })
}

/// `{relative dir with separators replaced by '_'}___{stem}.bmp`
fn output_name(root: &Path, file: &Path) -> String {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    let sub_path = file
        .strip_prefix(root)
        .ok()
        .and_then(Path::parent)
        .map(|p| p.to_string_lossy().replace(['/', '\\'], "_"))
        .unwrap_or_default();

    format!("{sub_path}{CLASS_SEPARATOR}{stem}.bmp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::file_class;

    #[test]
    fn test_output_name() {
        let root = Path::new("/corpus");
        assert_eq!(
            output_name(root, Path::new("/corpus/photo/kodak/k01.png")),
            "photo_kodak___k01.bmp"
        );
        assert_eq!(output_name(root, Path::new("/corpus/top.png")), "___top.bmp");
    }

    #[test]
    fn test_convert_directory() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let out_dir = out.path().join("out");

        fs::create_dir_all(src.path().join("screens")).unwrap();
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 128]))
            .save(src.path().join("screens").join("ui.png"))
            .unwrap();
        image::RgbImage::new(5, 5).save(src.path().join("flat.png")).unwrap();
        fs::write(src.path().join("broken.png"), b"not a png").unwrap();

        // Stale content is removed.
        fs::create_dir_all(&out_dir).unwrap();
        fs::write(out_dir.join("stale.bmp"), b"x").unwrap();

        let summary = convert_directory(src.path(), &out_dir).unwrap();
        assert_eq!(summary.converted, 2);
        assert_eq!(summary.failed, 1);
        assert!(!out_dir.join("stale.bmp").exists());

        let ui = out_dir.join("screens___ui.bmp");
        assert!(summary.outputs.contains(&ui));
        assert_eq!(file_class(&ui), "screens");

        let decoded = image::open(&ui).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }
}
