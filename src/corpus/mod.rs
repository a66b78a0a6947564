//! Test set management.
//!
//! A test set is a flat directory of 24-bit RGB bitmaps. File names may carry
//! an image class prefix, `<class>___<name>.bmp`, which groups results in the
//! report. The [`convert`] module produces such a directory from an arbitrary
//! tree of PNG images.
//!
//! ## Example
//!
//! ```rust,ignore
//! use qoi_bench::corpus::{discover_test_set, file_class};
//!
//! let files = discover_test_set("./testset")?;
//! for file in &files {
//!     println!("{} -> [{}]", file.display(), file_class(file));
//! }
//! ```

mod category;
pub mod convert;
mod discovery;

pub use category::{CLASS_SEPARATOR, file_class};
pub use convert::{ConvertSummary, convert_directory};
pub use discovery::{TEST_SET_EXTENSION, discover_test_set};
