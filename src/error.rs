//! Error types for qoi-bench operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for qoi-bench operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while benchmarking a codec.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The codec program could not be started.
    #[error("Failed to run {program}: {reason}")]
    ProcessSpawn {
        /// Path of the codec program.
        program: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Compressed file ended before the block length field was complete.
    #[error("Truncated header in {path}: got {got} of 12 bytes")]
    TruncatedHeader {
        /// Path to the compressed file.
        path: PathBuf,
        /// Number of header bytes actually available.
        got: usize,
    },

    /// Failed to load or probe an image file.
    #[error("Image load failed: {path}: {reason}")]
    ImageLoad {
        /// Path to the image that failed to load.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// The test set directory could not be enumerated.
    #[error("Test set error: {0}")]
    TestSet(String),

    /// The worker pool could not be created.
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// Failed to convert an image to the canonical bitmap format.
    #[error("Conversion failed: {path}: {reason}")]
    Convert {
        /// Path of the source image.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
