//! # qoi-bench
//!
//! Batch round-trip harness for QOI-style lossless image codecs.
//!
//! The codec under test is an external program driven through three verbs
//! (encode, decode, compare). For every bitmap of a test set the harness
//! checks that the round trip is lossless, measures the compression ratio and
//! collects the encoder's per-chunk encoding statistic. Results are reported
//! globally and per image class.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use qoi_bench::{BatchConfig, BatchSession, ProcessInvoker};
//! use qoi_bench::corpus::discover_test_set;
//!
//! let files = discover_test_set("./testset")?;
//! let session = BatchSession::new(BatchConfig::default(), ProcessInvoker::new("./qoi"));
//! let report = session.run(&files)?;
//! print!("{}", report.render());
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`codec`]: Invocation of the external codec program
//! - [`compression`]: Source and compressed size accounting
//! - [`stats`]: Encoding statistics and their parser
//! - [`corpus`]: Test set discovery and bitmap conversion
//! - [`eval`]: Batch session and report generation

pub mod codec;
pub mod compression;
pub mod corpus;
pub mod error;
pub mod eval;
pub mod stats;

// Re-export commonly used types
pub use codec::{CodecInvoker, ProcessInvoker, ProgramResult, Verb};
pub use compression::CompressionInfo;
pub use error::{Error, Result};
pub use eval::{
    report::{ClassSummary, GroupSummary, Report, ResultAggregator, TestResult},
    session::{BatchConfig, BatchSession, FileOutcome, RunCounts},
};
pub use stats::{EncodingKind, EncodingStatistic, parse_encoding_statistic};
