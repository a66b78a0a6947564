//! Batch evaluation and report generation.
//!
//! - [`session::BatchSession`]: runs the encode / decode / compare pipeline over a test set
//! - [`session::BatchConfig`]: temporary file layout and worker count
//! - [`report`]: per-file results, their aggregation and the rendered report

pub mod report;
pub mod session;

pub use report::{ClassSummary, GroupSummary, Report, ResultAggregator, TestResult};
pub use session::{BatchConfig, BatchSession, FileOutcome, RunCounts};
