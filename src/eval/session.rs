//! Batch session driving the codec over a test set.
//!
//! Every file runs through the same pipeline on a rayon worker:
//!
//! 1. encode the source into the worker's temporary compressed file
//! 2. decode that into the worker's temporary bitmap
//! 3. compare the source against the decoded bitmap
//! 4. measure sizes and parse the encoder's statistic
//!
//! Temporary files are named after the worker index, so concurrently running
//! pipelines never share them. They are left in place after the run.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::{CodecInvoker, ProgramResult, Verb};
use crate::compression::CompressionInfo;
use crate::error::{Error, Result};
use crate::eval::report::{Report, ResultAggregator, TestResult};
use crate::stats::parse_encoding_statistic;

/// Configuration for a batch session.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Directory holding the per-worker temporary files.
    pub temp_dir: PathBuf,

    /// File name prefix of the temporary files.
    pub temp_prefix: String,

    /// Number of workers; `None` uses the host's available parallelism.
    pub workers: Option<usize>,

    /// Extension of the temporary compressed file.
    pub encoded_extension: String,

    /// Extension of the temporary decoded bitmap.
    pub decoded_extension: String,
}

impl BatchConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder::default()
    }

    /// Temporary file pair owned by `worker`.
    #[must_use]
    pub fn temp_paths(&self, worker: usize) -> TempPaths {
        let name = |ext: &str| {
            self.temp_dir
                .join(format!("{}_{}.{}", self.temp_prefix, worker, ext))
        };
        TempPaths {
            encoded: name(&self.encoded_extension),
            decoded: name(&self.decoded_extension),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfigBuilder::default().build()
    }
}

/// Builder for [`BatchConfig`].
#[derive(Debug, Default)]
pub struct BatchConfigBuilder {
    temp_dir: Option<PathBuf>,
    temp_prefix: Option<String>,
    workers: Option<usize>,
    encoded_extension: Option<String>,
    decoded_extension: Option<String>,
}

impl BatchConfigBuilder {
    /// Set the temporary directory (default `temp`, relative to the working directory).
    #[must_use]
    pub fn temp_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(path.into());
        self
    }

    /// Set the temporary file prefix (default `temp`).
    #[must_use]
    pub fn temp_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.temp_prefix = Some(prefix.into());
        self
    }

    /// Set the number of workers.
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Set the compressed file extension (default `qoi`).
    #[must_use]
    pub fn encoded_extension(mut self, ext: impl Into<String>) -> Self {
        self.encoded_extension = Some(ext.into());
        self
    }

    /// Set the decoded bitmap extension (default `bmp`).
    #[must_use]
    pub fn decoded_extension(mut self, ext: impl Into<String>) -> Self {
        self.decoded_extension = Some(ext.into());
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> BatchConfig {
        BatchConfig {
            temp_dir: self.temp_dir.unwrap_or_else(|| PathBuf::from("temp")),
            temp_prefix: self.temp_prefix.unwrap_or_else(|| "temp".to_string()),
            workers: self.workers,
            encoded_extension: self.encoded_extension.unwrap_or_else(|| "qoi".to_string()),
            decoded_extension: self.decoded_extension.unwrap_or_else(|| "bmp".to_string()),
        }
    }
}

/// Temporary files of one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempPaths {
    /// Encoder output.
    pub encoded: PathBuf,
    /// Decoder output.
    pub decoded: PathBuf,
}

/// Outcome of the pipeline for one file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Round trip succeeded and was measured.
    Passed(TestResult),
    /// The encode step failed.
    EncodeFailed,
    /// The decode step failed.
    DecodeFailed,
    /// The decoded image differs from the source.
    Mismatch,
    /// Sizes could not be measured after a successful round trip.
    MetricFailed,
}

/// Run-wide counters.
///
/// `processed` counts every file that got past the decode step. Encode and
/// decode failures are tracked separately and leave it untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    /// Files in the test set.
    pub total: usize,
    /// Files counted as tested.
    pub processed: usize,
    /// Files that failed the compare step.
    pub mismatched: usize,
    /// Files that failed the encode step.
    pub encode_failures: usize,
    /// Files that failed the decode step.
    pub decode_failures: usize,
    /// Files excluded because their sizes could not be measured.
    pub metric_failures: usize,
}

/// Shared state of a running batch.
#[derive(Debug, Default)]
struct RunState {
    total: usize,
    processed: AtomicUsize,
    mismatched: AtomicUsize,
    encode_failures: AtomicUsize,
    decode_failures: AtomicUsize,
    metric_failures: AtomicUsize,
    results: ResultAggregator,
}

impl RunState {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    fn record(&self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Passed(result) => {
                self.results.add(result);
                let done = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
                info!("{} of {}", done, self.total);
            }
            FileOutcome::Mismatch => {
                self.mismatched.fetch_add(1, Ordering::Relaxed);
                self.processed.fetch_add(1, Ordering::Relaxed);
            }
            FileOutcome::EncodeFailed => {
                self.encode_failures.fetch_add(1, Ordering::Relaxed);
            }
            FileOutcome::DecodeFailed => {
                self.decode_failures.fetch_add(1, Ordering::Relaxed);
            }
            FileOutcome::MetricFailed => {
                self.metric_failures.fetch_add(1, Ordering::Relaxed);
                self.processed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn finish(self) -> Report {
        let counts = RunCounts {
            total: self.total,
            processed: self.processed.into_inner(),
            mismatched: self.mismatched.into_inner(),
            encode_failures: self.encode_failures.into_inner(),
            decode_failures: self.decode_failures.into_inner(),
            metric_failures: self.metric_failures.into_inner(),
        };
        self.results.reduce(&counts)
    }
}

/// Batch session for one codec.
///
/// # Example
///
/// ```rust,ignore
/// use qoi_bench::{BatchConfig, BatchSession, ProcessInvoker, corpus::discover_test_set};
///
/// let files = discover_test_set("./testset")?;
/// let session = BatchSession::new(BatchConfig::default(), ProcessInvoker::new("./qoi"));
/// let report = session.run(&files)?;
/// print!("{}", report.render());
/// ```
pub struct BatchSession<I> {
    config: BatchConfig,
    invoker: I,
}

impl<I: CodecInvoker> BatchSession<I> {
    /// Create a new session.
    #[must_use]
    pub fn new(config: BatchConfig, invoker: I) -> Self {
        Self { config, invoker }
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// The codec invoker.
    #[must_use]
    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Run every file through the pipeline and reduce the results.
    ///
    /// Per-file failures never abort the run. Errors are returned only for
    /// setup problems (temporary directory, worker pool).
    pub fn run(&self, files: &[PathBuf]) -> Result<Report> {
        std::fs::create_dir_all(&self.config.temp_dir)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers.unwrap_or(0))
            .thread_name(|i| format!("qoi-bench-{i}"))
            .build()
            .map_err(|e| Error::WorkerPool(e.to_string()))?;

        debug!(
            files = files.len(),
            workers = pool.current_num_threads(),
            temp_dir = %self.config.temp_dir.display(),
            "starting batch"
        );

        let state = RunState::new(files.len());
        pool.install(|| {
            files.par_iter().for_each(|file| {
                let worker = rayon::current_thread_index().unwrap_or(0);
                state.record(self.process_file(file, worker));
            });
        });

        // `install` returns only after every file has been recorded.
        Ok(state.finish())
    }

    /// Run the pipeline for a single file using `worker`'s temporary files.
    pub fn process_file(&self, file: &Path, worker: usize) -> FileOutcome {
        let temp = self.config.temp_paths(worker);

        let Some(encoded) = self.step(Verb::Encode, file, &temp.encoded) else {
            warn!("Compression test error on {}.", file.display());
            return FileOutcome::EncodeFailed;
        };

        if self.step(Verb::Decode, &temp.encoded, &temp.decoded).is_none() {
            warn!("Decompression test error on {}.", file.display());
            return FileOutcome::DecodeFailed;
        }

        if self.step(Verb::Compare, file, &temp.decoded).is_none() {
            warn!("Unmatched image between source and decompressed! ({})", file.display());
            return FileOutcome::Mismatch;
        }

        let compression = match CompressionInfo::measure(file, &temp.encoded) {
            Ok(info) => info,
            Err(e) => {
                warn!("Failed to measure {}: {}", file.display(), e);
                return FileOutcome::MetricFailed;
            }
        };
        let statistic = parse_encoding_statistic(&encoded.stdout);

        FileOutcome::Passed(TestResult::new(file, statistic, compression))
    }

    /// Invoke one verb; `None` on spawn failure or non-zero exit.
    fn step(&self, verb: Verb, source: &Path, target: &Path) -> Option<ProgramResult> {
        match self.invoker.invoke(verb, source, target) {
            Ok(result) if result.success() => Some(result),
            Ok(result) => {
                debug!(
                    %verb,
                    exit_code = result.exit_code,
                    source = %source.display(),
                    "codec step failed"
                );
                None
            }
            Err(e) => {
                warn!(%verb, "{e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::stats::EncodingKind;

    /// Invoker replaying a fixed result per verb and recording calls.
    struct Scripted {
        encode: ProgramResult,
        decode: i32,
        compare: i32,
        header: Option<Vec<u8>>,
        calls: Mutex<Vec<(Verb, PathBuf, PathBuf)>>,
    }

    impl Scripted {
        fn passing() -> Self {
            Self {
                encode: ProgramResult::new("-- QOI Encoding Statistic --\nRUN = 2\nRGB = 6\n", 0),
                decode: 0,
                compare: 0,
                header: Some(vec![0, 0, 0, 0, 0, 0, 0, 0, 12, 0, 0, 0]),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn verbs(&self) -> Vec<Verb> {
            self.calls.lock().unwrap().iter().map(|c| c.0).collect()
        }
    }

    impl CodecInvoker for Scripted {
        fn invoke(&self, verb: Verb, source: &Path, target: &Path) -> Result<ProgramResult> {
            self.calls
                .lock()
                .unwrap()
                .push((verb, source.to_path_buf(), target.to_path_buf()));
            match verb {
                Verb::Encode => {
                    if let Some(header) = &self.header {
                        std::fs::write(target, header)?;
                    }
                    Ok(self.encode.clone())
                }
                Verb::Decode => Ok(ProgramResult::new("", self.decode)),
                Verb::Compare => Ok(ProgramResult::new("", self.compare)),
            }
        }
    }

    fn fixture() -> (tempfile::TempDir, PathBuf, BatchConfig) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("grad___a.bmp");
        image::RgbImage::new(4, 2).save(&source).unwrap();
        let temp_dir = dir.path().join("temp");
        std::fs::create_dir_all(&temp_dir).unwrap();
        let config = BatchConfig::builder().temp_dir(temp_dir).build();
        (dir, source, config)
    }

    #[test]
    fn test_config_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.temp_dir, PathBuf::from("temp"));
        assert_eq!(config.workers, None);
        let temp = config.temp_paths(3);
        assert_eq!(temp.encoded, PathBuf::from("temp/temp_3.qoi"));
        assert_eq!(temp.decoded, PathBuf::from("temp/temp_3.bmp"));
    }

    #[test]
    fn test_temp_paths_disjoint_per_worker() {
        let config = BatchConfig::builder().temp_prefix("run").workers(4).build();
        let a = config.temp_paths(0);
        let b = config.temp_paths(1);
        assert_ne!(a.encoded, b.encoded);
        assert_ne!(a.decoded, b.decoded);
        assert_ne!(a.encoded, a.decoded);
    }

    #[test]
    fn test_passing_pipeline() {
        let (_dir, source, config) = fixture();
        let session = BatchSession::new(config, Scripted::passing());

        let FileOutcome::Passed(result) = session.process_file(&source, 0) else {
            panic!("expected pass");
        };
        assert_eq!(result.compression, CompressionInfo::new(24, 12));
        assert_eq!(result.statistic[EncodingKind::Run], 2);
        assert_eq!(result.statistic[EncodingKind::Rgb], 6);
        assert_eq!(result.file_class(), "grad");
        assert_eq!(
            session.invoker.verbs(),
            vec![Verb::Encode, Verb::Decode, Verb::Compare]
        );
    }

    #[test]
    fn test_pipeline_wires_paths() {
        let (_dir, source, config) = fixture();
        let temp = config.temp_paths(5);
        let session = BatchSession::new(config, Scripted::passing());
        let _ = session.process_file(&source, 5);

        let calls = session.invoker.calls.lock().unwrap().clone();
        assert_eq!(calls[0], (Verb::Encode, source.clone(), temp.encoded.clone()));
        assert_eq!(calls[1], (Verb::Decode, temp.encoded.clone(), temp.decoded.clone()));
        assert_eq!(calls[2], (Verb::Compare, source, temp.decoded));
    }

    #[test]
    fn test_encode_failure_stops_pipeline() {
        let (_dir, source, config) = fixture();
        let mut invoker = Scripted::passing();
        invoker.encode = ProgramResult::new("", 1);
        let session = BatchSession::new(config, invoker);

        assert_eq!(session.process_file(&source, 0), FileOutcome::EncodeFailed);
        assert_eq!(session.invoker.verbs(), vec![Verb::Encode]);
    }

    #[test]
    fn test_decode_failure_stops_pipeline() {
        let (_dir, source, config) = fixture();
        let mut invoker = Scripted::passing();
        invoker.decode = 2;
        let session = BatchSession::new(config, invoker);

        assert_eq!(session.process_file(&source, 0), FileOutcome::DecodeFailed);
        assert_eq!(session.invoker.verbs(), vec![Verb::Encode, Verb::Decode]);
    }

    #[test]
    fn test_compare_failure_is_mismatch() {
        let (_dir, source, config) = fixture();
        let mut invoker = Scripted::passing();
        invoker.compare = 1;
        let session = BatchSession::new(config, invoker);

        assert_eq!(session.process_file(&source, 0), FileOutcome::Mismatch);
    }

    #[test]
    fn test_truncated_output_is_metric_failure() {
        let (_dir, source, config) = fixture();
        let mut invoker = Scripted::passing();
        invoker.header = Some(vec![0; 6]);
        let session = BatchSession::new(config, invoker);

        assert_eq!(session.process_file(&source, 0), FileOutcome::MetricFailed);
    }

    #[test]
    fn test_counter_asymmetry() {
        let state = RunState::new(5);
        state.record(FileOutcome::EncodeFailed);
        state.record(FileOutcome::DecodeFailed);
        state.record(FileOutcome::MetricFailed);
        state.record(FileOutcome::Mismatch);
        state.record(FileOutcome::Passed(TestResult::new(
            "x.bmp",
            crate::stats::EncodingStatistic::new(),
            CompressionInfo::new(10, 5),
        )));

        let report = state.finish();
        assert_eq!(report.total, 5);
        assert_eq!(report.processed, 3);
        assert_eq!(report.mismatched, 1);
        assert_eq!(report.encode_failures, 1);
        assert_eq!(report.decode_failures, 1);
        assert_eq!(report.metric_failures, 1);
        assert_eq!(report.global.result_count, 1);
    }

    #[test]
    fn test_run_creates_temp_dir() {
        let (dir, source, _) = fixture();
        let temp_dir = dir.path().join("fresh").join("temp");
        let config = BatchConfig::builder().temp_dir(&temp_dir).workers(2).build();
        let session = BatchSession::new(config, Scripted::passing());

        let report = session.run(&[source]).unwrap();
        assert!(temp_dir.is_dir());
        assert_eq!(report.processed, 1);
        assert!((report.global.average_ratio - 0.5).abs() < 1e-12);
    }
}
