//! Test results and their aggregation into a report.
//!
//! Workers push [`TestResult`]s into a shared [`ResultAggregator`]. Once all
//! workers have finished, [`ResultAggregator::reduce`] folds them into a
//! [`Report`] with a global summary and one summary per image class.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::Result;
use crate::compression::CompressionInfo;
use crate::corpus::file_class;
use crate::eval::session::RunCounts;
use crate::stats::{EncodingKind, EncodingStatistic, mean};

/// Outcome of one successfully round-tripped file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    /// Source bitmap.
    pub file_name: PathBuf,
    /// Encoding counters reported by the encoder.
    pub statistic: EncodingStatistic,
    /// Source and compressed sizes.
    pub compression: CompressionInfo,
}

impl TestResult {
    /// Create a new result.
    #[must_use]
    pub fn new(
        file_name: impl Into<PathBuf>,
        statistic: EncodingStatistic,
        compression: CompressionInfo,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            statistic,
            compression,
        }
    }

    /// Image class from the file name, `""` when unclassified.
    #[must_use]
    pub fn file_class(&self) -> String {
        file_class(&self.file_name)
    }

    /// Source file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_name
    }
}

/// Average ratio and merged statistic over a group of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    /// Number of results in the group.
    pub result_count: usize,
    /// Mean compression ratio (NaN for an empty group).
    pub average_ratio: f64,
    /// Element-wise sum of the group's statistics.
    pub statistic: EncodingStatistic,
}

impl GroupSummary {
    /// Summarize a group of results.
    #[must_use]
    pub fn compute<'a>(results: impl IntoIterator<Item = &'a TestResult>) -> Self {
        let mut ratios = Vec::new();
        let mut statistic = EncodingStatistic::new();
        for result in results {
            ratios.push(result.compression.ratio());
            statistic += result.statistic;
        }

        Self {
            result_count: ratios.len(),
            average_ratio: mean(&ratios),
            statistic,
        }
    }
}

/// Summary of one image class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSummary {
    /// Class name (`""` for unclassified images).
    pub class: String,
    /// Aggregates over the class.
    #[serde(flatten)]
    pub summary: GroupSummary,
}

/// Final report of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Files in the test set.
    pub total: usize,
    /// Files counted as tested.
    pub processed: usize,
    /// Files whose decoded image differs from the source.
    pub mismatched: usize,
    /// Files the codec failed to encode.
    pub encode_failures: usize,
    /// Files the codec failed to decode.
    pub decode_failures: usize,
    /// Files whose sizes could not be measured.
    pub metric_failures: usize,
    /// Aggregates over all results.
    pub global: GroupSummary,
    /// Aggregates per image class, in order of first appearance.
    pub classes: Vec<ClassSummary>,
    /// When this report was generated.
    #[serde(with = "chrono_serde")]
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

impl Report {
    /// Render the plain text report.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_text(&mut out);
        out
    }

    /// Pretty-printed JSON form of the report.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn write_text(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "-- QOI Batch Compression Test Result Report --")?;
        writeln!(out, "Pixel format of all images in test set are 24-bit RGB, no Alpha channel.")?;
        writeln!(
            out,
            "{} of {} file(s) has been tested. {} file(s) can not be opened and tested.",
            self.processed,
            self.total,
            self.total.saturating_sub(self.processed)
        )?;
        writeln!(out, "{} file(s) has difference between source and decoded.", self.mismatched)?;
        writeln!(out, "Average compression ratio: {:.2}%", self.global.average_ratio * 100.0)?;
        writeln!(out, "Statistic of each encoding, total {}", self.global.statistic.sum())?;
        write_breakdown(out, &self.global.statistic, ':')?;

        writeln!(out, "-- Statistics Grouped by Image Class --")?;
        for class in &self.classes {
            writeln!(out, "[{}]", class.class)?;
            writeln!(out, "Ratio = {:.2}%", class.summary.average_ratio * 100.0)?;
            write_breakdown(out, &class.summary.statistic, '=')?;
        }

        Ok(())
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

fn write_breakdown(out: &mut String, stat: &EncodingStatistic, sep: char) -> std::fmt::Result {
    for kind in EncodingKind::ALL {
        writeln!(
            out,
            "\t{}\t{} {}\t({:.2}%)",
            kind,
            sep,
            stat[kind],
            stat.percentage(kind)
        )?;
    }
    Ok(())
}

/// Concurrent collection of test results.
///
/// [`add`](Self::add) may be called from any worker. Reading is only
/// meaningful after every worker has finished.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Mutex<Vec<TestResult>>,
}

impl ResultAggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result; no deduplication.
    pub fn add(&self, result: TestResult) {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result);
    }

    /// Number of collected results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no result has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take ownership of the collected results.
    #[must_use]
    pub fn into_results(self) -> Vec<TestResult> {
        self.results
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Fold the results and run counters into a report.
    ///
    /// Consumes the aggregator, so no worker can still be adding.
    #[must_use]
    pub fn reduce(self, counts: &RunCounts) -> Report {
        let results = self.into_results();
        let global = GroupSummary::compute(&results);
        let classes = summarize_classes(&results);

        Report {
            total: counts.total,
            processed: counts.processed,
            mismatched: counts.mismatched,
            encode_failures: counts.encode_failures,
            decode_failures: counts.decode_failures,
            metric_failures: counts.metric_failures,
            global,
            classes,
            generated_at: chrono::Utc::now(),
        }
    }
}

/// Per-class summaries in order of first appearance.
#[must_use]
pub fn summarize_classes(results: &[TestResult]) -> Vec<ClassSummary> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&TestResult>> = HashMap::new();

    for result in results {
        let class = result.file_class();
        if !groups.contains_key(&class) {
            order.push(class.clone());
        }
        groups.entry(class).or_default().push(result);
    }

    order
        .into_iter()
        .map(|class| {
            let members = groups.remove(&class).unwrap_or_default();
            ClassSummary {
                summary: GroupSummary::compute(members),
                class,
            }
        })
        .collect()
}

mod chrono_serde {
    use chrono::{DateTime, Utc};
    use serde::{Serialize, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        dt.to_rfc3339().serialize(serializer)
    }
}
