//! Encoding statistics reported by the codec under test.
//!
//! The codec prints one counter per chunk encoding it can emit. This module
//! provides:
//!
//! - [`EncodingKind`]: the closed set of chunk encodings
//! - [`EncodingStatistic`]: a counter per kind, merged by element-wise addition
//! - [`parse_encoding_statistic`]: extraction of the counters from encoder stdout
//! - [`mean`]: arithmetic mean that propagates NaN for empty input

mod parse;

pub use parse::{STATISTIC_MARKER, parse_encoding_statistic};

use std::ops::{Add, AddAssign, Index};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Per-block encoding strategy chosen by a QOI-style encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EncodingKind {
    /// Reference into the running color index.
    Index,
    /// Small per-channel difference to the previous pixel.
    Diff,
    /// Luma-based difference to the previous pixel.
    Luma,
    /// Run of the previous pixel.
    Run,
    /// Literal RGB pixel.
    Rgb,
    /// Literal RGBA pixel.
    Rgba,
}

impl EncodingKind {
    /// Number of kinds.
    pub const COUNT: usize = 6;

    /// All kinds in report order.
    pub const ALL: [Self; Self::COUNT] =
        [Self::Index, Self::Diff, Self::Luma, Self::Run, Self::Rgb, Self::Rgba];

    /// Name as printed by the codec.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Index => "INDEX",
            Self::Diff => "DIFF",
            Self::Luma => "LUMA",
            Self::Run => "RUN",
            Self::Rgb => "RGB",
            Self::Rgba => "RGBA",
        }
    }

    /// Exact (case-sensitive) lookup by codec name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    fn ordinal(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Count of blocks per [`EncodingKind`].
///
/// Every kind is always present; kinds the codec did not report are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodingStatistic {
    counts: [u64; EncodingKind::COUNT],
}

impl EncodingStatistic {
    /// All-zero statistic, the identity for [`merge`](Self::merge).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a statistic from `(kind, count)` pairs; later pairs overwrite earlier ones.
    #[must_use]
    pub fn from_counts(pairs: &[(EncodingKind, u64)]) -> Self {
        let mut stat = Self::new();
        for &(kind, count) in pairs {
            stat.set(kind, count);
        }
        stat
    }

    /// Count for a single kind.
    #[must_use]
    pub fn get(&self, kind: EncodingKind) -> u64 {
        self.counts[kind.ordinal()]
    }

    pub(crate) fn set(&mut self, kind: EncodingKind, count: u64) {
        self.counts[kind.ordinal()] = count;
    }

    /// Element-wise sum of two statistics, saturating at `u64::MAX`.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let mut counts = self.counts;
        for (dst, src) in counts.iter_mut().zip(other.counts) {
            *dst = dst.saturating_add(src);
        }
        Self { counts }
    }

    /// Total over all kinds, saturating at `u64::MAX`.
    #[must_use]
    pub fn sum(&self) -> u64 {
        self.counts.iter().fold(0, |acc, &n| acc.saturating_add(n))
    }

    /// Share of `kind` in percent of [`sum`](Self::sum).
    ///
    /// NaN when the statistic is all zero.
    #[must_use]
    pub fn percentage(&self, kind: EncodingKind) -> f64 {
        self.get(kind) as f64 / self.sum() as f64 * 100.0
    }

    /// Iterate `(kind, count)` in report order.
    pub fn iter(&self) -> impl Iterator<Item = (EncodingKind, u64)> + '_ {
        EncodingKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}

impl Index<EncodingKind> for EncodingStatistic {
    type Output = u64;

    fn index(&self, kind: EncodingKind) -> &u64 {
        &self.counts[kind.ordinal()]
    }
}

impl Add for EncodingStatistic {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.merge(&rhs)
    }
}

impl AddAssign for EncodingStatistic {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.merge(&rhs);
    }
}

impl std::iter::Sum for EncodingStatistic {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::new(), |acc, stat| acc + stat)
    }
}

impl<'a> std::iter::Sum<&'a EncodingStatistic> for EncodingStatistic {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Self::new(), |acc, stat| acc.merge(stat))
    }
}

// Serialized as a `{ "INDEX": n, ... }` map in report order.
impl Serialize for EncodingStatistic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(EncodingKind::COUNT))?;
        for (kind, count) in self.iter() {
            map.serialize_entry(kind.name(), &count)?;
        }
        map.end()
    }
}

/// Arithmetic mean.
///
/// Unlike a guarded mean this returns NaN for an empty slice, so an empty
/// group shows up as undefined in the report instead of a fake zero.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
