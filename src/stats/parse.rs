//! Parsing of the statistic block printed by the encoder.

use super::{EncodingKind, EncodingStatistic};

/// Line that opens the statistic block in the encoder's stdout.
pub const STATISTIC_MARKER: &str = "-- QOI Encoding Statistic --";

/// Extract per-kind counters from the encoder's captured stdout.
///
/// Parsing is best-effort:
/// - everything before the first [`STATISTIC_MARKER`] is ignored, and no
///   marker at all yields an all-zero statistic
/// - the first non-empty line that is not exactly `name = value` ends the block
/// - values that are not a non-negative integer count as zero
/// - unknown names are skipped
#[must_use]
pub fn parse_encoding_statistic(stdout: &str) -> EncodingStatistic {
    let mut stat = EncodingStatistic::new();

    let Some(start) = stdout.find(STATISTIC_MARKER) else {
        return stat;
    };

    let lines = stdout[start..]
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty());

    // Line 0 holds the marker itself.
    for line in lines.skip(1) {
        let Some((name, value)) = split_pair(line) else {
            break;
        };

        if let Some(kind) = EncodingKind::from_name(name) {
            stat.set(kind, value.parse().unwrap_or(0));
        }
    }

    stat
}

/// Split `name = value`, dropping blank segments around `=`.
fn split_pair(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split('=').map(str::trim).filter(|part| !part.is_empty());
    let name = parts.next()?;
    let value = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stops_at_malformed_line() {
        let out = "-- QOI Encoding Statistic --\nRUN = 120\nRGB = 45\ngarbage-line\nINDEX = 9\n";
        let stat = parse_encoding_statistic(out);
        assert_eq!(stat[EncodingKind::Run], 120);
        assert_eq!(stat[EncodingKind::Rgb], 45);
        assert_eq!(stat[EncodingKind::Index], 0);
        assert_eq!(stat.sum(), 165);
    }

    #[test]
    fn test_skips_preamble_and_crlf() {
        let out = "Encoding foo.bmp\r\nwidth=4\r\n-- QOI Encoding Statistic --\r\n\r\n  \
                   LUMA=  7 \r\nDIFF =2\r\n";
        let stat = parse_encoding_statistic(out);
        assert_eq!(stat[EncodingKind::Luma], 7);
        assert_eq!(stat[EncodingKind::Diff], 2);
        assert_eq!(stat.sum(), 9);
    }

    #[test]
    fn test_max_count_total_saturates() {
        let out = "-- QOI Encoding Statistic --\nRUN = 18446744073709551615\nRGB = 1\n";
        let stat = parse_encoding_statistic(out);
        assert_eq!(stat[EncodingKind::Run], u64::MAX);
        assert_eq!(stat.sum(), u64::MAX);
        assert_eq!((stat + stat)[EncodingKind::Rgb], 2);
    }

    #[test]
    fn test_missing_marker_is_all_zero() {
        let stat = parse_encoding_statistic("RUN = 5\n");
        assert_eq!(stat, EncodingStatistic::new());
    }

    #[test]
    fn test_malformed_values_are_zero() {
        let out = "-- QOI Encoding Statistic --\nRUN = abc\nRGB = -4\nINDEX = 12x\nLUMA = 3\n";
        let stat = parse_encoding_statistic(out);
        assert_eq!(stat[EncodingKind::Run], 0);
        assert_eq!(stat[EncodingKind::Rgb], 0);
        assert_eq!(stat[EncodingKind::Index], 0);
        assert_eq!(stat[EncodingKind::Luma], 3);
    }

    #[test]
    fn test_unknown_names_ignored() {
        let out = "-- QOI Encoding Statistic --\nALPHA = 10\nrun = 4\nRUN = 1\n";
        let stat = parse_encoding_statistic(out);
        assert_eq!(stat.sum(), 1);
        assert_eq!(stat[EncodingKind::Run], 1);
    }

    #[test]
    fn test_blank_segments_around_equals() {
        assert_eq!(split_pair("RUN = = 5"), Some(("RUN", "5")));
        assert_eq!(split_pair("RUN = 5 = 6"), None);
        assert_eq!(split_pair("RUN ="), None);
        assert_eq!(split_pair("= 5"), None);
    }

    #[test]
    fn test_later_line_overwrites() {
        let out = "-- QOI Encoding Statistic --\nRUN = 1\nRUN = 8\n";
        assert_eq!(parse_encoding_statistic(out)[EncodingKind::Run], 8);
    }
}
