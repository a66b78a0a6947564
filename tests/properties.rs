//! Property-based tests for encoding statistic merging and parsing.

use proptest::prelude::*;
use qoi_bench::{EncodingKind, EncodingStatistic, parse_encoding_statistic};

fn arb_statistic() -> impl Strategy<Value = EncodingStatistic> {
    prop::array::uniform6(0u64..1_000_000).prop_map(|counts| {
        let pairs: Vec<_> = EncodingKind::ALL.into_iter().zip(counts).collect();
        EncodingStatistic::from_counts(&pairs)
    })
}

proptest! {
    #[test]
    fn merge_is_commutative(a in arb_statistic(), b in arb_statistic()) {
        prop_assert_eq!(a.merge(&b), b.merge(&a));
    }

    #[test]
    fn merge_is_associative(a in arb_statistic(), b in arb_statistic(), c in arb_statistic()) {
        prop_assert_eq!(a.merge(&b).merge(&c), a.merge(&b.merge(&c)));
    }

    #[test]
    fn zero_is_identity(a in arb_statistic()) {
        prop_assert_eq!(a.merge(&EncodingStatistic::new()), a);
        prop_assert_eq!(EncodingStatistic::new().merge(&a), a);
    }

    #[test]
    fn merge_preserves_sum(a in arb_statistic(), b in arb_statistic()) {
        prop_assert_eq!(a.merge(&b).sum(), a.sum() + b.sum());
    }

    /// Printing a statistic in the codec's format and parsing it back is lossless.
    #[test]
    fn printed_statistic_parses_back(a in arb_statistic(), preamble in "[a-z ]{0,20}") {
        let mut out = format!("{preamble}\n-- QOI Encoding Statistic --\n");
        for (kind, count) in a.iter() {
            out.push_str(&format!("{kind} = {count}\n"));
        }
        prop_assert_eq!(parse_encoding_statistic(&out), a);
    }

    /// Parsing never panics on arbitrary text.
    #[test]
    fn parse_is_total(text in ".{0,200}") {
        let marked = format!("-- QOI Encoding Statistic --\n{text}");
        let _ = parse_encoding_statistic(&text);
        let _ = parse_encoding_statistic(&marked);
    }
}
