//! Property-based tests for segment splitting and comparison
//!
//! These use proptest to check the comparison contract across many generated outputs, including empty listings
//! and chatter before the first marker.

use hulldiff_core::{ComparisonPolicy, Point, compare, format_points, split_results};
use proptest::prelude::*;

/// A hull-like listing: a few `x,y` lines
fn listing_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec((-50i64..=50, -50i64..=50), 0..8).prop_map(|pts| {
        let points: Vec<Point> = pts.into_iter().map(|(x, y)| Point::new(x, y)).collect();
        format_points(&points)
    })
}

/// Program output made of `result` blocks, optionally preceded by chatter
fn output_strategy() -> impl Strategy<Value = (String, Vec<String>)> {
    (
        prop::option::of("[a-z ]{0,12}\n".prop_filter("chatter must not be a marker", |s| s != "result\n")),
        prop::collection::vec(listing_strategy(), 0..4),
    )
        .prop_map(|(preamble, listings)| {
            let mut text = preamble.unwrap_or_default();
            for listing in &listings {
                text.push_str("result\n");
                text.push_str(listing);
            }
            (text, listings)
        })
}

proptest! {
    /// Property: splitting recovers exactly the listings that were written after each marker
    #[test]
    fn split_recovers_listings((text, listings) in output_strategy()) {
        prop_assert_eq!(split_results(&text), listings);
    }

    /// Property: an output always matches itself, whatever the policy, when it has at most one result
    #[test]
    fn single_result_output_matches_itself(listing in listing_strategy()) {
        let segments = split_results(&format!("result\n{listing}"));
        for policy in [ComparisonPolicy::ReferenceFirst, ComparisonPolicy::Positional] {
            prop_assert!(compare(&segments, &segments, policy).is_match());
        }
    }

    /// Property: positional comparison of an output with itself always matches
    #[test]
    fn positional_is_reflexive((text, _) in output_strategy()) {
        let segments = split_results(&text);
        prop_assert!(compare(&segments, &segments, ComparisonPolicy::Positional).is_match());
    }

    /// Property: changing one candidate listing is always detected
    #[test]
    fn changed_listing_is_detected(listing in listing_strategy(), extra in (-50i64..=50, -50i64..=50)) {
        let reference = split_results(&format!("result\n{listing}"));
        let candidate = split_results(&format!("result\n{listing}{},{}\n", extra.0, extra.1));
        for policy in [ComparisonPolicy::ReferenceFirst, ComparisonPolicy::Positional] {
            prop_assert!(!compare(&candidate, &reference, policy).is_match());
        }
    }
}
