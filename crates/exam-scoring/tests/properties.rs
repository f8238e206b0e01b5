//! Property tests for the scoring pipeline.
//!
//! - Answers containing every keyword have full coverage.
//! - Match percentage and score stay in range for arbitrary input.
//! - Combination is monotonic in both inputs.
//! - Analysis is deterministic.

use exam_scoring::{KeywordMatcher, Reference, ScoreCombiner, ScoringPolicy};
use proptest::prelude::*;

fn keyword_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Za-z]{1,12}", 1..8)
}

proptest! {
    #[test]
    fn prop_all_keywords_present_is_full_coverage(
        keywords in keyword_strategy(),
        filler in "[a-z ]{0,40}",
    ) {
        let answer = format!("{filler} {} {filler}", keywords.join(" "));
        let coverage = KeywordMatcher::coverage(&answer, &keywords);

        prop_assert_eq!(coverage.matched, keywords.len());
        prop_assert_eq!(coverage.percentage, 100.0);
    }

    #[test]
    fn prop_analysis_is_bounded(
        answer in ".{0,200}",
        content in ".{0,200}",
        keywords in prop::collection::vec(".{0,10}", 0..6),
        minimum in -50.0f64..150.0,
        max_points in 0u32..1000,
    ) {
        let reference = Reference::new(&content, &keywords);
        let a = ScoringPolicy::standard().analyze(&answer, &reference, minimum, max_points);

        prop_assert!((0.0..=100.0).contains(&a.match_percentage));
        prop_assert!((0.0..=100.0).contains(&a.content_similarity));
        prop_assert!(a.keywords_matched <= a.total_keywords);
        prop_assert!(a.score <= max_points);
    }

    #[test]
    fn prop_combine_monotonic_in_keywords(
        k1 in 0.0f64..=100.0,
        k2 in 0.0f64..=100.0,
        content in 0.0f64..=100.0,
        minimum in 0.0f64..=100.0,
    ) {
        let c = ScoreCombiner::standard();
        let (lo, hi) = if k1 <= k2 { (k1, k2) } else { (k2, k1) };

        prop_assert!(c.match_percentage(lo, content) <= c.match_percentage(hi, content));
        prop_assert!(
            c.combine(lo, content, minimum, 100).match_percentage
                <= c.combine(hi, content, minimum, 100).match_percentage
        );
    }

    #[test]
    fn prop_combine_monotonic_in_content(
        keyword in 0.0f64..=100.0,
        c1 in 0.0f64..=100.0,
        c2 in 0.0f64..=100.0,
    ) {
        let c = ScoreCombiner::standard();
        let (lo, hi) = if c1 <= c2 { (c1, c2) } else { (c2, c1) };

        prop_assert!(c.match_percentage(keyword, lo) <= c.match_percentage(keyword, hi));
    }

    #[test]
    fn prop_analysis_is_deterministic(
        answer in "[a-z ]{0,120}",
        content in "[a-z ]{0,120}",
        keywords in prop::collection::vec("[a-z]{1,8}", 0..5),
    ) {
        let policy = ScoringPolicy::standard();
        let reference = Reference::new(&content, &keywords);

        let first = policy.analyze(&answer, &reference, 60.0, 10);
        let second = policy.analyze(&answer, &reference, 60.0, 10);
        prop_assert_eq!(first, second);
    }
}

#[test]
fn concrete_scenarios() {
    let c = ScoreCombiner::standard();

    // below threshold: round(40 / 60 * 10 * 0.6) = 4
    assert_eq!(c.combine(40.0, 40.0, 60.0, 10).score, 4);
    // above threshold: round(80 / 100 * 10) = 8
    assert_eq!(c.combine(80.0, 80.0, 60.0, 10).score, 8);
}
