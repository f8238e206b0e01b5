//! Exam essay scoring
//!
//! Deterministic, side-effect free scoring of free-text answers against a
//! reference answer and a keyword set.
//!
//! # Core Concepts
//!
//! - [`tokenize`]: whitespace tokenizer shared by every scorer
//! - [`KeywordMatcher`]: substring coverage of required keywords
//! - [`ContentSimilarity`]: bag-of-words overlap with the reference content
//! - [`ScoreCombiner`]: weighted match percentage and thresholded point score
//! - [`TextScorer`]: strategy trait so scorers can be swapped per policy
//! - [`ScoringPolicy`] / [`PolicyRegistry`]: named, swappable scoring setups
//!
//! Nothing in this crate fails on user input: empty answers, empty keyword
//! sets and empty references all degrade to 0%.
//!
//! # Example
//!
//! ```rust
//! use exam_scoring::{Reference, ScoringPolicy};
//!
//! let keywords = vec!["REST".to_string(), "idempotent".to_string()];
//! let reference = Reference::new("Idempotent REST endpoints are safe to retry", &keywords);
//!
//! let analysis = ScoringPolicy::standard().analyze(
//!     "REST APIs should be idempotent for safety.",
//!     &reference,
//!     60.0,
//!     10,
//! );
//! assert_eq!(analysis.keywords_matched, 2);
//! assert!(analysis.score <= 10);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod combiner;
mod keywords;
mod policy;
mod registry;
mod scorer;
mod similarity;
mod tokenizer;

pub use combiner::{Combined, CombinerError, ScoreCombiner};
pub use keywords::KeywordMatcher;
pub use policy::{Analysis, ScoringPolicy};
pub use registry::{PolicyRegistry, STANDARD_POLICY};
pub use scorer::{Measurement, Reference, TextScorer};
pub use similarity::ContentSimilarity;
pub use tokenizer::{tokenize, Tokenizer, DEFAULT_SIGNIFICANT_LEN};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn full_coverage_and_overlap_reaches_max_points() {
        let kw = keywords(&["ownership", "borrowing"]);
        let reference = Reference::new("ownership borrowing lifetimes", &kw);

        let analysis = ScoringPolicy::standard().analyze(
            "Rust relies on ownership, borrowing and lifetimes",
            &reference,
            60.0,
            10,
        );

        assert_eq!(analysis.keywords_matched, 2);
        assert_eq!(analysis.total_keywords, 2);
        // "ownership," keeps its comma, so only two reference tokens overlap
        assert!(analysis.content_similarity > 0.0);
        assert!(analysis.match_percentage >= 60.0);
        assert!(analysis.score >= 6);
    }

    #[test]
    fn empty_everything_scores_zero() {
        let kw: Vec<String> = Vec::new();
        let reference = Reference::new("", &kw);

        let analysis = ScoringPolicy::standard().analyze("", &reference, 60.0, 10);

        assert_eq!(analysis.match_percentage, 0.0);
        assert_eq!(analysis.content_similarity, 0.0);
        assert_eq!(analysis.score, 0);
    }

    #[test]
    fn registry_serves_standard_policy() {
        let registry = PolicyRegistry::with_defaults();
        let policy = registry.get("standard").unwrap();
        assert_eq!(policy.combiner(), &ScoreCombiner::standard());
    }
}
