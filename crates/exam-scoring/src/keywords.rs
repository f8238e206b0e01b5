//! Keyword coverage
//!
//! A keyword counts as matched when it occurs, case-insensitively, as a
//! substring anywhere in the raw answer. Matching is deliberately not
//! token-exact: "microservices" satisfies "service", and punctuation glued to
//! a word does not hide it.

use crate::scorer::{Measurement, Reference, TextScorer};

/// Substring keyword matcher
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordMatcher;

impl KeywordMatcher {
    /// Create new matcher
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Coverage of `keywords` in `answer`
    #[must_use]
    pub fn coverage(answer: &str, keywords: &[String]) -> Measurement {
        let haystack = answer.to_lowercase();
        let matched = keywords
            .iter()
            .filter(|k| haystack.contains(&k.to_lowercase()))
            .count();

        Measurement::from_counts(matched, keywords.len())
    }
}

impl TextScorer for KeywordMatcher {
    fn measure(&self, answer: &str, reference: &Reference<'_>) -> Measurement {
        Self::coverage(answer, reference.keywords)
    }

    fn name(&self) -> &'static str {
        "keyword_coverage"
    }
}
