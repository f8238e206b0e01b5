//! Content similarity
//!
//! Coarse bag-of-words overlap: the share of significant reference tokens
//! that also appear, token-exact, somewhere in the answer. Not semantic
//! similarity; synonyms and paraphrases score zero.

use crate::scorer::{Measurement, Reference, TextScorer};
use crate::tokenizer::Tokenizer;
use std::collections::HashSet;

/// Token overlap estimator
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentSimilarity {
    tokenizer: Tokenizer,
}

impl ContentSimilarity {
    /// Create estimator with the default significance cutoff
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create estimator with a custom tokenizer
    #[inline]
    #[must_use]
    pub fn with_tokenizer(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Tokenizer used for both texts
    #[inline]
    #[must_use]
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Overlap counts of `answer` against `reference_text`
    #[must_use]
    pub fn overlap(&self, answer: &str, reference_text: &str) -> Measurement {
        let answer_tokens: HashSet<String> = self.tokenizer.tokens(answer).into_iter().collect();
        let significant = self.tokenizer.significant_tokens(reference_text);

        let word_matches = significant
            .iter()
            .filter(|t| answer_tokens.contains(t.as_str()))
            .count();

        Measurement::from_counts(word_matches, significant.len())
    }

    /// Similarity percentage of `answer` against `reference_text`
    #[inline]
    #[must_use]
    pub fn similarity(&self, answer: &str, reference_text: &str) -> f64 {
        self.overlap(answer, reference_text).percentage
    }
}

impl TextScorer for ContentSimilarity {
    fn measure(&self, answer: &str, reference: &Reference<'_>) -> Measurement {
        self.overlap(answer, reference.content)
    }

    fn name(&self) -> &'static str {
        "content_similarity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_is_full_overlap() {
        let s = ContentSimilarity::new();
        let text = "Ownership rules prevent data races";
        assert_eq!(s.similarity(text, text), 100.0);
    }

    #[test]
    fn short_reference_words_are_ignored() {
        let s = ContentSimilarity::new();
        let m = s.overlap("nothing shared", "a to of the");
        assert_eq!(m.total, 0);
        assert_eq!(m.percentage, 0.0);
    }

    #[test]
    fn duplicates_in_reference_count_each_time() {
        let s = ContentSimilarity::new();
        let m = s.overlap("cache", "cache cache miss");
        assert_eq!(m.total, 3);
        assert_eq!(m.matched, 2);
    }

    #[test]
    fn match_is_token_exact() {
        let s = ContentSimilarity::new();
        // "caching" does not match "cache"
        let m = s.overlap("caching layer", "cache layer");
        assert_eq!(m.matched, 1);
        assert!((m.percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn case_is_normalized() {
        let s = ContentSimilarity::new();
        assert_eq!(s.similarity("MUTEX", "mutex"), 100.0);
    }

    #[test]
    fn empty_answer_is_zero() {
        let s = ContentSimilarity::new();
        assert_eq!(s.similarity("", "a reference answer"), 0.0);
    }
}
