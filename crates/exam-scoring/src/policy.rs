//! Scoring policy
//!
//! A [`ScoringPolicy`] bundles the two scorers and the combiner. Orchestration
//! code only ever calls [`ScoringPolicy::analyze`], so swapping a scorer or the
//! weighting never touches the grading pipeline.

use crate::combiner::ScoreCombiner;
use crate::keywords::KeywordMatcher;
use crate::scorer::{Reference, TextScorer};
use crate::similarity::ContentSimilarity;
use crate::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Full breakdown of one analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Weighted match percentage
    pub match_percentage: f64,
    /// Keywords found in the answer
    pub keywords_matched: usize,
    /// Keywords required
    pub total_keywords: usize,
    /// Keyword coverage percentage
    pub keyword_percentage: f64,
    /// Content similarity percentage
    pub content_similarity: f64,
    /// Points awarded
    pub score: u32,
    /// Points available
    pub max_points: u32,
}

/// Keyword scorer, content scorer and combiner
#[derive(Debug, Clone)]
pub struct ScoringPolicy {
    keyword_scorer: Arc<dyn TextScorer>,
    content_scorer: Arc<dyn TextScorer>,
    combiner: ScoreCombiner,
}

impl ScoringPolicy {
    /// Substring keyword coverage, default tokenizer, standard weights
    #[must_use]
    pub fn standard() -> Self {
        Self::new(
            Arc::new(KeywordMatcher::new()),
            Arc::new(ContentSimilarity::new()),
            ScoreCombiner::standard(),
        )
    }

    /// Standard scorers with a custom tokenizer and combiner
    #[must_use]
    pub fn with_parameters(tokenizer: Tokenizer, combiner: ScoreCombiner) -> Self {
        Self::new(
            Arc::new(KeywordMatcher::new()),
            Arc::new(ContentSimilarity::with_tokenizer(tokenizer)),
            combiner,
        )
    }

    /// Create policy from parts
    #[inline]
    #[must_use]
    pub fn new(
        keyword_scorer: Arc<dyn TextScorer>,
        content_scorer: Arc<dyn TextScorer>,
        combiner: ScoreCombiner,
    ) -> Self {
        Self {
            keyword_scorer,
            content_scorer,
            combiner,
        }
    }

    /// Replace the keyword scorer
    #[inline]
    #[must_use]
    pub fn with_keyword_scorer(mut self, scorer: Arc<dyn TextScorer>) -> Self {
        self.keyword_scorer = scorer;
        self
    }

    /// Replace the content scorer
    #[inline]
    #[must_use]
    pub fn with_content_scorer(mut self, scorer: Arc<dyn TextScorer>) -> Self {
        self.content_scorer = scorer;
        self
    }

    /// Replace the combiner
    #[inline]
    #[must_use]
    pub fn with_combiner(mut self, combiner: ScoreCombiner) -> Self {
        self.combiner = combiner;
        self
    }

    /// Combiner in use
    #[inline]
    #[must_use]
    pub fn combiner(&self) -> &ScoreCombiner {
        &self.combiner
    }

    /// Scorer names, keyword first
    #[must_use]
    pub fn scorer_names(&self) -> (&'static str, &'static str) {
        (self.keyword_scorer.name(), self.content_scorer.name())
    }

    /// Analyze an answer
    #[must_use]
    pub fn analyze(
        &self,
        answer: &str,
        reference: &Reference<'_>,
        minimum_match_percentage: f64,
        max_points: u32,
    ) -> Analysis {
        let keywords = self.keyword_scorer.measure(answer, reference);
        let content = self.content_scorer.measure(answer, reference);
        let combined = self.combiner.combine(
            keywords.percentage,
            content.percentage,
            minimum_match_percentage,
            max_points,
        );

        Analysis {
            match_percentage: combined.match_percentage,
            keywords_matched: keywords.matched,
            total_keywords: keywords.total,
            keyword_percentage: keywords.percentage,
            content_similarity: content.percentage,
            score: combined.score,
            max_points,
        }
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::standard()
    }
}
