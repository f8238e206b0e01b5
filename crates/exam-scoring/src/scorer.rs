//! Text scorer strategy trait
//!
//! Provides the [`TextScorer`] trait so keyword and content measurements can be
//! replaced per [`ScoringPolicy`](crate::ScoringPolicy) without touching the
//! grading orchestration.

use serde::{Deserialize, Serialize};

/// Reference material an answer is measured against
#[derive(Debug, Clone, Copy)]
pub struct Reference<'a> {
    /// Reference answer text
    pub content: &'a str,
    /// Required keywords
    pub keywords: &'a [String],
}

impl<'a> Reference<'a> {
    /// Create new reference
    #[inline]
    #[must_use]
    pub fn new(content: &'a str, keywords: &'a [String]) -> Self {
        Self { content, keywords }
    }
}

/// Result of a single measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Units found in the answer
    pub matched: usize,
    /// Units considered
    pub total: usize,
    /// `matched / total * 100`, or 0 when nothing was considered
    pub percentage: f64,
}

impl Measurement {
    /// Build a measurement from counts
    #[must_use]
    pub fn from_counts(matched: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let ratio = matched as f64 / total as f64;
            (ratio * 100.0).clamp(0.0, 100.0)
        };

        Self {
            matched: matched.min(total),
            total,
            percentage,
        }
    }

    /// Empty measurement (0 of 0)
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::from_counts(0, 0)
    }
}

/// Measures an answer against a reference
///
/// Implementations must be pure: the same inputs always give the same
/// measurement, and no input is an error.
pub trait TextScorer: Send + Sync + std::fmt::Debug {
    /// Measure `answer` against `reference`
    fn measure(&self, answer: &str, reference: &Reference<'_>) -> Measurement;

    /// Scorer name (for logging/registry)
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_counts_computes_percentage() {
        let m = Measurement::from_counts(1, 4);
        assert_eq!(m.matched, 1);
        assert_eq!(m.total, 4);
        assert!((m.percentage - 25.0).abs() < 1e-9);
    }

    #[test]
    fn zero_total_is_zero_percent() {
        let m = Measurement::empty();
        assert_eq!(m.percentage, 0.0);
    }

    #[test]
    fn matched_never_exceeds_total() {
        let m = Measurement::from_counts(5, 3);
        assert_eq!(m.matched, 3);
        assert_eq!(m.percentage, 100.0);
    }
}
