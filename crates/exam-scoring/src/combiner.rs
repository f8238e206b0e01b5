//! Score combination
//!
//! Blends keyword coverage and content similarity into one match percentage,
//! then maps it to points under a pass threshold. Below the threshold the
//! answer still earns a reduced, proportional score instead of zero.

use serde::{Deserialize, Serialize};

/// Outcome of combining two percentages
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Combined {
    /// Weighted match percentage in `[0, 100]`
    pub match_percentage: f64,
    /// Points in `[0, max_points]`
    pub score: u32,
}

/// Invalid combiner parameters
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CombinerError {
    /// A weight is negative or not finite
    #[error("weight must be a finite non-negative number, got {0}")]
    InvalidWeight(f64),

    /// Weights do not sum to 1
    #[error("weights must sum to 1.0, got {0}")]
    WeightsNotNormalized(f64),

    /// Penalty factor outside `[0, 1]`
    #[error("below-threshold factor must be within [0, 1], got {0}")]
    InvalidFactor(f64),
}

/// Weighted score combiner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreCombiner {
    keyword_weight: f64,
    content_weight: f64,
    below_threshold_factor: f64,
}

impl ScoreCombiner {
    /// Keyword coverage is trusted more than loose content overlap
    pub const STANDARD_KEYWORD_WEIGHT: f64 = 0.6;
    /// Weight of content similarity
    pub const STANDARD_CONTENT_WEIGHT: f64 = 0.4;
    /// Share of points kept below the threshold
    pub const STANDARD_BELOW_THRESHOLD_FACTOR: f64 = 0.6;

    /// Standard 60/40 weighting with a 60% below-threshold cap
    #[inline]
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            keyword_weight: Self::STANDARD_KEYWORD_WEIGHT,
            content_weight: Self::STANDARD_CONTENT_WEIGHT,
            below_threshold_factor: Self::STANDARD_BELOW_THRESHOLD_FACTOR,
        }
    }

    /// Create combiner with custom parameters
    ///
    /// # Errors
    /// - `CombinerError::InvalidWeight` for negative or non-finite weights
    /// - `CombinerError::WeightsNotNormalized` if weights don't sum to 1
    /// - `CombinerError::InvalidFactor` if the factor is outside `[0, 1]`
    pub fn new(
        keyword_weight: f64,
        content_weight: f64,
        below_threshold_factor: f64,
    ) -> Result<Self, CombinerError> {
        for w in [keyword_weight, content_weight] {
            if !w.is_finite() || w < 0.0 {
                return Err(CombinerError::InvalidWeight(w));
            }
        }

        let sum = keyword_weight + content_weight;
        if (sum - 1.0).abs() > 1e-9 {
            return Err(CombinerError::WeightsNotNormalized(sum));
        }

        if !(0.0..=1.0).contains(&below_threshold_factor) {
            return Err(CombinerError::InvalidFactor(below_threshold_factor));
        }

        Ok(Self {
            keyword_weight,
            content_weight,
            below_threshold_factor,
        })
    }

    /// Keyword weight
    #[inline]
    #[must_use]
    pub fn keyword_weight(&self) -> f64 {
        self.keyword_weight
    }

    /// Content weight
    #[inline]
    #[must_use]
    pub fn content_weight(&self) -> f64 {
        self.content_weight
    }

    /// Below-threshold factor
    #[inline]
    #[must_use]
    pub fn below_threshold_factor(&self) -> f64 {
        self.below_threshold_factor
    }

    /// Weighted match percentage
    #[must_use]
    pub fn match_percentage(&self, keyword_pct: f64, content_pct: f64) -> f64 {
        let blended = clamp_percentage(keyword_pct) * self.keyword_weight
            + clamp_percentage(content_pct) * self.content_weight;
        clamp_percentage(blended)
    }

    /// Combine percentages into a match percentage and a point score
    ///
    /// A threshold of 0 (or below) always counts as met.
    #[must_use]
    pub fn combine(
        &self,
        keyword_pct: f64,
        content_pct: f64,
        minimum_match_percentage: f64,
        max_points: u32,
    ) -> Combined {
        let match_percentage = self.match_percentage(keyword_pct, content_pct);
        let minimum = clamp_percentage(minimum_match_percentage);
        let max = f64::from(max_points);

        let raw = if minimum <= 0.0 || match_percentage >= minimum {
            match_percentage / 100.0 * max
        } else {
            match_percentage / minimum * max * self.below_threshold_factor
        };

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let score = raw.round().clamp(0.0, max) as u32;

        Combined {
            match_percentage,
            score,
        }
    }
}

impl Default for ScoreCombiner {
    fn default() -> Self {
        Self::standard()
    }
}

/// Clamp to `[0, 100]`, mapping NaN to 0
fn clamp_percentage(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_threshold_scenario() {
        // keyword 40, content 40 -> match 40
        let c = ScoreCombiner::standard().combine(40.0, 40.0, 60.0, 10);
        assert!((c.match_percentage - 40.0).abs() < 1e-9);
        assert_eq!(c.score, 4);
    }

    #[test]
    fn above_threshold_scenario() {
        let c = ScoreCombiner::standard().combine(80.0, 80.0, 60.0, 10);
        assert!((c.match_percentage - 80.0).abs() < 1e-9);
        assert_eq!(c.score, 8);
    }

    #[test]
    fn exact_threshold_uses_upper_branch() {
        let c = ScoreCombiner::standard().combine(60.0, 60.0, 60.0, 10);
        assert_eq!(c.score, 6);
    }

    #[test]
    fn weights_are_applied() {
        let c = ScoreCombiner::standard().combine(100.0, 0.0, 60.0, 10);
        assert!((c.match_percentage - 60.0).abs() < 1e-9);

        let c = ScoreCombiner::standard().combine(0.0, 100.0, 60.0, 10);
        assert!((c.match_percentage - 40.0).abs() < 1e-9);
    }

    #[test]
    fn zero_threshold_never_divides_by_zero() {
        let c = ScoreCombiner::standard().combine(10.0, 10.0, 0.0, 10);
        assert_eq!(c.score, 1);

        let c = ScoreCombiner::standard().combine(0.0, 0.0, 0.0, 10);
        assert_eq!(c.score, 0);
    }

    #[test]
    fn adversarial_inputs_are_clamped() {
        let c = ScoreCombiner::standard().combine(500.0, -20.0, 60.0, 10);
        assert!(c.match_percentage <= 100.0);
        assert!(c.score <= 10);

        let c = ScoreCombiner::standard().combine(f64::NAN, f64::NAN, f64::NAN, 10);
        assert_eq!(c.match_percentage, 0.0);
        assert_eq!(c.score, 0);
    }

    #[test]
    fn zero_max_points_is_zero_score() {
        let c = ScoreCombiner::standard().combine(100.0, 100.0, 60.0, 0);
        assert_eq!(c.score, 0);
    }

    #[test]
    fn custom_weights_validated() {
        assert!(ScoreCombiner::new(0.5, 0.5, 0.5).is_ok());
        assert_eq!(
            ScoreCombiner::new(0.7, 0.7, 0.6),
            Err(CombinerError::WeightsNotNormalized(1.4))
        );
        assert!(matches!(
            ScoreCombiner::new(-0.1, 1.1, 0.6),
            Err(CombinerError::InvalidWeight(_))
        ));
        assert!(matches!(
            ScoreCombiner::new(0.6, 0.4, 1.5),
            Err(CombinerError::InvalidFactor(_))
        ));
    }
}
