//! Grading configuration
//!
//! Defaults reproduce the standard scoring rules: 60/40 keyword/content
//! weighting, 60% below-threshold cap, tokens longer than three characters
//! are significant, 60% default pass threshold.

use crate::error::{ConfigError, ValidationError};
use exam_scoring::{ScoreCombiner, ScoringPolicy, Tokenizer, DEFAULT_SIGNIFICANT_LEN};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Grading service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingConfig {
    /// Bound on keyed-lock acquisition, in milliseconds
    pub lock_timeout_ms: u64,
    /// Bound on every store call, in milliseconds
    pub store_timeout_ms: u64,
    /// Maximum cached templates
    pub template_cache_capacity: u64,
    /// Template cache TTL, in seconds
    pub template_cache_ttl_secs: u64,
    /// Scoring parameters
    pub scoring: ScoringConfig,
}

impl GradingConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With lock timeout
    #[inline]
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout_ms = duration_ms(timeout);
        self
    }

    /// With store call timeout
    #[inline]
    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout_ms = duration_ms(timeout);
        self
    }

    /// With template cache sizing
    #[inline]
    #[must_use]
    pub fn with_template_cache(mut self, capacity: u64, ttl: Duration) -> Self {
        self.template_cache_capacity = capacity;
        self.template_cache_ttl_secs = ttl.as_secs();
        self
    }

    /// With scoring parameters
    #[inline]
    #[must_use]
    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    /// Lock timeout
    #[inline]
    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Store call timeout
    #[inline]
    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Template cache TTL
    #[inline]
    #[must_use]
    pub fn template_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.template_cache_ttl_secs)
    }

    /// Check ranges
    ///
    /// # Errors
    /// - `ValidationError::InvalidScoring` for zero timeouts or bad scoring values
    /// - `ValidationError::ThresholdOutOfRange` for a bad default threshold
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.lock_timeout_ms == 0 || self.store_timeout_ms == 0 {
            return Err(ValidationError::InvalidScoring(
                "timeouts must be positive".to_string(),
            ));
        }
        self.scoring.validate()
    }

    /// Parse and validate TOML
    ///
    /// Missing keys take their defaults.
    ///
    /// # Errors
    /// - `ConfigError::Parse` for malformed TOML
    /// - `ConfigError::Invalid` for out-of-range values
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// - `ConfigError::Serialize` if serialization fails
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 5_000,
            store_timeout_ms: 2_000,
            template_cache_capacity: 1_024,
            template_cache_ttl_secs: 300,
            scoring: ScoringConfig::default(),
        }
    }
}

/// Scoring parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight of keyword coverage
    pub keyword_weight: f64,
    /// Weight of content similarity
    pub content_weight: f64,
    /// Share of points kept below the pass threshold
    pub below_threshold_factor: f64,
    /// Minimum length of a significant reference token
    pub significant_token_min_len: usize,
    /// Threshold applied when a template doesn't set one
    pub default_minimum_match_percentage: f64,
}

impl ScoringConfig {
    /// Check ranges
    ///
    /// # Errors
    /// - `ValidationError::InvalidScoring` for bad weights or factor
    /// - `ValidationError::ThresholdOutOfRange` for a bad default threshold
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.combiner()?;
        if !(0.0..=100.0).contains(&self.default_minimum_match_percentage) {
            return Err(ValidationError::ThresholdOutOfRange(
                self.default_minimum_match_percentage,
            ));
        }
        Ok(())
    }

    /// Combiner for these weights
    ///
    /// # Errors
    /// - `ValidationError::InvalidScoring` if the combiner rejects the values
    pub fn combiner(&self) -> Result<ScoreCombiner, ValidationError> {
        Ok(ScoreCombiner::new(
            self.keyword_weight,
            self.content_weight,
            self.below_threshold_factor,
        )?)
    }

    /// Scoring policy for these parameters
    ///
    /// # Errors
    /// - `ValidationError::InvalidScoring` if the combiner rejects the values
    pub fn policy(&self) -> Result<ScoringPolicy, ValidationError> {
        let tokenizer = Tokenizer::new().with_significant_len(self.significant_token_min_len);
        Ok(ScoringPolicy::with_parameters(tokenizer, self.combiner()?))
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            keyword_weight: ScoreCombiner::STANDARD_KEYWORD_WEIGHT,
            content_weight: ScoreCombiner::STANDARD_CONTENT_WEIGHT,
            below_threshold_factor: ScoreCombiner::STANDARD_BELOW_THRESHOLD_FACTOR,
            significant_token_min_len: DEFAULT_SIGNIFICANT_LEN,
            default_minimum_match_percentage: 60.0,
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
