//! Whitespace tokenizer
//!
//! Every scorer normalizes text through this module so that keyword and
//! content comparisons agree on what a "word" is.

/// Tokens shorter than this many characters are not significant.
///
/// Four characters means "longer than three", which filters most short
/// connectors ("the", "and", "of") without a stopword list.
pub const DEFAULT_SIGNIFICANT_LEN: usize = 4;

/// Split `text` on whitespace into lowercase tokens.
///
/// Order is preserved and duplicates are kept. Punctuation is not stripped.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Tokenizer with a configurable significance cutoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tokenizer {
    significant_len: usize,
}

impl Tokenizer {
    /// Create tokenizer with the default cutoff
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            significant_len: DEFAULT_SIGNIFICANT_LEN,
        }
    }

    /// With minimum significant token length (in characters)
    #[inline]
    #[must_use]
    pub fn with_significant_len(mut self, len: usize) -> Self {
        self.significant_len = len;
        self
    }

    /// Minimum significant token length
    #[inline]
    #[must_use]
    pub fn significant_len(&self) -> usize {
        self.significant_len
    }

    /// Tokenize text
    #[inline]
    #[must_use]
    pub fn tokens(&self, text: &str) -> Vec<String> {
        tokenize(text)
    }

    /// Check whether a token counts as significant
    #[inline]
    #[must_use]
    pub fn is_significant(&self, token: &str) -> bool {
        token.chars().count() >= self.significant_len
    }

    /// Tokenize and keep only significant tokens
    #[must_use]
    pub fn significant_tokens(&self, text: &str) -> Vec<String> {
        self.tokens(text)
            .into_iter()
            .filter(|t| self.is_significant(t))
            .collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}
