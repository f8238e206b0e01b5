//! Policy registry
//!
//! Provides [`PolicyRegistry`] for selecting a scoring policy by name, e.g. to
//! A/B test an alternative weighting against the standard one.

use crate::policy::ScoringPolicy;
use std::collections::HashMap;

/// Name of the policy registered by [`PolicyRegistry::with_defaults`]
pub const STANDARD_POLICY: &str = "standard";

/// Registry of named scoring policies
#[derive(Debug, Default, Clone)]
pub struct PolicyRegistry {
    policies: HashMap<String, ScoringPolicy>,
}

impl PolicyRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            policies: HashMap::new(),
        }
    }

    /// Create registry with the standard policy
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(STANDARD_POLICY, ScoringPolicy::standard());
        registry
    }

    /// Register (or replace) a policy
    pub fn register(&mut self, name: &str, policy: ScoringPolicy) {
        self.policies.insert(name.to_string(), policy);
    }

    /// Look up a policy
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ScoringPolicy> {
        self.policies.get(name)
    }

    /// Check if policy exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(name)
    }

    /// Remove policy
    #[inline]
    pub fn remove(&mut self, name: &str) -> bool {
        self.policies.remove(name).is_some()
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.policies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered policies
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
