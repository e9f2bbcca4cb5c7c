use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse engine config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunable thresholds of the suggestion engine. The defaults are the values
/// the algorithm was calibrated with; none of them is a correctness
/// invariant, so they are all overridable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum number of transactions a pattern must cover to become a
    /// candidate (and for an account to be analyzed at all).
    pub min_occurrences: usize,
    /// Similarity score (0..=100) required for a fuzzy hit between an
    /// account label and a candidate n-gram.
    pub fuzzy_threshold: u32,
    /// Pairwise label similarity (0.0..=1.0) for transitive grouping.
    pub similarity_threshold: f64,
    /// Longest n-gram, in words, considered by candidate extraction.
    pub max_ngram_words: usize,
    /// Maximum number of suggested rules returned per account.
    pub suggestion_limit: usize,
    /// Shortest digit run treated as a loan contract number.
    pub min_loan_digits: usize,
    /// Share of identical amounts required to infer an `=` criterion.
    pub amount_dominance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_occurrences: 3,
            fuzzy_threshold: 80,
            similarity_threshold: 0.7,
            max_ngram_words: 5,
            suggestion_limit: 3,
            min_loan_digits: 6,
            amount_dominance: 0.95,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_calibration() {
        let config = EngineConfig::default();
        assert_eq!(config.min_occurrences, 3);
        assert_eq!(config.fuzzy_threshold, 80);
        assert_eq!(config.suggestion_limit, 3);
        assert_eq!(config.min_loan_digits, 6);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("min_occurrences = 5").unwrap();
        assert_eq!(config.min_occurrences, 5);
        assert_eq!(config.fuzzy_threshold, 80);
        assert_eq!(config.max_ngram_words, 5);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(EngineConfig::from_toml_str("min_occurrences = \"three\"").is_err());
    }
}
