//! Tuned thresholds and limits for the extraction pipeline.
//!
//! Every constant here was calibrated against a corpus of real inspection
//! reports. Behavioral tests are pinned to these exact values.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Limits applied while building a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Maximum issues kept per report (discovery order).
    pub max_issues: usize,
    /// Descriptions must be strictly longer than this many characters.
    pub min_description_len: usize,
    /// Maximum classification indicators kept.
    pub max_indicators: usize,
    /// Maximum priority actions derived from critical/high issues.
    pub max_priority_actions: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_issues: 25,
            min_description_len: 10,
            max_indicators: 10,
            max_priority_actions: 5,
        }
    }
}

/// Default cost per severity tier when a report states no amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueCostDefaults {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
    /// Used when a structured tuple carries an unrecognized severity label.
    pub fallback: f64,
}

impl Default for IssueCostDefaults {
    fn default() -> Self {
        Self {
            critical: 5000.0,
            high: 2500.0,
            medium: 1200.0,
            low: 500.0,
            fallback: 1000.0,
        }
    }
}

/// Inspection-type classifier weights.
///
/// `max_score` is an empirical normalizer, not the analytic maximum of the
/// weight table. Confidence is `score / max_score`, a heuristic rather than a
/// probability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub storm_weight: f64,
    pub annual_weight: f64,
    pub due_diligence_weight: f64,
    pub survey_weight: f64,
    /// A hit in the report-type label counts this many times the base weight.
    pub label_multiplier: f64,
    /// Fraction of the base weight added per repeated body hit.
    pub repeat_fraction: f64,
    /// Repeated body hits counted beyond the first.
    pub max_repetitions: usize,
    /// Winning score must reach this value.
    pub min_score: f64,
    pub max_score: f64,
    /// Added to confidence per contextual clue.
    pub context_bonus: f64,
    /// Confidence floor for the report-type label fallback.
    pub label_fallback_confidence: f64,
    /// Confidence given when emergency language biases an unknown report to storm.
    pub emergency_storm_confidence: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            storm_weight: 6.0,
            annual_weight: 5.0,
            due_diligence_weight: 6.0,
            survey_weight: 5.0,
            label_multiplier: 2.0,
            repeat_fraction: 0.5,
            max_repetitions: 3,
            min_score: 15.0,
            max_score: 30.0,
            context_bonus: 0.05,
            label_fallback_confidence: 0.6,
            emergency_storm_confidence: 0.4,
        }
    }
}

/// Confidence values and cut-offs for each resolver tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverThresholds {
    pub exact_confidence: f64,
    pub address_confidence: f64,
    /// Minimum similarity for the fuzzy tier of a best match.
    pub fuzzy_min: f64,
    /// Minimum similarity for shortlist candidates.
    pub shortlist_min: f64,
    /// Minimum token-overlap ratio for the partial tier.
    pub partial_min: f64,
    /// Tokens shorter than this are ignored by the partial tier.
    pub min_token_len: usize,
    /// Candidates offered when no best match clears its tier.
    pub shortlist_limit: usize,
}

impl Default for ResolverThresholds {
    fn default() -> Self {
        Self {
            exact_confidence: 1.0,
            address_confidence: 0.9,
            fuzzy_min: 0.7,
            shortlist_min: 0.3,
            partial_min: 0.6,
            min_token_len: 3,
            shortlist_limit: 5,
        }
    }
}

/// Top-level Roofscan configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoofscanConfig {
    pub extraction: ExtractionConfig,
    pub costs: IssueCostDefaults,
    pub classifier: ClassifierConfig,
    pub resolver: ResolverThresholds,
    /// Worker threads for batch processing (0 = one per core).
    pub workers: usize,
}

impl Default for RoofscanConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            costs: IssueCostDefaults::default(),
            classifier: ClassifierConfig::default(),
            resolver: ResolverThresholds::default(),
            workers: 0,
        }
    }
}

impl RoofscanConfig {
    /// Create configuration from environment and defaults. Overrides that
    /// fail validation are dropped in favor of the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        match config.validate() {
            Ok(()) => config,
            Err(e) => {
                tracing::warn!("Ignoring environment overrides: {}", e);
                Self::default()
            }
        }
    }

    /// Load a JSON configuration file. Absent keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(max) = env_usize("ROOFSCAN_MAX_ISSUES") {
            self.extraction.max_issues = max;
        }
        if let Some(workers) = env_usize("ROOFSCAN_WORKERS") {
            self.workers = workers;
        }
    }

    /// Reject values that would break report invariants.
    pub fn validate(&self) -> Result<()> {
        if self.extraction.max_issues == 0 {
            return Err(Error::Config("extraction.max_issues must be positive".into()));
        }
        if self.classifier.max_score <= 0.0 {
            return Err(Error::Config("classifier.max_score must be positive".into()));
        }
        let r = &self.resolver;
        for (name, value) in [
            ("exact_confidence", r.exact_confidence),
            ("address_confidence", r.address_confidence),
            ("fuzzy_min", r.fuzzy_min),
            ("shortlist_min", r.shortlist_min),
            ("partial_min", r.partial_min),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("resolver.{} must be within [0, 1]", name)));
            }
        }
        Ok(())
    }
}

fn env_usize(key: &str) -> Option<usize> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a non-negative integer", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_calibrated_values() {
        let config = RoofscanConfig::default();
        assert_eq!(config.extraction.max_issues, 25);
        assert_eq!(config.classifier.min_score, 15.0);
        assert_eq!(config.classifier.max_score, 30.0);
        assert_eq!(config.resolver.fuzzy_min, 0.7);
        assert_eq!(config.resolver.partial_min, 0.6);
        assert_eq!(config.resolver.shortlist_min, 0.3);
        assert_eq!(config.costs.critical, 5000.0);
        assert_eq!(config.costs.fallback, 1000.0);
    }

    #[test]
    fn test_from_file_partial_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roofscan.json");
        std::fs::write(&path, r#"{"extraction": {"max_issues": 10}, "workers": 4}"#).unwrap();

        let config = RoofscanConfig::from_file(&path).unwrap();
        assert_eq!(config.extraction.max_issues, 10);
        assert_eq!(config.extraction.min_description_len, 10);
        assert_eq!(config.workers, 4);
        assert_eq!(config.resolver.address_confidence, 0.9);
    }

    #[test]
    fn test_from_file_rejects_out_of_range_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roofscan.json");
        std::fs::write(&path, r#"{"resolver": {"fuzzy_min": 1.5}}"#).unwrap();

        assert!(matches!(RoofscanConfig::from_file(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_env_rejects_zero_issue_cap() {
        std::env::set_var("ROOFSCAN_MAX_ISSUES", "0");
        let config = RoofscanConfig::from_env();
        std::env::remove_var("ROOFSCAN_MAX_ISSUES");

        assert_eq!(config.extraction.max_issues, 25);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = RoofscanConfig::from_file(dir.path().join("absent.json"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
