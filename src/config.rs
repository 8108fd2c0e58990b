//! Selector configuration: tier thresholds, candidate sizing, time budget.
//!
//! Constructed once per engine instance and injected immutably; nothing here
//! is shared mutable state between concurrent invocations. TOML keys map
//! 1:1 onto field names, and every field has a default so partial files work.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// Threshold for the conversation and pending tiers. Low on purpose: the
    /// scope itself is the primary relevance signal.
    #[serde(default = "default_conversation_threshold")]
    pub conversation_threshold: f32,
    /// Unscoped sweep, tried strict to loose; the first value with a
    /// non-empty result wins.
    #[serde(default = "default_recent_sweep")]
    pub recent_sweep: Vec<f32>,
    /// Last non-emergency resort, more permissive than the loosest sweep step.
    #[serde(default = "default_global_threshold")]
    pub global_threshold: f32,
    /// Floor for the guaranteed-context pass.
    #[serde(default = "default_emergency_threshold")]
    pub emergency_threshold: f32,
    /// Single threshold for tag-addressed retrieval.
    #[serde(default = "default_collection_threshold")]
    pub collection_threshold: f32,
    /// Candidate fetch size per index call is
    /// `max(candidate_floor, limit * candidate_multiplier)`, leaving room for
    /// client-side filtering and dedup.
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,
    #[serde(default = "default_candidate_floor")]
    pub candidate_floor: usize,
    /// Budget for the whole multi-tier search; exceeded budgets return the
    /// partial report assembled so far.
    #[serde(default = "default_time_budget_ms")]
    pub time_budget_ms: u64,
}

fn default_conversation_threshold() -> f32 {
    0.25
}
fn default_recent_sweep() -> Vec<f32> {
    vec![0.70, 0.60, 0.50]
}
fn default_global_threshold() -> f32 {
    0.45
}
fn default_emergency_threshold() -> f32 {
    0.10
}
fn default_collection_threshold() -> f32 {
    0.20
}
fn default_candidate_multiplier() -> usize {
    4
}
fn default_candidate_floor() -> usize {
    32
}
fn default_time_budget_ms() -> u64 {
    1500
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            conversation_threshold: default_conversation_threshold(),
            recent_sweep: default_recent_sweep(),
            global_threshold: default_global_threshold(),
            emergency_threshold: default_emergency_threshold(),
            collection_threshold: default_collection_threshold(),
            candidate_multiplier: default_candidate_multiplier(),
            candidate_floor: default_candidate_floor(),
            time_budget_ms: default_time_budget_ms(),
        }
    }
}

impl SelectorConfig {
    /// Parse a config from a TOML string.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("Failed to parse selector config")?;
        Ok(config)
    }

    /// Load a config file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }

    /// Candidate fetch size for a given result limit.
    pub fn candidate_limit(&self, result_limit: usize) -> usize {
        self.candidate_floor
            .max(result_limit.saturating_mul(self.candidate_multiplier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SelectorConfig::default();
        assert!((config.conversation_threshold - 0.25).abs() < 1e-6);
        assert_eq!(config.recent_sweep, vec![0.70, 0.60, 0.50]);
        assert!((config.global_threshold - 0.45).abs() < 1e-6);
        assert!((config.emergency_threshold - 0.10).abs() < 1e-6);
        assert!((config.collection_threshold - 0.20).abs() < 1e-6);
        assert_eq!(config.time_budget_ms, 1500);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = SelectorConfig::from_toml_str(
            r#"
global_threshold = 0.5
recent_sweep = [0.8, 0.6]
time_budget_ms = 250
"#,
        )
        .unwrap();
        assert!((config.global_threshold - 0.5).abs() < 1e-6);
        assert_eq!(config.recent_sweep, vec![0.8, 0.6]);
        assert_eq!(config.time_budget_ms, 250);
        // Untouched fields keep their defaults.
        assert!((config.conversation_threshold - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config = SelectorConfig::from_toml_str("").unwrap();
        assert_eq!(config.candidate_floor, 32);
        assert_eq!(config.candidate_multiplier, 4);
    }

    #[test]
    fn test_invalid_toml_errors() {
        assert!(SelectorConfig::from_toml_str("global_threshold = \"high\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"emergency_threshold = 0.05\n").unwrap();
        let config = SelectorConfig::load(file.path()).unwrap();
        assert!((config.emergency_threshold - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let err = SelectorConfig::load(Path::new("/nonexistent/selector.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_candidate_limit_floor_and_multiplier() {
        let config = SelectorConfig::default();
        assert_eq!(config.candidate_limit(4), 32); // floor wins
        assert_eq!(config.candidate_limit(20), 80); // multiplier wins
    }
}
