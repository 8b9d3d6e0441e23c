//! Pipeline Configuration
//!
//! Every tunable of the detection/response pipeline, with deployment presets
//! and an `IMMUNE_*` environment overlay. Loaded once at startup; invalid
//! settings are fatal there and never surface per event.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{PipelineError, PipelineResult};

// ============================================================================
// PIPELINE CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    // --- detection ---
    pub detector_population_size: usize,
    pub detector_sample_size: usize,
    pub detector_quorum_fraction: f64,
    pub per_scorer_threshold: f64,
    pub scorer_trials: u32,
    pub detector_timeout_ms: u64,

    // --- review ---
    pub reviewer_population_size: usize,
    pub reviewer_sample_size: usize,
    pub confidence_gate: f64,
    pub max_severity_multiplier: f64,
    pub moderation_score_ceiling: f64,
    pub max_action_duration_secs: u64,
    pub temporary_restriction_secs: u64,
    pub appeal_window_secs: u64,
    pub reviewer_timeout_ms: u64,

    // --- memory ---
    pub fuzzy_similarity_threshold: f64,
    pub memory_shards: usize,
    pub store_write_retries: u32,

    // --- response ---
    pub commitment_delay_seconds: u64,
    pub commitment_chain_depth: u32,
    pub executor_timeout_ms: u64,

    /// Outcomes kept in the orchestrator history
    pub history_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detector_population_size: DEFAULT_DETECTOR_POPULATION,
            detector_sample_size: DEFAULT_DETECTOR_SAMPLE,
            detector_quorum_fraction: DEFAULT_QUORUM_FRACTION,
            per_scorer_threshold: DEFAULT_SCORER_THRESHOLD,
            scorer_trials: DEFAULT_SCORER_TRIALS,
            detector_timeout_ms: DEFAULT_STAGE_TIMEOUT_MS,

            reviewer_population_size: DEFAULT_REVIEWER_POPULATION,
            reviewer_sample_size: DEFAULT_REVIEWER_SAMPLE,
            confidence_gate: DEFAULT_CONFIDENCE_GATE,
            max_severity_multiplier: DEFAULT_MAX_SEVERITY_MULTIPLIER,
            moderation_score_ceiling: DEFAULT_MODERATION_SCORE_CEILING,
            max_action_duration_secs: DEFAULT_MAX_ACTION_DURATION_SECS,
            temporary_restriction_secs: DEFAULT_TEMPORARY_RESTRICTION_SECS,
            appeal_window_secs: DEFAULT_APPEAL_WINDOW_SECS,
            reviewer_timeout_ms: DEFAULT_STAGE_TIMEOUT_MS,

            fuzzy_similarity_threshold: DEFAULT_FUZZY_THRESHOLD,
            memory_shards: DEFAULT_MEMORY_SHARDS,
            store_write_retries: DEFAULT_STORE_WRITE_RETRIES,

            commitment_delay_seconds: DEFAULT_COMMITMENT_DELAY_SECS,
            commitment_chain_depth: DEFAULT_COMMITMENT_CHAIN_DEPTH,
            executor_timeout_ms: DEFAULT_STAGE_TIMEOUT_MS,

            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl PipelineConfig {
    // ------------------------------------------------------------------------
    // Presets
    // ------------------------------------------------------------------------

    /// Local development - small populations, lower scorer threshold
    pub fn development() -> Self {
        Self {
            detector_population_size: 20,
            reviewer_population_size: 3,
            per_scorer_threshold: 0.7,
            ..Default::default()
        }
    }

    pub fn testnet() -> Self {
        Self {
            detector_population_size: 100,
            reviewer_population_size: 10,
            per_scorer_threshold: 0.75,
            ..Default::default()
        }
    }

    /// Production - large populations, stricter thresholds
    pub fn mainnet() -> Self {
        Self {
            detector_population_size: 1000,
            reviewer_population_size: 50,
            per_scorer_threshold: 0.8,
            confidence_gate: 0.95,
            ..Default::default()
        }
    }

    /// High-value networks - extreme confidence and a higher consensus bar
    pub fn high_security() -> Self {
        Self {
            detector_population_size: 2000,
            per_scorer_threshold: 0.85,
            confidence_gate: 0.98,
            detector_quorum_fraction: 0.75,
            ..Self::mainnet()
        }
    }

    /// Low-risk networks - 1h action cap, 24h appeal window
    pub fn permissive() -> Self {
        Self {
            detector_population_size: 500,
            per_scorer_threshold: 0.65,
            confidence_gate: 0.85,
            max_action_duration_secs: 3600,
            appeal_window_secs: 86_400,
            ..Default::default()
        }
    }

    /// Resolve a profile name (with aliases); unknown names fall back to development
    pub fn for_environment(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "testnet" | "test" => Self::testnet(),
            "mainnet" | "production" | "prod" => Self::mainnet(),
            "high_security" | "defi" => Self::high_security(),
            "permissive" | "accessible" => Self::permissive(),
            _ => Self::development(),
        }
    }

    // ------------------------------------------------------------------------
    // Sources
    // ------------------------------------------------------------------------

    /// Profile from `IMMUNE_ENVIRONMENT`, then individual `IMMUNE_*` overrides
    pub fn from_env() -> PipelineResult<Self> {
        let base = Self::for_environment(&get_environment());
        let config = Self {
            detector_population_size: env_or("DETECTOR_POPULATION_SIZE", base.detector_population_size),
            detector_sample_size: env_or("DETECTOR_SAMPLE_SIZE", base.detector_sample_size),
            detector_quorum_fraction: env_or("DETECTOR_QUORUM_FRACTION", base.detector_quorum_fraction),
            per_scorer_threshold: env_or("PER_SCORER_THRESHOLD", base.per_scorer_threshold),
            scorer_trials: env_or("SCORER_TRIALS", base.scorer_trials),
            detector_timeout_ms: env_or("DETECTOR_TIMEOUT_MS", base.detector_timeout_ms),
            reviewer_population_size: env_or("REVIEWER_POPULATION_SIZE", base.reviewer_population_size),
            reviewer_sample_size: env_or("REVIEWER_SAMPLE_SIZE", base.reviewer_sample_size),
            confidence_gate: env_or("CONFIDENCE_GATE", base.confidence_gate),
            reviewer_timeout_ms: env_or("REVIEWER_TIMEOUT_MS", base.reviewer_timeout_ms),
            fuzzy_similarity_threshold: env_or("FUZZY_SIMILARITY_THRESHOLD", base.fuzzy_similarity_threshold),
            memory_shards: env_or("MEMORY_SHARDS", base.memory_shards),
            commitment_delay_seconds: env_or("COMMITMENT_DELAY_SECONDS", base.commitment_delay_seconds),
            executor_timeout_ms: env_or("EXECUTOR_TIMEOUT_MS", base.executor_timeout_ms),
            ..base
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file; missing fields take defaults
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let data = std::fs::read(path).map_err(|e| {
            PipelineError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_slice(&data)
            .map_err(|e| PipelineError::Configuration(format!("invalid config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    // ------------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------------

    /// Check consistency; all problems are reported together
    pub fn validate(&self) -> PipelineResult<()> {
        let mut errors = Vec::new();

        if self.detector_population_size == 0 {
            errors.push("detector_population_size must be at least 1".to_string());
        }
        if self.detector_sample_size == 0 {
            errors.push("detector_sample_size must be at least 1".to_string());
        }
        if !(self.detector_quorum_fraction > 0.0 && self.detector_quorum_fraction <= 1.0) {
            errors.push("detector_quorum_fraction must be in (0, 1]".to_string());
        }
        if self.scorer_trials == 0 {
            errors.push("scorer_trials must be at least 1".to_string());
        }
        if self.reviewer_population_size == 0 {
            errors.push("reviewer_population_size must be at least 1".to_string());
        }
        if self.reviewer_sample_size == 0 {
            errors.push("reviewer_sample_size must be at least 1".to_string());
        }
        if self.memory_shards == 0 {
            errors.push("memory_shards must be at least 1".to_string());
        }
        if self.max_severity_multiplier <= 0.0 {
            errors.push("max_severity_multiplier must be positive".to_string());
        }

        if self.commitment_delay_seconds > MAX_COMMITMENT_DELAY_SECS {
            errors.push(format!(
                "commitment_delay_seconds must be at most {}",
                MAX_COMMITMENT_DELAY_SECS
            ));
        }

        for (name, value) in [
            ("detector_timeout_ms", self.detector_timeout_ms),
            ("reviewer_timeout_ms", self.reviewer_timeout_ms),
            ("executor_timeout_ms", self.executor_timeout_ms),
        ] {
            if value == 0 || value > MAX_STAGE_TIMEOUT_MS {
                errors.push(format!("{} must be between 1 and {}", name, MAX_STAGE_TIMEOUT_MS));
            }
        }

        for (name, value) in [
            ("per_scorer_threshold", self.per_scorer_threshold),
            ("confidence_gate", self.confidence_gate),
            ("fuzzy_similarity_threshold", self.fuzzy_similarity_threshold),
            ("moderation_score_ceiling", self.moderation_score_ceiling),
        ] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(format!("{} must be between 0.0 and 1.0", name));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::Configuration(errors.join("; ")))
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.detector_population_size, 100);
        assert_eq!(config.detector_sample_size, 50);
        assert_eq!(config.detector_quorum_fraction, 0.6);
        assert_eq!(config.per_scorer_threshold, 0.75);
        assert_eq!(config.reviewer_population_size, 5);
        assert_eq!(config.reviewer_sample_size, 3);
        assert_eq!(config.confidence_gate, 0.9);
        assert_eq!(config.fuzzy_similarity_threshold, 0.85);
        assert_eq!(config.commitment_delay_seconds, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        for name in ["dev", "testnet", "prod", "defi", "accessible", "unknown"] {
            let config = PipelineConfig::for_environment(name);
            assert!(config.validate().is_ok(), "preset {} invalid", name);
        }
        assert_eq!(PipelineConfig::for_environment("production").confidence_gate, 0.95);
        assert_eq!(PipelineConfig::for_environment("nope").detector_population_size, 20);
    }

    #[test]
    fn test_empty_population_rejected() {
        let config = PipelineConfig {
            detector_population_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let config = PipelineConfig {
            confidence_gate: 1.5,
            detector_quorum_fraction: 0.0,
            ..Default::default()
        };
        match config.validate() {
            Err(PipelineError::Configuration(msg)) => {
                assert!(msg.contains("confidence_gate"));
                assert!(msg.contains("detector_quorum_fraction"));
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_delay_and_timeouts_rejected() {
        let config = PipelineConfig {
            commitment_delay_seconds: u64::MAX,
            detector_timeout_ms: u64::MAX,
            reviewer_timeout_ms: 0,
            ..Default::default()
        };
        match config.validate() {
            Err(PipelineError::Configuration(msg)) => {
                assert!(msg.contains("commitment_delay_seconds"));
                assert!(msg.contains("detector_timeout_ms"));
                assert!(msg.contains("reviewer_timeout_ms"));
                assert!(!msg.contains("executor_timeout_ms"));
            }
            other => panic!("expected configuration error, got {:?}", other),
        }

        let large = PipelineConfig {
            commitment_delay_seconds: 10_000_000_000_000,
            ..Default::default()
        };
        assert!(large.validate().is_err());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"detector_population_size": 12, "confidence_gate": 0.8}}"#).unwrap();

        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.detector_population_size, 12);
        assert_eq!(config.confidence_gate, 0.8);
        assert_eq!(config.reviewer_sample_size, 3);
    }
}
