//! Central Configuration Constants
//!
//! Single source of truth for all pipeline defaults.
//! `PipelineConfig::default()` and the env overlay both read from here.

// ============================================================================
// DETECTION
// ============================================================================

/// Number of scorers owned by the detector pool
pub const DEFAULT_DETECTOR_POPULATION: usize = 100;

/// Scorers sampled per event (capped at population size)
pub const DEFAULT_DETECTOR_SAMPLE: usize = 50;

/// Fraction of responding scorers that must flag the event
pub const DEFAULT_QUORUM_FRACTION: f64 = 0.6;

/// Per-scorer threat threshold
pub const DEFAULT_SCORER_THRESHOLD: f64 = 0.75;

/// Sampling trials per scorer call
pub const DEFAULT_SCORER_TRIALS: u32 = 1000;

// ============================================================================
// REVIEW
// ============================================================================

pub const DEFAULT_REVIEWER_POPULATION: usize = 5;
pub const DEFAULT_REVIEWER_SAMPLE: usize = 3;

/// Minimum verdict score a reviewer accepts
pub const DEFAULT_CONFIDENCE_GATE: f64 = 0.9;

/// Response severity may not exceed threat severity times this
pub const DEFAULT_MAX_SEVERITY_MULTIPLIER: f64 = 1.5;

/// Below this score, long actions get moderated
pub const DEFAULT_MODERATION_SCORE_CEILING: f64 = 0.85;

/// 24 hours
pub const DEFAULT_MAX_ACTION_DURATION_SECS: u64 = 86_400;

/// 7 days
pub const DEFAULT_TEMPORARY_RESTRICTION_SECS: u64 = 604_800;

/// 3 days
pub const DEFAULT_APPEAL_WINDOW_SECS: u64 = 259_200;

// ============================================================================
// MEMORY
// ============================================================================

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;
pub const DEFAULT_MEMORY_SHARDS: usize = 1;

/// Optimistic write attempts before a learn gives up
pub const DEFAULT_STORE_WRITE_RETRIES: u32 = 8;

// ============================================================================
// RESPONSE
// ============================================================================

/// 5 minutes
pub const DEFAULT_COMMITMENT_DELAY_SECS: u64 = 300;
pub const DEFAULT_COMMITMENT_CHAIN_DEPTH: u32 = 1000;

/// Longest accepted activation delay (1 year)
pub const MAX_COMMITMENT_DELAY_SECS: u64 = 365 * 86_400;

/// Upper bound on any memory-scaled duration (7 days)
pub const MAX_SCALED_DURATION_SECS: u64 = 7 * 86_400;

/// Assumed effectiveness for quarantine/restrict when the executor gives none
pub const DEFAULT_STRONG_EFFECTIVENESS: f64 = 0.8;

/// Assumed effectiveness for monitor/flag
pub const DEFAULT_WEAK_EFFECTIVENESS: f64 = 0.5;

// ============================================================================
// TIMEOUTS & HISTORY
// ============================================================================

pub const DEFAULT_STAGE_TIMEOUT_MS: u64 = 5_000;

/// Longest accepted per-stage timeout (10 minutes)
pub const MAX_STAGE_TIMEOUT_MS: u64 = 600_000;
pub const DEFAULT_HISTORY_LIMIT: usize = 500;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "immune-core";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "IMMUNE_";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Read `IMMUNE_<name>` and parse it, falling back to `default`
pub fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(format!("{}{}", ENV_PREFIX, name))
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Environment profile name (`IMMUNE_ENVIRONMENT`), defaults to development
pub fn get_environment() -> String {
    std::env::var(format!("{}ENVIRONMENT", ENV_PREFIX))
        .unwrap_or_else(|_| "development".to_string())
}
