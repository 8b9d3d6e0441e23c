//! Policy Configuration
//!
//! Thresholds used by each reviewer. Built from `PipelineConfig` at startup.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::logic::config::PipelineConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Reject verdicts scoring below this
    pub confidence_gate: f64,
    /// Response severity may reach threat severity times this
    pub max_severity_multiplier: f64,
    /// Severity cap for redeemable actions
    pub redeemable_severity_cap: u8,
    /// Severity cap for actions without a redemption path
    pub unredeemable_severity_cap: u8,
    /// Moderate long actions for verdicts below this score
    pub moderation_score_ceiling: f64,
    /// Longest duration a moderated action keeps
    pub max_action_duration_secs: u64,
    /// Replacement length for permanent markers
    pub temporary_restriction_secs: u64,
    pub appeal_window_secs: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            confidence_gate: DEFAULT_CONFIDENCE_GATE,
            max_severity_multiplier: DEFAULT_MAX_SEVERITY_MULTIPLIER,
            redeemable_severity_cap: 10,
            unredeemable_severity_cap: 5,
            moderation_score_ceiling: DEFAULT_MODERATION_SCORE_CEILING,
            max_action_duration_secs: DEFAULT_MAX_ACTION_DURATION_SECS,
            temporary_restriction_secs: DEFAULT_TEMPORARY_RESTRICTION_SECS,
            appeal_window_secs: DEFAULT_APPEAL_WINDOW_SECS,
        }
    }
}

impl PolicyConfig {
    pub fn from_pipeline(config: &PipelineConfig) -> Self {
        Self {
            confidence_gate: config.confidence_gate,
            max_severity_multiplier: config.max_severity_multiplier,
            moderation_score_ceiling: config.moderation_score_ceiling,
            max_action_duration_secs: config.max_action_duration_secs,
            temporary_restriction_secs: config.temporary_restriction_secs,
            appeal_window_secs: config.appeal_window_secs,
            ..Default::default()
        }
    }

    /// Lowered gate, so moderation and the non-harm rules are reachable for
    /// verdicts in the 0.75 - 0.9 band
    pub fn lenient() -> Self {
        Self {
            confidence_gate: 0.75,
            ..Default::default()
        }
    }
}
