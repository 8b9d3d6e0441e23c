//! Response Types

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{DEFAULT_STRONG_EFFECTIVENESS, DEFAULT_WEAK_EFFECTIVENESS};

// ============================================================================
// ACTION KIND
// ============================================================================

/// Countermeasure kinds, mildest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Flag,
    Monitor,
    Restrict,
    Quarantine,
}

impl ActionKind {
    /// Score-based selection when memory has nothing to say
    pub fn from_score(score: f64) -> Self {
        if score > 0.95 {
            ActionKind::Quarantine
        } else if score > 0.85 {
            ActionKind::Restrict
        } else if score > 0.75 {
            ActionKind::Monitor
        } else {
            ActionKind::Flag
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Flag => "flag",
            ActionKind::Monitor => "monitor",
            ActionKind::Restrict => "restrict",
            ActionKind::Quarantine => "quarantine",
        }
    }

    /// Unscaled duration (seconds)
    pub fn base_duration_secs(&self) -> u64 {
        match self {
            ActionKind::Quarantine => 86_400,
            ActionKind::Restrict => 3_600,
            ActionKind::Monitor => 7_200,
            ActionKind::Flag => 1_800,
        }
    }

    pub fn default_restrictions(&self) -> &'static [&'static str] {
        match self {
            ActionKind::Quarantine => &["no_transactions", "no_staking", "no_governance"],
            ActionKind::Restrict => &["rate_limit_transactions"],
            ActionKind::Monitor => &["enhanced_logging"],
            ActionKind::Flag => &["low_alert"],
        }
    }

    /// Only restrict/quarantine are held behind a commitment
    pub fn requires_commitment(&self) -> bool {
        matches!(self, ActionKind::Restrict | ActionKind::Quarantine)
    }

    /// Effectiveness assumed when no executor reports one
    pub fn default_effectiveness(&self) -> f64 {
        match self {
            ActionKind::Quarantine | ActionKind::Restrict => DEFAULT_STRONG_EFFECTIVENESS,
            ActionKind::Monitor | ActionKind::Flag => DEFAULT_WEAK_EFFECTIVENESS,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// COMMITMENT
// ============================================================================

/// Deferred-activation lock: the action is not enforceable before `reveal_time`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub reveal_time: DateTime<Utc>,
    /// Hash-chain depth the executor walks to verify the release
    pub chain_depth: u32,
    /// SHA-256 hex of the seed; the seed itself is not kept
    pub seed_digest: String,
}

impl Commitment {
    pub fn is_enforceable(&self, now: DateTime<Utc>) -> bool {
        now >= self.reveal_time
    }
}

// ============================================================================
// CANDIDATE ACTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAction {
    pub action_id: Uuid,
    /// Event id the action is aimed at
    pub target: String,
    pub kind: ActionKind,
    /// 0..=10 in normal operation
    pub severity: u8,
    #[serde(rename = "duration_seconds")]
    pub duration_secs: u64,
    pub restrictions: BTreeSet<String>,
    pub redemption_allowed: bool,
    pub irreversible: bool,
    /// Hits more than one entity without individual evidence
    pub collective: bool,
    pub permanent: bool,
    /// Set by moderation when a permanent marker was replaced
    pub temporary_restriction_secs: Option<u64>,
    /// Set by moderation
    pub appeal_window_secs: Option<u64>,
    pub activation_commitment: Option<Commitment>,
    pub created_at: DateTime<Utc>,
}

impl CandidateAction {
    /// Enforceable now: no commitment, or reveal time passed
    pub fn is_enforceable(&self, now: DateTime<Utc>) -> bool {
        self.activation_commitment
            .as_ref()
            .map_or(true, |c| c.is_enforceable(now))
    }

    pub fn description(&self) -> String {
        format!(
            "{} {} for {}s (severity {})",
            self.kind, self.target, self.duration_secs, self.severity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_score() {
        assert_eq!(ActionKind::from_score(0.97), ActionKind::Quarantine);
        assert_eq!(ActionKind::from_score(0.95), ActionKind::Restrict);
        assert_eq!(ActionKind::from_score(0.86), ActionKind::Restrict);
        assert_eq!(ActionKind::from_score(0.85), ActionKind::Monitor);
        assert_eq!(ActionKind::from_score(0.76), ActionKind::Monitor);
        assert_eq!(ActionKind::from_score(0.75), ActionKind::Flag);
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ActionKind::Quarantine).unwrap();
        assert_eq!(json, "\"quarantine\"");
    }

    #[test]
    fn test_commitment_reveal() {
        let now = Utc::now();
        let c = Commitment {
            reveal_time: now + chrono::Duration::seconds(300),
            chain_depth: 1000,
            seed_digest: "00".repeat(32),
        };
        assert!(!c.is_enforceable(now));
        assert!(c.is_enforceable(now + chrono::Duration::seconds(300)));
    }

    #[test]
    fn test_action_exports_duration_seconds() {
        let action = CandidateAction {
            action_id: Uuid::new_v4(),
            target: "tx-export".to_string(),
            kind: ActionKind::Restrict,
            severity: 9,
            duration_secs: 3_600,
            restrictions: BTreeSet::new(),
            redemption_allowed: true,
            irreversible: false,
            collective: false,
            permanent: false,
            temporary_restriction_secs: None,
            appeal_window_secs: None,
            activation_commitment: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["duration_seconds"], 3_600);
        assert!(json.get("duration_secs").is_none());

        let back: CandidateAction = serde_json::from_value(json).unwrap();
        assert_eq!(back.duration_secs, 3_600);
    }
}
