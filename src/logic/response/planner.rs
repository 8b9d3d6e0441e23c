//! Response Planner
//!
//! Input: ThreatVerdict + optional MemoryHint
//! Output: CandidateAction (not yet reviewed)

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::types::{ActionKind, CandidateAction, Commitment};
use crate::constants::{
    DEFAULT_COMMITMENT_CHAIN_DEPTH, DEFAULT_COMMITMENT_DELAY_SECS, MAX_SCALED_DURATION_SECS,
};
use crate::logic::config::PipelineConfig;
use crate::logic::memory::MemoryHint;
use crate::logic::threat::ThreatVerdict;

/// Sightings from which a maximal quarantine may become irreversible
const IRREVERSIBLE_MIN_OCCURRENCES: u64 = 4;

#[derive(Debug, Clone)]
pub struct ResponsePlanner {
    commitment_delay_secs: u64,
    chain_depth: u32,
}

impl Default for ResponsePlanner {
    fn default() -> Self {
        Self {
            commitment_delay_secs: DEFAULT_COMMITMENT_DELAY_SECS,
            chain_depth: DEFAULT_COMMITMENT_CHAIN_DEPTH,
        }
    }
}

impl ResponsePlanner {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            commitment_delay_secs: config.commitment_delay_seconds,
            chain_depth: config.commitment_chain_depth,
        }
    }

    pub fn plan(&self, verdict: &ThreatVerdict, hint: Option<&MemoryHint>) -> CandidateAction {
        self.plan_at(verdict, hint, Utc::now())
    }

    /// Same as `plan` with an explicit clock
    pub fn plan_at(
        &self,
        verdict: &ThreatVerdict,
        hint: Option<&MemoryHint>,
        now: DateTime<Utc>,
    ) -> CandidateAction {
        let kind = match hint {
            Some(h) => h.response_type,
            None => ActionKind::from_score(verdict.score),
        };

        let duration_secs = scaled_duration(kind, hint);

        // First-time maximal actions stay reversible
        let irreversible = kind == ActionKind::Quarantine
            && duration_secs >= ActionKind::Quarantine.base_duration_secs()
            && hint.map_or(false, |h| {
                h.is_repeat_offender && h.occurrence_count >= IRREVERSIBLE_MIN_OCCURRENCES
            });

        let activation_commitment = if kind.requires_commitment() {
            Some(self.commitment(now))
        } else {
            None
        };

        let action = CandidateAction {
            action_id: Uuid::new_v4(),
            target: verdict.event_id.clone(),
            kind,
            severity: verdict.severity(),
            duration_secs,
            restrictions: kind.default_restrictions().iter().map(|r| r.to_string()).collect(),
            redemption_allowed: !irreversible,
            irreversible,
            collective: false,
            permanent: false,
            temporary_restriction_secs: None,
            appeal_window_secs: None,
            activation_commitment,
            created_at: now,
        };

        log::debug!(
            "Planned {} (memory: {})",
            action.description(),
            hint.map_or("none".to_string(), |h| format!("x{}", h.occurrence_count))
        );
        action
    }

    fn commitment(&self, now: DateTime<Utc>) -> Commitment {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);

        Commitment {
            reveal_time: reveal_time(now, self.commitment_delay_secs),
            chain_depth: self.chain_depth,
            seed_digest: hex::encode(Sha256::digest(seed)),
        }
    }
}

/// `now + delay`, saturating at the latest representable time so an
/// oversized delay can never make an action enforceable early
fn reveal_time(now: DateTime<Utc>, delay_secs: u64) -> DateTime<Utc> {
    i64::try_from(delay_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|delay| now.checked_add_signed(delay))
        .unwrap_or_else(|| {
            log::warn!("Commitment delay of {}s is out of range - action held indefinitely", delay_secs);
            DateTime::<Utc>::MAX_UTC
        })
}

/// Base duration scaled by memory strength, capped at 7 days
fn scaled_duration(kind: ActionKind, hint: Option<&MemoryHint>) -> u64 {
    let base = kind.base_duration_secs();
    match hint {
        Some(h) => ((base as f64 * h.strength_multiplier).round() as u64).min(MAX_SCALED_DURATION_SECS),
        None => base,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::events::Features;
    use crate::logic::memory::Signature;

    fn verdict(score: f64) -> ThreatVerdict {
        ThreatVerdict {
            event_id: "tx-plan".to_string(),
            observed_at: Utc::now(),
            score,
            features: Features::new(),
            is_threat: true,
            votes: 40,
            responded: 50,
        }
    }

    fn hint(kind: ActionKind, occurrences: u64) -> MemoryHint {
        MemoryHint {
            signature: Signature("ab".repeat(32)),
            response_type: kind,
            effectiveness: 0.96,
            strength_multiplier: (occurrences as f64 * 0.5).min(3.0),
            is_repeat_offender: true,
            occurrence_count: occurrences,
        }
    }

    #[test]
    fn test_first_sighting_quarantine() {
        let now = Utc::now();
        let action = ResponsePlanner::default().plan_at(&verdict(0.97), None, now);

        assert_eq!(action.kind, ActionKind::Quarantine);
        assert_eq!(action.severity, 10);
        assert_eq!(action.duration_secs, 86_400);
        assert!(!action.irreversible);
        assert!(action.redemption_allowed);
        assert!(action.restrictions.contains("no_staking"));

        let commitment = action.activation_commitment.as_ref().expect("commitment");
        assert_eq!(commitment.reveal_time, now + Duration::seconds(300));
        assert_eq!(commitment.chain_depth, 1000);
        assert_eq!(commitment.seed_digest.len(), 64);
        assert!(!action.is_enforceable(now));
    }

    #[test]
    fn test_low_kinds_have_no_commitment() {
        let planner = ResponsePlanner::default();
        let monitor = planner.plan(&verdict(0.8), None);
        assert_eq!(monitor.kind, ActionKind::Monitor);
        assert_eq!(monitor.duration_secs, 7_200);
        assert!(monitor.activation_commitment.is_none());

        let flag = planner.plan(&verdict(0.6), None);
        assert_eq!(flag.kind, ActionKind::Flag);
        assert_eq!(flag.severity, 6);
        assert!(flag.activation_commitment.is_none());
    }

    #[test]
    fn test_memory_hint_overrides_and_scales() {
        let planner = ResponsePlanner::default();
        let action = planner.plan(&verdict(0.97), Some(&hint(ActionKind::Restrict, 2)));
        assert_eq!(action.kind, ActionKind::Restrict);
        assert_eq!(action.duration_secs, 3_600);
        assert!(action.activation_commitment.is_some());
    }

    #[test]
    fn test_repeat_offender_quarantine_is_irreversible() {
        let planner = ResponsePlanner::default();
        let action = planner.plan(&verdict(0.99), Some(&hint(ActionKind::Quarantine, 4)));
        assert_eq!(action.duration_secs, 172_800);
        assert!(action.irreversible);
        assert!(!action.redemption_allowed);
    }

    #[test]
    fn test_scaled_duration_capped() {
        let planner = ResponsePlanner::default();
        let mut h = hint(ActionKind::Quarantine, 12);
        h.strength_multiplier = 10.0;
        let action = planner.plan(&verdict(0.99), Some(&h));
        assert_eq!(action.duration_secs, 7 * 86_400);
    }

    #[test]
    fn test_commitment_seeds_are_fresh() {
        let planner = ResponsePlanner::default();
        let a = planner.plan(&verdict(0.97), None);
        let b = planner.plan(&verdict(0.97), None);
        assert_ne!(
            a.activation_commitment.unwrap().seed_digest,
            b.activation_commitment.unwrap().seed_digest
        );
    }

    #[test]
    fn test_oversized_delay_never_enforceable_early() {
        let now = Utc::now();
        let v = verdict(0.97);

        for delay in [u64::MAX, 10_000_000_000_000] {
            let planner = ResponsePlanner {
                commitment_delay_secs: delay,
                chain_depth: 10,
            };
            let action = planner.plan_at(&v, None, now);
            let commitment = action.activation_commitment.as_ref().unwrap();
            assert!(commitment.reveal_time > now);
            assert!(!action.is_enforceable(now));
        }
    }
}
