//! Policy Engine
//!
//! Review logic only - data types live in `types.rs`.
//! Input: ThreatVerdict + CandidateAction + PolicyConfig
//! Output: Decision

use super::config::PolicyConfig;
use super::rules::{check_violations, default_rules, NonHarmRule};
use super::types::Decision;
use crate::error::PipelineResult;
use crate::logic::response::CandidateAction;
use crate::logic::threat::ThreatVerdict;

// ============================================================================
// REVIEWER TRAIT
// ============================================================================

pub trait PolicyReviewer: Send + Sync {
    fn id(&self) -> &str;

    /// Errors are treated as rejection by the quorum
    fn review(&self, verdict: &ThreatVerdict, candidate: &CandidateAction) -> PipelineResult<Decision>;
}

// ============================================================================
// REGULATORY REVIEWER
// ============================================================================

/// Gates, in order: confidence, non-harm rules, moderation
pub struct RegulatoryReviewer {
    id: String,
    config: PolicyConfig,
    rules: Vec<Box<dyn NonHarmRule>>,
}

impl RegulatoryReviewer {
    pub fn new(id: impl Into<String>, config: PolicyConfig) -> Self {
        Self::with_rules(id, config, default_rules())
    }

    pub fn with_rules(id: impl Into<String>, config: PolicyConfig, rules: Vec<Box<dyn NonHarmRule>>) -> Self {
        Self {
            id: id.into(),
            config,
            rules,
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Review without the trait's error channel
    pub fn evaluate(&self, verdict: &ThreatVerdict, candidate: &CandidateAction) -> Decision {
        // 1. Confidence gate
        if verdict.score < self.config.confidence_gate {
            return Decision::reject(
                candidate.clone(),
                &format!(
                    "low confidence: score {:.3} < gate {:.2}",
                    verdict.score, self.config.confidence_gate
                ),
                vec![],
            )
            .by(&self.id);
        }

        // 2. Non-harm rules
        let violations = check_violations(&self.rules, verdict, candidate, &self.config);
        if !violations.is_empty() {
            log::info!(
                "Reviewer {} rejected {}: {}",
                self.id,
                candidate.description(),
                violations.join("; ")
            );
            return Decision::reject(candidate.clone(), "violates non-harm constraints", violations)
                .by(&self.id);
        }

        // 3. Moderation
        if verdict.score < self.config.moderation_score_ceiling
            && candidate.duration_secs > self.config.max_action_duration_secs
        {
            return Decision::moderate(
                moderate(candidate, &self.config),
                "moderated for proportionality",
            )
            .by(&self.id);
        }

        Decision::approve(candidate.clone(), "approved by regulatory review").by(&self.id)
    }
}

impl PolicyReviewer for RegulatoryReviewer {
    fn id(&self) -> &str {
        &self.id
    }

    fn review(&self, verdict: &ThreatVerdict, candidate: &CandidateAction) -> PipelineResult<Decision> {
        Ok(self.evaluate(verdict, candidate))
    }
}

/// Down-scoped copy: duration clamped, permanent/irreversible replaced by a
/// temporary restriction, appeal window opened
pub fn moderate(candidate: &CandidateAction, config: &PolicyConfig) -> CandidateAction {
    let mut moderated = candidate.clone();

    moderated.duration_secs = moderated.duration_secs.min(config.max_action_duration_secs);

    if moderated.permanent || moderated.irreversible {
        moderated.permanent = false;
        moderated.irreversible = false;
        moderated.temporary_restriction_secs = Some(config.temporary_restriction_secs);
    }
    moderated.redemption_allowed = true;
    moderated.appeal_window_secs = Some(config.appeal_window_secs);

    moderated
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::events::Features;
    use crate::logic::response::ResponsePlanner;
    use chrono::Utc;

    fn verdict(score: f64) -> ThreatVerdict {
        ThreatVerdict {
            event_id: "tx-review".to_string(),
            observed_at: Utc::now(),
            score,
            features: Features::new(),
            is_threat: true,
            votes: 40,
            responded: 50,
        }
    }

    fn candidate(score: f64) -> CandidateAction {
        ResponsePlanner::default().plan(&verdict(score), None)
    }

    #[test]
    fn test_confidence_gate() {
        let reviewer = RegulatoryReviewer::new("r0", PolicyConfig::default());
        let decision = reviewer.evaluate(&verdict(0.89), &candidate(0.89));
        assert!(!decision.approved);
        assert!(decision.reason.contains("low confidence"));
        assert!(decision.violations.is_empty());
    }

    #[test]
    fn test_clean_approval() {
        let reviewer = RegulatoryReviewer::new("r0", PolicyConfig::default());
        let c = candidate(0.97);
        let decision = reviewer.evaluate(&verdict(0.97), &c);
        assert!(decision.approved);
        assert!(!decision.moderated);
        assert_eq!(decision.action, c);
        assert_eq!(decision.reviewer.as_deref(), Some("r0"));
    }

    #[test]
    fn test_disproportionate_severity_rejected() {
        let reviewer = RegulatoryReviewer::new("r0", PolicyConfig::lenient());
        let mut c = candidate(0.76);
        c.severity = 15;

        let decision = reviewer.evaluate(&verdict(0.76), &c);
        assert!(!decision.approved);
        assert!(decision.violated("proportionality"));
    }

    #[test]
    fn test_irreversible_rejected() {
        let reviewer = RegulatoryReviewer::new("r0", PolicyConfig::default());
        let mut c = candidate(0.99);
        c.irreversible = true;
        c.redemption_allowed = false;

        let decision = reviewer.evaluate(&verdict(0.99), &c);
        assert!(!decision.approved);
        assert!(decision.violated("irreversible_harm"));
        // severity 10 without redemption also breaks the cap of 5
        assert!(decision.violated("redemption_path"));
    }

    #[test]
    fn test_long_action_moderated() {
        let reviewer = RegulatoryReviewer::new("r0", PolicyConfig::lenient());
        let mut c = candidate(0.80);
        c.duration_secs = 200_000;

        let decision = reviewer.evaluate(&verdict(0.80), &c);
        assert!(decision.approved);
        assert!(decision.moderated);
        assert_eq!(decision.action.duration_secs, 86_400);
        assert_eq!(decision.action.appeal_window_secs, Some(259_200));
        assert_eq!(decision.action.action_id, c.action_id);
    }

    #[test]
    fn test_moderation_replaces_permanent_marker() {
        let mut c = candidate(0.80);
        c.permanent = true;
        c.duration_secs = 300_000;

        let moderated = moderate(&c, &PolicyConfig::default());
        assert!(!moderated.permanent);
        assert!(!moderated.irreversible);
        assert!(moderated.redemption_allowed);
        assert_eq!(moderated.temporary_restriction_secs, Some(604_800));
        assert_eq!(moderated.duration_secs, 86_400);
    }
}
