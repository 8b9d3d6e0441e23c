//! Non-Harm Rules (Extensible)
//!
//! Each rule inspects a candidate and reports a violation string that starts
//! with the rule name. Add rules without touching the reviewer.

use super::config::PolicyConfig;
use crate::logic::response::CandidateAction;
use crate::logic::threat::ThreatVerdict;

// ============================================================================
// RULE TRAIT
// ============================================================================

pub trait NonHarmRule: Send + Sync {
    fn name(&self) -> &str;

    /// `Some(description)` if `candidate` breaks the rule
    fn check(
        &self,
        verdict: &ThreatVerdict,
        candidate: &CandidateAction,
        config: &PolicyConfig,
    ) -> Option<String>;
}

// ============================================================================
// BUILT-IN RULES
// ============================================================================

/// No action that cannot be undone
pub struct IrreversibleHarmRule;

impl NonHarmRule for IrreversibleHarmRule {
    fn name(&self) -> &str {
        "irreversible_harm"
    }

    fn check(&self, _: &ThreatVerdict, candidate: &CandidateAction, _: &PolicyConfig) -> Option<String> {
        candidate
            .irreversible
            .then(|| format!("{}: irreversible {} on {}", self.name(), candidate.kind, candidate.target))
    }
}

/// No action against several entities without individual evidence
pub struct CollectivePunishmentRule;

impl NonHarmRule for CollectivePunishmentRule {
    fn name(&self) -> &str {
        "collective_punishment"
    }

    fn check(&self, _: &ThreatVerdict, candidate: &CandidateAction, _: &PolicyConfig) -> Option<String> {
        candidate
            .collective
            .then(|| format!("{}: action targets more than one entity", self.name()))
    }
}

/// Actions without a redemption path are capped lower
pub struct RedemptionPathRule;

impl NonHarmRule for RedemptionPathRule {
    fn name(&self) -> &str {
        "redemption_path"
    }

    fn check(&self, _: &ThreatVerdict, candidate: &CandidateAction, config: &PolicyConfig) -> Option<String> {
        let cap = if candidate.redemption_allowed {
            config.redeemable_severity_cap
        } else {
            config.unredeemable_severity_cap
        };

        (candidate.severity > cap).then(|| {
            format!(
                "{}: severity {} exceeds cap {} (redemption {})",
                self.name(),
                candidate.severity,
                cap,
                if candidate.redemption_allowed { "allowed" } else { "denied" }
            )
        })
    }
}

/// Response severity bounded by threat severity times the multiplier
pub struct ProportionalityRule;

impl NonHarmRule for ProportionalityRule {
    fn name(&self) -> &str {
        "proportionality"
    }

    fn check(&self, verdict: &ThreatVerdict, candidate: &CandidateAction, config: &PolicyConfig) -> Option<String> {
        let threat_severity = verdict.severity().min(10) as f64;
        let bound = config.max_severity_multiplier * threat_severity;

        (candidate.severity as f64 > bound).then(|| {
            format!(
                "{}: severity {} exceeds {:.1} ({} x {})",
                self.name(),
                candidate.severity,
                bound,
                config.max_severity_multiplier,
                threat_severity
            )
        })
    }
}

// ============================================================================
// RULE ENGINE
// ============================================================================

pub fn default_rules() -> Vec<Box<dyn NonHarmRule>> {
    vec![
        Box::new(IrreversibleHarmRule),
        Box::new(CollectivePunishmentRule),
        Box::new(RedemptionPathRule),
        Box::new(ProportionalityRule),
    ]
}

/// Every violation, in rule order
pub fn check_violations(
    rules: &[Box<dyn NonHarmRule>],
    verdict: &ThreatVerdict,
    candidate: &CandidateAction,
    config: &PolicyConfig,
) -> Vec<String> {
    rules
        .iter()
        .filter_map(|rule| rule.check(verdict, candidate, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::events::Features;
    use crate::logic::response::ResponsePlanner;
    use chrono::Utc;

    fn verdict(score: f64) -> ThreatVerdict {
        ThreatVerdict {
            event_id: "tx-rules".to_string(),
            observed_at: Utc::now(),
            score,
            features: Features::new(),
            is_threat: true,
            votes: 40,
            responded: 50,
        }
    }

    #[test]
    fn test_clean_candidate_passes() {
        let v = verdict(0.97);
        let candidate = ResponsePlanner::default().plan(&v, None);
        let violations = check_violations(&default_rules(), &v, &candidate, &PolicyConfig::default());
        assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn test_unredeemable_cap_is_five() {
        let v = verdict(0.97);
        let mut candidate = ResponsePlanner::default().plan(&v, None);
        candidate.redemption_allowed = false;
        candidate.severity = 6;

        let violations = check_violations(&default_rules(), &v, &candidate, &PolicyConfig::default());
        assert_eq!(violations.len(), 1);
        assert!(violations[0].starts_with("redemption_path"));
    }

    #[test]
    fn test_proportionality_bound() {
        let v = verdict(0.76); // threat severity 8, bound 12
        let mut candidate = ResponsePlanner::default().plan(&v, None);

        candidate.severity = 12;
        assert!(ProportionalityRule.check(&v, &candidate, &PolicyConfig::default()).is_none());

        candidate.severity = 13;
        let violation = ProportionalityRule.check(&v, &candidate, &PolicyConfig::default()).unwrap();
        assert!(violation.starts_with("proportionality"));
    }

    #[test]
    fn test_collective_and_irreversible() {
        let v = verdict(0.99);
        let mut candidate = ResponsePlanner::default().plan(&v, None);
        candidate.collective = true;
        candidate.irreversible = true;

        let violations = check_violations(&default_rules(), &v, &candidate, &PolicyConfig::default());
        assert!(violations.iter().any(|v| v.starts_with("irreversible_harm")));
        assert!(violations.iter().any(|v| v.starts_with("collective_punishment")));
    }
}
