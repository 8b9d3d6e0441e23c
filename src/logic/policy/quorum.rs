//! Review Quorum
//!
//! Samples reviewers, runs them in parallel and aggregates by strict
//! majority. Fail-closed: a reviewer that errors or misses the deadline
//! counts as a rejection.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use super::config::PolicyConfig;
use super::engine::{PolicyReviewer, RegulatoryReviewer};
use super::types::Decision;
use crate::error::{PipelineError, PipelineResult};
use crate::logic::config::PipelineConfig;
use crate::logic::response::CandidateAction;
use crate::logic::threat::ThreatVerdict;

pub const REGULATORY_REJECTION: &str = "regulatory rejection";

/// More than half of `sampled` approved; exactly half is not enough
pub fn majority_reached(approvals: usize, sampled: usize) -> bool {
    approvals * 2 > sampled
}

/// Combine individual decisions over `sampled` reviewers.
///
/// Missing decisions (timeouts) are already absent from `decisions` and
/// weigh as rejections through `sampled`.
pub fn aggregate(decisions: Vec<Decision>, candidate: &CandidateAction, sampled: usize) -> Decision {
    let approvals = decisions.iter().filter(|d| d.approved).count();

    if majority_reached(approvals, sampled) {
        // First moderated approval wins; otherwise the untouched candidate
        if let Some(moderated) = decisions.iter().find(|d| d.approved && d.moderated) {
            let mut decision =
                Decision::moderate(moderated.action.clone(), &moderated.reason);
            decision.reviewer = moderated.reviewer.clone();
            return decision;
        }
        return Decision::approve(
            candidate.clone(),
            &format!("approved by {}/{} reviewers", approvals, sampled),
        );
    }

    let violations = decisions
        .iter()
        .flat_map(|d| d.violations.iter().cloned())
        .fold(Vec::<String>::new(), |mut acc, v| {
            if !acc.contains(&v) {
                acc.push(v);
            }
            acc
        });

    let mut rejection = Decision::reject(candidate.clone(), REGULATORY_REJECTION, violations);
    rejection.collected = decisions;
    rejection
}

// ============================================================================
// REVIEW BOARD
// ============================================================================

pub struct ReviewBoard {
    reviewers: Vec<Arc<dyn PolicyReviewer>>,
    sample_size: usize,
    timeout: Duration,
}

impl ReviewBoard {
    pub fn new(
        reviewers: Vec<Arc<dyn PolicyReviewer>>,
        sample_size: usize,
        timeout: Duration,
    ) -> PipelineResult<Self> {
        if reviewers.is_empty() {
            return Err(PipelineError::Configuration(
                "review board has no reviewers".to_string(),
            ));
        }
        if sample_size == 0 {
            return Err(PipelineError::Configuration(
                "reviewer_sample_size must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            reviewers,
            sample_size,
            timeout,
        })
    }

    /// `reviewer_population_size` regulatory reviewers sharing one policy
    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Self> {
        let policy = PolicyConfig::from_pipeline(config);
        let reviewers = (0..config.reviewer_population_size)
            .map(|i| {
                Arc::new(RegulatoryReviewer::new(format!("reviewer_{}", i), policy.clone()))
                    as Arc<dyn PolicyReviewer>
            })
            .collect();

        Self::new(
            reviewers,
            config.reviewer_sample_size,
            Duration::from_millis(config.reviewer_timeout_ms),
        )
    }

    pub fn population(&self) -> usize {
        self.reviewers.len()
    }

    pub fn effective_sample_size(&self) -> usize {
        self.sample_size.min(self.reviewers.len())
    }

    /// Quorum decision for `candidate`. Never errors: every failure mode
    /// ends in a rejection.
    pub async fn review(&self, verdict: &ThreatVerdict, candidate: &CandidateAction) -> Decision {
        let k = self.effective_sample_size();
        let picks = {
            let mut rng = rand::thread_rng();
            rand::seq::index::sample(&mut rng, self.reviewers.len(), k).into_vec()
        };

        let shared = Arc::new((verdict.clone(), candidate.clone()));
        let mut tasks = JoinSet::new();
        for idx in picks {
            let reviewer = Arc::clone(&self.reviewers[idx]);
            let shared = Arc::clone(&shared);
            tasks.spawn_blocking(move || {
                let (verdict, candidate) = &*shared;
                let result = reviewer.review(verdict, candidate);
                (reviewer.id().to_string(), result)
            });
        }

        // No deadline if the timeout is beyond the clock's range
        let deadline = tokio::time::Instant::now().checked_add(self.timeout);
        let mut decisions = Vec::with_capacity(k);

        loop {
            let next = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, tasks.join_next()).await,
                None => Ok(tasks.join_next().await),
            };
            match next {
                Ok(Some(Ok((_, Ok(decision))))) => decisions.push(decision),
                Ok(Some(Ok((id, Err(e))))) => {
                    log::warn!("Reviewer {} failed: {} - counted as rejection", id, e);
                    decisions.push(Decision::reject(
                        candidate.clone(),
                        &format!("reviewer error: {}", e),
                        vec![],
                    ).by(&id));
                }
                Ok(Some(Err(e))) => {
                    log::warn!("Reviewer task failed: {} - counted as rejection", e);
                }
                Ok(None) => break,
                Err(_) => {
                    log::warn!(
                        "{} reviewer(s) missed the {}ms deadline for {} - counted as rejection",
                        tasks.len(),
                        self.timeout.as_millis(),
                        candidate.target
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        let decision = aggregate(decisions, candidate, k);
        log::info!(
            "Review of {}: {} ({})",
            candidate.description(),
            if decision.moderated {
                "moderated"
            } else if decision.approved {
                "approved"
            } else {
                "rejected"
            },
            decision.reason
        );
        decision
    }
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

    /// Reviewer with a canned answer, optionally slow or broken
    struct ScriptedReviewer {
        id: String,
        approve: bool,
        delay_ms: u64,
        fail: bool,
    }

    impl PolicyReviewer for ScriptedReviewer {
        fn id(&self) -> &str {
            &self.id
        }

        fn review(&self, _: &ThreatVerdict, candidate: &CandidateAction) -> PipelineResult<Decision> {
            if self.delay_ms > 0 {
                std::thread::sleep(Duration::from_millis(self.delay_ms));
            }
            if self.fail {
                return Err(PipelineError::Reviewer("policy backend down".to_string()));
            }
            Ok(if self.approve {
                Decision::approve(candidate.clone(), "ok").by(&self.id)
            } else {
                Decision::reject(candidate.clone(), "no", vec!["proportionality: test".to_string()])
                    .by(&self.id)
            })
        }
    }

    fn scripted(id: &str, approve: bool, delay_ms: u64, fail: bool) -> Arc<dyn PolicyReviewer> {
        Arc::new(ScriptedReviewer {
            id: id.to_string(),
            approve,
            delay_ms,
            fail,
        })
    }

    fn verdict(score: f64) -> ThreatVerdict {
        ThreatVerdict {
            event_id: "tx-quorum".to_string(),
            observed_at: Utc::now(),
            score,
            features: Features::new(),
            is_threat: true,
            votes: 40,
            responded: 50,
        }
    }

    #[test]
    fn test_majority_is_strict() {
        assert!(majority_reached(2, 3));
        assert!(!majority_reached(2, 4));
        assert!(majority_reached(3, 4));
        assert!(!majority_reached(0, 1));
    }

    #[test]
    fn test_empty_board_is_configuration_error() {
        let result = ReviewBoard::new(vec![], 3, Duration::from_millis(100));
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn test_aggregate_returns_first_moderated() {
        let v = verdict(0.8);
        let candidate = ResponsePlanner::default().plan(&v, None);
        let mut short = candidate.clone();
        short.duration_secs = 60;

        let decisions = vec![
            Decision::approve(candidate.clone(), "ok").by("a"),
            Decision::moderate(short.clone(), "trimmed").by("b"),
            Decision::reject(candidate.clone(), "no", vec![]).by("c"),
        ];

        let decision = aggregate(decisions, &candidate, 3);
        assert!(decision.approved);
        assert!(decision.moderated);
        assert_eq!(decision.action.duration_secs, 60);
        assert_eq!(decision.reviewer.as_deref(), Some("b"));
    }

    #[test]
    fn test_aggregate_half_is_rejection() {
        let v = verdict(0.97);
        let candidate = ResponsePlanner::default().plan(&v, None);
        let decisions = vec![
            Decision::approve(candidate.clone(), "ok"),
            Decision::approve(candidate.clone(), "ok"),
            Decision::reject(candidate.clone(), "no", vec!["x".to_string()]),
            Decision::reject(candidate.clone(), "no", vec!["x".to_string()]),
        ];

        let decision = aggregate(decisions, &candidate, 4);
        assert!(!decision.approved);
        assert_eq!(decision.reason, REGULATORY_REJECTION);
        assert_eq!(decision.collected.len(), 4);
        assert_eq!(decision.violations, vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn test_all_approve() {
        let v = verdict(0.97);
        let candidate = ResponsePlanner::default().plan(&v, None);
        let board = ReviewBoard::new(
            vec![scripted("a", true, 0, false), scripted("b", true, 0, false), scripted("c", true, 0, false)],
            3,
            Duration::from_secs(1),
        )
        .unwrap();

        let decision = board.review(&v, &candidate).await;
        assert!(decision.approved);
        assert!(!decision.moderated);
        assert_eq!(decision.action, candidate);
    }

    #[tokio::test]
    async fn test_timeouts_count_as_rejection() {
        let v = verdict(0.97);
        let candidate = ResponsePlanner::default().plan(&v, None);
        // One fast approval, two approvals that arrive too late
        let board = ReviewBoard::new(
            vec![
                scripted("fast", true, 0, false),
                scripted("slow1", true, 500, false),
                scripted("slow2", true, 500, false),
            ],
            3,
            Duration::from_millis(50),
        )
        .unwrap();

        let decision = board.review(&v, &candidate).await;
        assert!(!decision.approved);
        assert_eq!(decision.reason, REGULATORY_REJECTION);
    }

    #[tokio::test]
    async fn test_reviewer_errors_count_as_rejection() {
        let v = verdict(0.97);
        let candidate = ResponsePlanner::default().plan(&v, None);
        let board = ReviewBoard::new(
            vec![
                scripted("ok", true, 0, false),
                scripted("down1", true, 0, true),
                scripted("down2", true, 0, true),
            ],
            3,
            Duration::from_secs(1),
        )
        .unwrap();

        let decision = board.review(&v, &candidate).await;
        assert!(!decision.approved);
        assert_eq!(decision.collected.len(), 3);
    }

    #[tokio::test]
    async fn test_board_from_config_with_default_gate() {
        let board = ReviewBoard::from_config(&PipelineConfig::default()).unwrap();
        assert_eq!(board.population(), 5);
        assert_eq!(board.effective_sample_size(), 3);

        // 0.8 is below the default 0.9 gate
        let v = verdict(0.8);
        let candidate = ResponsePlanner::default().plan(&v, None);
        let decision = board.review(&v, &candidate).await;
        assert!(!decision.approved);
        assert!(decision.collected.iter().all(|d| d.reason.contains("low confidence")));
    }

    #[tokio::test]
    async fn test_unbounded_timeout_does_not_panic() {
        let v = verdict(0.97);
        let candidate = ResponsePlanner::default().plan(&v, None);
        let board = ReviewBoard::new(
            vec![scripted("a", true, 0, false), scripted("b", true, 0, false)],
            2,
            Duration::from_millis(u64::MAX),
        )
        .unwrap();

        assert!(board.review(&v, &candidate).await.approved);
    }
}
