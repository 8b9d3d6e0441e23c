//! Detector Pool
//!
//! Owns the scorer population. For each event it samples `k` scorers without
//! replacement, runs them in parallel on blocking threads and applies the
//! quorum rule. Scorers still running at the deadline are abstentions.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use super::rules::QuorumTally;
use super::scorer::{SamplingScorer, ThreatScorer};
use super::types::ThreatVerdict;
use crate::error::{PipelineError, PipelineResult};
use crate::logic::config::PipelineConfig;
use crate::logic::events::Event;
use crate::logic::threat::layout::default_layout;

pub struct DetectorPool {
    scorers: Vec<Arc<dyn ThreatScorer>>,
    sample_size: usize,
    quorum_fraction: f64,
    threshold: f64,
    timeout: Duration,
}

impl DetectorPool {
    /// Pool over an explicit population
    pub fn new(scorers: Vec<Arc<dyn ThreatScorer>>, config: &PipelineConfig) -> PipelineResult<Self> {
        if scorers.is_empty() {
            return Err(PipelineError::Configuration(
                "detector pool has no scorers".to_string(),
            ));
        }
        if config.detector_sample_size == 0 {
            return Err(PipelineError::Configuration(
                "detector_sample_size must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            scorers,
            sample_size: config.detector_sample_size,
            quorum_fraction: config.detector_quorum_fraction,
            threshold: config.per_scorer_threshold,
            timeout: Duration::from_millis(config.detector_timeout_ms),
        })
    }

    /// Population of `detector_population_size` sampling scorers
    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Self> {
        let scorers = (0..config.detector_population_size)
            .map(|i| {
                Arc::new(SamplingScorer::with_layout(
                    format!("detector_{}", i),
                    default_layout(),
                    config.scorer_trials,
                )) as Arc<dyn ThreatScorer>
            })
            .collect();
        Self::new(scorers, config)
    }

    pub fn population(&self) -> usize {
        self.scorers.len()
    }

    /// `k` for this pool: configured sample, capped at population
    pub fn effective_sample_size(&self) -> usize {
        self.sample_size.min(self.scorers.len())
    }

    /// Run one quorum vote. `Ok(None)` means no threat.
    pub async fn evaluate(&self, event: &Event) -> PipelineResult<Option<ThreatVerdict>> {
        let scores = self.collect_scores(event).await;
        let tally = QuorumTally::from_scores(&scores, self.threshold, self.quorum_fraction);

        log::debug!(
            "Detector quorum for {}: {}/{} votes (need {}), mean {:.3}",
            event.id,
            tally.votes,
            tally.responded,
            tally.required,
            tally.mean_score
        );

        if !tally.reached() {
            return Ok(None);
        }

        Ok(Some(ThreatVerdict {
            event_id: event.id.clone(),
            observed_at: event.observed_at,
            score: tally.mean_score,
            features: event.features.clone(),
            is_threat: true,
            votes: tally.votes,
            responded: tally.responded,
        }))
    }

    async fn collect_scores(&self, event: &Event) -> Vec<f64> {
        let k = self.effective_sample_size();
        let picks = {
            let mut rng = rand::thread_rng();
            rand::seq::index::sample(&mut rng, self.scorers.len(), k).into_vec()
        };

        let features = Arc::new(event.features.clone());
        let mut tasks = JoinSet::new();
        for idx in picks {
            let scorer = Arc::clone(&self.scorers[idx]);
            let features = Arc::clone(&features);
            tasks.spawn_blocking(move || {
                let result = scorer.score(&features);
                (scorer.id().to_string(), result)
            });
        }

        // No deadline if the timeout is beyond the clock's range
        let deadline = tokio::time::Instant::now().checked_add(self.timeout);
        let mut scores = Vec::with_capacity(k);

        loop {
            let next = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, tasks.join_next()).await,
                None => Ok(tasks.join_next().await),
            };
            match next {
                Ok(Some(Ok((_, Ok(score))))) if score.is_finite() => {
                    scores.push(score.clamp(0.0, 1.0));
                }
                Ok(Some(Ok((id, Ok(score))))) => {
                    log::warn!("Scorer {} returned non-finite score {} - abstaining", id, score);
                }
                Ok(Some(Ok((id, Err(e))))) => {
                    log::warn!("Scorer {} failed: {} - abstaining", id, e);
                }
                Ok(Some(Err(e))) => {
                    log::warn!("Scorer task failed: {} - abstaining", e);
                }
                Ok(None) => break,
                Err(_) => {
                    log::warn!(
                        "{} scorer(s) missed the {}ms deadline for {} - abstaining",
                        tasks.len(),
                        self.timeout.as_millis(),
                        event.id
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        scores
    }
}

// ============================================================================
// TESTS
// ============================================================================
