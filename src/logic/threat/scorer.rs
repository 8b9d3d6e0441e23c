//! Threat Scorers
//!
//! A scorer maps a feature map to a threat probability in [0, 1].
//! Scorers are stateless per call and run on blocking worker threads.

use std::f64::consts::PI;

use rand::Rng;

use super::layout::{default_layout, FEATURE_SCALE};
use crate::constants::DEFAULT_SCORER_TRIALS;
use crate::error::PipelineResult;
use crate::logic::events::Features;

// ============================================================================
// SCORER TRAIT
// ============================================================================

pub trait ThreatScorer: Send + Sync {
    fn id(&self) -> &str;

    /// Threat probability for one feature map. Errors count as abstention.
    fn score(&self, features: &Features) -> PipelineResult<f64>;
}

// ============================================================================
// SAMPLING SCORER
// ============================================================================

/// Bounded-trial stochastic scorer.
///
/// Each named channel becomes a rotation `θ = clamp(v / 100, 0, 1) · π`
/// and a per-trial hit probability `sin²(θ / 2)`. Every trial samples one bit
/// per channel; the score is the fraction of set bits over all trials.
/// Expected score is the mean channel probability, so raising any channel
/// never lowers it.
pub struct SamplingScorer {
    id: String,
    channels: Vec<String>,
    trials: u32,
}

impl SamplingScorer {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_layout(id, default_layout(), DEFAULT_SCORER_TRIALS)
    }

    pub fn with_layout(id: impl Into<String>, channels: Vec<String>, trials: u32) -> Self {
        Self {
            id: id.into(),
            channels,
            trials: trials.max(1),
        }
    }

    pub fn trials(&self) -> u32 {
        self.trials
    }

    /// Hit probability for each configured channel (missing channel = 0)
    pub fn channel_probabilities(&self, features: &Features) -> Vec<f64> {
        self.channels
            .iter()
            .map(|name| channel_probability(features.get(name).copied().unwrap_or(0.0)))
            .collect()
    }

    /// Mean probability the sampler converges to
    pub fn expected_score(&self, features: &Features) -> f64 {
        let probs = self.channel_probabilities(features);
        if probs.is_empty() {
            return 0.0;
        }
        probs.iter().sum::<f64>() / probs.len() as f64
    }
}

impl ThreatScorer for SamplingScorer {
    fn id(&self) -> &str {
        &self.id
    }

    fn score(&self, features: &Features) -> PipelineResult<f64> {
        let probs = self.channel_probabilities(features);
        if probs.is_empty() {
            return Ok(0.0);
        }

        let mut rng = rand::thread_rng();
        let mut hits: u64 = 0;
        for _ in 0..self.trials {
            for p in &probs {
                if rng.gen_bool(*p) {
                    hits += 1;
                }
            }
        }

        let total = self.trials as u64 * probs.len() as u64;
        Ok(hits as f64 / total as f64)
    }
}

/// Rotation parameter for a raw feature value
pub fn rotation_angle(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value / FEATURE_SCALE).clamp(0.0, 1.0) * PI
}

/// Probability of a set bit for a raw feature value
pub fn channel_probability(value: f64) -> f64 {
    let half = rotation_angle(value) / 2.0;
    (half.sin() * half.sin()).clamp(0.0, 1.0)
}

// ============================================================================
// TESTS
// ============================================================================
