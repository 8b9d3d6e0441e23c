//! Quorum Rules
//!
//! Pure arithmetic for the detector vote, kept apart from the async fan-out.

use serde::{Deserialize, Serialize};

/// Float slack so that e.g. 0.6 * 50 does not round up to 31
const QUORUM_EPSILON: f64 = 1e-9;

/// Votes required out of `n` responders: `ceil(fraction * n)`, at least 1
pub fn quorum_size(n: usize, fraction: f64) -> usize {
    if n == 0 {
        return 0;
    }
    let raw = (fraction * n as f64 - QUORUM_EPSILON).ceil();
    (raw.max(1.0) as usize).min(n)
}

/// Vote count over the scorers that answered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuorumTally {
    pub responded: usize,
    pub votes: usize,
    pub required: usize,
    pub mean_score: f64,
}

impl QuorumTally {
    pub fn from_scores(scores: &[f64], threshold: f64, fraction: f64) -> Self {
        let responded = scores.len();
        let votes = scores.iter().filter(|s| **s > threshold).count();
        let mean_score = if responded == 0 {
            0.0
        } else {
            scores.iter().sum::<f64>() / responded as f64
        };

        Self {
            responded,
            votes,
            required: quorum_size(responded, fraction),
            mean_score,
        }
    }

    pub fn reached(&self) -> bool {
        self.responded > 0 && self.votes >= self.required
    }
}
