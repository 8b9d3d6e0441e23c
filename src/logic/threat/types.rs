//! Threat Types
//!
//! No logic here - data structures only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::events::Features;

/// Result of a successful detector quorum. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatVerdict {
    pub event_id: String,
    pub observed_at: DateTime<Utc>,
    /// Mean of all returned scorer scores (0.0 - 1.0)
    pub score: f64,
    pub features: Features,
    pub is_threat: bool,
    /// Scorers that flagged the event
    pub votes: usize,
    /// Scorers that answered before the deadline
    pub responded: usize,
}

impl ThreatVerdict {
    /// Threat severity on the 0..=10 scale
    pub fn severity(&self) -> u8 {
        (self.score * 10.0).round().clamp(0.0, 10.0) as u8
    }
}
