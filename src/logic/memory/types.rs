//! Memory Types

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::response::ActionKind;
use crate::logic::threat::ThreatVerdict;

// ============================================================================
// KEYS
// ============================================================================

/// SHA-256 hex digest of an event's sorted feature map
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(pub String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Stable shard for this signature among `shards`
    pub fn shard_index(&self, shards: usize) -> usize {
        if shards <= 1 {
            return 0;
        }
        let head = self.0.get(..8).and_then(|h| u32::from_str_radix(h, 16).ok()).unwrap_or(0);
        head as usize % shards
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub const FINGERPRINT_BYTES: usize = 32;

/// Fixed-length locality-sensitive digest used for fuzzy recall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; FINGERPRINT_BYTES]);

impl Fingerprint {
    pub fn bits(&self) -> usize {
        FINGERPRINT_BYTES * 8
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// One remembered threat pattern. Replaced atomically on every learn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub signature: Signature,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub occurrence_count: u64,
    pub last_score: f64,
    pub effectiveness_history: Vec<f64>,
    pub fuzzy_fingerprint: Fingerprint,
    pub features: BTreeMap<String, f64>,
}

impl MemoryRecord {
    pub fn first_sighting(
        signature: Signature,
        fingerprint: Fingerprint,
        verdict: &ThreatVerdict,
        effectiveness: f64,
    ) -> Self {
        Self {
            signature,
            first_seen: verdict.observed_at,
            last_seen: verdict.observed_at,
            occurrence_count: 1,
            last_score: verdict.score,
            effectiveness_history: vec![effectiveness],
            fuzzy_fingerprint: fingerprint,
            features: verdict.features.iter().map(|(k, v)| (k.clone(), *v)).collect(),
        }
    }

    /// Copy with one more sighting applied
    pub fn observed_again(&self, verdict: &ThreatVerdict, effectiveness: f64) -> Self {
        let mut next = self.clone();
        next.occurrence_count += 1;
        next.last_seen = verdict.observed_at.max(self.last_seen);
        next.last_score = verdict.score;
        next.effectiveness_history.push(effectiveness);
        next
    }

    pub fn mean_effectiveness(&self) -> f64 {
        if self.effectiveness_history.is_empty() {
            return 0.0;
        }
        self.effectiveness_history.iter().sum::<f64>() / self.effectiveness_history.len() as f64
    }
}

/// Derived view of a record handed to the response planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryHint {
    pub signature: Signature,
    pub response_type: ActionKind,
    pub effectiveness: f64,
    pub strength_multiplier: f64,
    pub is_repeat_offender: bool,
    pub occurrence_count: u64,
}

/// Read-only audit export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryExport {
    pub integrity_root: String,
    pub records: Vec<MemoryRecord>,
}
