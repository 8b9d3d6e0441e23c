//! Memory Bank - sharded stores
//!
//! Learn routes each signature to exactly one shard. Recall asks every
//! shard in parallel (fuzzy matches may live anywhere) and keeps the hint
//! with the best effectiveness.

use std::sync::Arc;

use super::signature::signature_of;
use super::store::MemoryStore;
use super::types::{MemoryExport, MemoryHint, MemoryRecord, Signature};
use crate::error::{PipelineError, PipelineResult};
use crate::logic::config::PipelineConfig;
use crate::logic::threat::ThreatVerdict;

#[derive(Clone)]
pub struct MemoryBank {
    shards: Vec<Arc<MemoryStore>>,
}

impl MemoryBank {
    pub fn new(shards: Vec<Arc<MemoryStore>>) -> PipelineResult<Self> {
        if shards.is_empty() {
            return Err(PipelineError::Configuration(
                "memory bank needs at least one store".to_string(),
            ));
        }
        Ok(Self { shards })
    }

    pub fn single(store: Arc<MemoryStore>) -> Self {
        Self { shards: vec![store] }
    }

    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Self> {
        let shards = (0..config.memory_shards)
            .map(|_| Arc::new(MemoryStore::from_config(config)))
            .collect();
        Self::new(shards)
    }

    pub fn shards(&self) -> &[Arc<MemoryStore>] {
        &self.shards
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|s| s.is_empty())
    }

    fn shard_for(&self, verdict: &ThreatVerdict) -> &Arc<MemoryStore> {
        let idx = signature_of(&verdict.features).shard_index(self.shards.len());
        &self.shards[idx]
    }

    /// Best hint across all shards; no side effects
    pub async fn recall(&self, verdict: &ThreatVerdict) -> Option<MemoryHint> {
        if self.shards.len() == 1 {
            return self.shards[0].recall_hint(verdict);
        }

        let exact = signature_of(&verdict.features);
        let verdict = Arc::new(verdict.clone());
        let tasks: Vec<_> = self
            .shards
            .iter()
            .map(|shard| {
                let shard = Arc::clone(shard);
                let verdict = Arc::clone(&verdict);
                tokio::task::spawn_blocking(move || shard.recall_hint(&verdict))
            })
            .collect();

        let mut best: Option<MemoryHint> = None;
        for task in tasks {
            match task.await {
                Ok(Some(hint)) => {
                    let better = best.as_ref().map_or(true, |b| outranks(&hint, b, &exact));
                    if better {
                        best = Some(hint);
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("Memory shard recall failed: {}", e),
            }
        }
        best
    }

    pub fn learn(&self, verdict: &ThreatVerdict, effectiveness: f64) -> PipelineResult<MemoryRecord> {
        self.shard_for(verdict).learn(verdict, effectiveness)
    }

    /// One export per shard
    pub fn export(&self) -> Vec<MemoryExport> {
        self.shards.iter().map(|s| s.export()).collect()
    }
}

/// Higher effectiveness first; ties go to the exact signature, then the lowest one
fn outranks(hint: &MemoryHint, best: &MemoryHint, exact: &Signature) -> bool {
    if hint.effectiveness != best.effectiveness {
        return hint.effectiveness > best.effectiveness;
    }
    match (&hint.signature == exact, &best.signature == exact) {
        (true, false) => true,
        (false, true) => false,
        _ => hint.signature < best.signature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::events::Features;
    use crate::logic::memory::{Fingerprint, FingerprintComparator};
    use chrono::Utc;

    /// Every stored fingerprint counts as similar
    struct AlwaysClose;

    impl FingerprintComparator for AlwaysClose {
        fn name(&self) -> &str {
            "always_close"
        }

        fn similarity(&self, _a: &Fingerprint, _b: &Fingerprint) -> f64 {
            0.9
        }
    }

    fn verdict(value: f64) -> ThreatVerdict {
        let mut features = Features::new();
        features.insert("smart_contract_risk".to_string(), value);
        ThreatVerdict {
            event_id: format!("tx-{}", value),
            observed_at: Utc::now(),
            score: 0.9,
            features,
            is_threat: true,
            votes: 50,
            responded: 50,
        }
    }

    #[test]
    fn test_empty_bank_rejected() {
        assert!(matches!(MemoryBank::new(vec![]), Err(PipelineError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_sharded_learn_and_recall() {
        let config = PipelineConfig {
            memory_shards: 4,
            ..Default::default()
        };
        let bank = MemoryBank::from_config(&config).unwrap();

        // One record per fingerprint bucket
        for i in 0..10 {
            bank.learn(&verdict(i as f64 * 10.0), 0.8).unwrap();
        }
        assert_eq!(bank.len(), 10);
        assert_eq!(bank.export().len(), 4);

        let v = verdict(30.0);
        bank.learn(&v, 0.8).unwrap();
        let hint = bank.recall(&v).await.expect("known signature");
        assert_eq!(hint.occurrence_count, 2);
        assert_eq!(hint.signature, signature_of(&v.features));
    }

    #[tokio::test]
    async fn test_cross_shard_fuzzy_tie_goes_to_lowest_signature() {
        let shards: Vec<Arc<MemoryStore>> = (0..2)
            .map(|_| Arc::new(MemoryStore::with_comparator(Arc::new(AlwaysClose), 0.85, 8)))
            .collect();
        let bank = MemoryBank::new(shards).unwrap();

        let a = verdict(10.0);
        let b = verdict(50.0);
        let (low, high) = if signature_of(&a.features) < signature_of(&b.features) {
            (a, b)
        } else {
            (b, a)
        };

        // Higher signature in the first shard, so shard order alone would pick it
        bank.shards()[0].learn(&high, 0.5).unwrap();
        bank.shards()[1].learn(&low, 0.5).unwrap();

        let unseen = verdict(90.0);
        let hint = bank.recall(&unseen).await.expect("fuzzy match");
        assert_eq!(hint.signature, signature_of(&low.features));
    }
}
