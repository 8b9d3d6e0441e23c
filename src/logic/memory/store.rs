//! Memory Store
//!
//! Exact lookup by signature, fuzzy fallback through a comparator, and
//! optimistic learn: build the next record off-lock, publish it only if the
//! slot still holds the record it was built from.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::fingerprint::{FingerprintComparator, HammingComparator};
use super::integrity::integrity_root;
use super::signature::{fingerprint_of, signature_of};
use super::types::{MemoryExport, MemoryHint, MemoryRecord, Signature};
use crate::constants::{DEFAULT_FUZZY_THRESHOLD, DEFAULT_STORE_WRITE_RETRIES};
use crate::error::{PipelineError, PipelineResult};
use crate::logic::config::PipelineConfig;
use crate::logic::response::ActionKind;
use crate::logic::threat::ThreatVerdict;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Sightings after which memory escalates restrict -> quarantine
const ESCALATION_OCCURRENCES: u64 = 3;
const EFFECTIVENESS_BOOST: f64 = 1.2;
const STRENGTH_PER_OCCURRENCE: f64 = 0.5;
const MAX_STRENGTH: f64 = 3.0;

// ============================================================================
// STORE
// ============================================================================

pub struct MemoryStore {
    /// Ordered by signature so fuzzy recall ties break on the lowest one
    records: RwLock<BTreeMap<Signature, Arc<MemoryRecord>>>,
    comparator: Arc<dyn FingerprintComparator>,
    fuzzy_threshold: f64,
    write_retries: u32,
    /// Cached integrity root; `None` once the signature set changed
    root: Mutex<Option<String>>,
    /// Simulates a competing writer on every publish attempt
    #[cfg(test)]
    contended: std::sync::atomic::AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_THRESHOLD, DEFAULT_STORE_WRITE_RETRIES)
    }
}

impl MemoryStore {
    pub fn new(fuzzy_threshold: f64, write_retries: u32) -> Self {
        Self::with_comparator(Arc::new(HammingComparator), fuzzy_threshold, write_retries)
    }

    pub fn with_comparator(
        comparator: Arc<dyn FingerprintComparator>,
        fuzzy_threshold: f64,
        write_retries: u32,
    ) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            comparator,
            fuzzy_threshold,
            write_retries: write_retries.max(1),
            root: Mutex::new(None),
            #[cfg(test)]
            contended: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.fuzzy_similarity_threshold, config.store_write_retries)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn get(&self, signature: &Signature) -> Option<MemoryRecord> {
        self.records.read().get(signature).map(|r| (**r).clone())
    }

    pub fn comparator_name(&self) -> &str {
        self.comparator.name()
    }

    // ------------------------------------------------------------------------
    // Recall
    // ------------------------------------------------------------------------

    /// Exact match first, then the lowest-signature fuzzy match. Read-only.
    pub fn recall(&self, verdict: &ThreatVerdict) -> Option<MemoryRecord> {
        let signature = signature_of(&verdict.features);
        let records = self.records.read();

        if let Some(record) = records.get(&signature) {
            return Some((**record).clone());
        }

        let fingerprint = fingerprint_of(&verdict.features);
        records
            .values()
            .find(|record| {
                self.comparator.similarity(&fingerprint, &record.fuzzy_fingerprint)
                    >= self.fuzzy_threshold
            })
            .map(|record| {
                log::debug!(
                    "Fuzzy recall for {} matched {}",
                    verdict.event_id,
                    record.signature
                );
                (**record).clone()
            })
    }

    /// `recall` followed by `enhance`
    pub fn recall_hint(&self, verdict: &ThreatVerdict) -> Option<MemoryHint> {
        self.recall(verdict).map(|record| enhance(&record))
    }

    // ------------------------------------------------------------------------
    // Learn
    // ------------------------------------------------------------------------

    /// Record one sighting of `verdict` with the observed effectiveness.
    pub fn learn(&self, verdict: &ThreatVerdict, effectiveness: f64) -> PipelineResult<MemoryRecord> {
        let effectiveness = if effectiveness.is_finite() {
            effectiveness.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let signature = signature_of(&verdict.features);

        for attempt in 1..=self.write_retries {
            let current = self.records.read().get(&signature).cloned();

            let next = Arc::new(match &current {
                Some(record) => record.observed_again(verdict, effectiveness),
                None => MemoryRecord::first_sighting(
                    signature.clone(),
                    fingerprint_of(&verdict.features),
                    verdict,
                    effectiveness,
                ),
            });

            #[cfg(test)]
            self.interfere(&next);

            let mut records = self.records.write();
            let unchanged = match (&current, records.get(&signature)) {
                (Some(seen), Some(now)) => Arc::ptr_eq(seen, now),
                (None, None) => true,
                _ => false,
            };

            if unchanged {
                records.insert(signature.clone(), Arc::clone(&next));
                drop(records);

                if current.is_none() {
                    *self.root.lock() = None;
                    log::debug!("New threat signature {} from {}", signature, verdict.event_id);
                }
                return Ok((*next).clone());
            }

            drop(records);
            log::debug!("Write conflict on {} (attempt {})", signature, attempt);
            std::thread::yield_now();
        }

        Err(PipelineError::StoreWriteConflict {
            signature: signature.0,
            attempts: self.write_retries,
        })
    }

    #[cfg(test)]
    pub(crate) fn set_contended(&self, on: bool) {
        self.contended.store(on, std::sync::atomic::Ordering::SeqCst);
    }

    /// Swap the slot for a fresh copy so the pending publish sees a change
    #[cfg(test)]
    fn interfere(&self, pending: &MemoryRecord) {
        if self.contended.load(std::sync::atomic::Ordering::SeqCst) {
            self.records
                .write()
                .insert(pending.signature.clone(), Arc::new(pending.clone()));
        }
    }

    // ------------------------------------------------------------------------
    // Audit
    // ------------------------------------------------------------------------

    /// Current integrity root, recomputed if the signature set changed
    pub fn integrity_root(&self) -> String {
        let mut cached = self.root.lock();
        if let Some(root) = cached.as_ref() {
            return root.clone();
        }
        let root = integrity_root(self.records.read().keys());
        *cached = Some(root.clone());
        root
    }

    pub fn export(&self) -> MemoryExport {
        let integrity_root = self.integrity_root();
        let records = self.records.read().values().map(|r| (**r).clone()).collect();
        MemoryExport { integrity_root, records }
    }

    /// Replace the whole content with `records`
    pub fn restore(&self, records: Vec<MemoryRecord>) {
        let map: BTreeMap<Signature, Arc<MemoryRecord>> = records
            .into_iter()
            .map(|r| (r.signature.clone(), Arc::new(r)))
            .collect();
        *self.records.write() = map;
        *self.root.lock() = None;
    }
}

// ============================================================================
// ENHANCE
// ============================================================================

/// Planner view of a record
pub fn enhance(record: &MemoryRecord) -> MemoryHint {
    let response_type = if record.occurrence_count > ESCALATION_OCCURRENCES {
        ActionKind::Quarantine
    } else {
        ActionKind::Restrict
    };

    MemoryHint {
        signature: record.signature.clone(),
        response_type,
        effectiveness: (record.mean_effectiveness() * EFFECTIVENESS_BOOST).min(1.0),
        strength_multiplier: (record.occurrence_count as f64 * STRENGTH_PER_OCCURRENCE).min(MAX_STRENGTH),
        is_repeat_offender: true,
        occurrence_count: record.occurrence_count,
    }
}

// ============================================================================
// TESTS
// ============================================================================
