//! Event Ingress
//!
//! Immutable event records handed in by the ingestion collaborator.
//! Feature keys are caller-defined; values must be finite.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Feature map of an event (key -> value)
pub type Features = HashMap<String, f64>;

/// One observed record, e.g. a ledger transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub observed_at: DateTime<Utc>,
    pub features: Features,
}

impl Event {
    pub fn new(id: impl Into<String>, features: Features) -> Self {
        Self {
            id: id.into(),
            observed_at: Utc::now(),
            features,
        }
    }

    /// Builder-style helper for tests and the demo
    pub fn with_feature(mut self, key: &str, value: f64) -> Self {
        self.features.insert(key.to_string(), value);
        self
    }

    /// Reject empty ids and non-finite feature values
    pub fn validate(&self) -> PipelineResult<()> {
        if self.id.trim().is_empty() {
            return Err(PipelineError::Validation("event id is empty".to_string()));
        }

        for (key, value) in &self.features {
            if key.is_empty() {
                return Err(PipelineError::Validation(format!(
                    "event {} has an empty feature key",
                    self.id
                )));
            }
            if !value.is_finite() {
                return Err(PipelineError::Validation(format!(
                    "event {}: feature '{}' is not finite ({})",
                    self.id, key, value
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
