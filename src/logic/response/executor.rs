//! Executors - enforcement hand-off
//!
//! The pipeline calls `Executor::apply` for every approved action and learns
//! from the effectiveness it reports.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::types::CandidateAction;
use crate::error::PipelineResult;

pub trait Executor: Send + Sync {
    fn name(&self) -> &str;

    /// Enforce (or schedule) `action`; returns effectiveness in [0, 1]
    fn apply(&self, action: &CandidateAction) -> PipelineResult<f64>;
}

// ============================================================================
// SCHEDULED EXECUTOR
// ============================================================================

/// Action waiting for its reveal time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledAction {
    pub action: CandidateAction,
    pub release_at: DateTime<Utc>,
    pub scheduled_at: DateTime<Utc>,
}

/// Holds approved actions until their commitment reveal time.
/// Actions without a commitment are due immediately.
#[derive(Default)]
pub struct ScheduledExecutor {
    pending: Mutex<Vec<ScheduledAction>>,
}

impl ScheduledExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Remove and return every action enforceable at `now`, earliest first
    pub fn take_due(&self, now: DateTime<Utc>) -> Vec<ScheduledAction> {
        let mut pending = self.pending.lock();
        let (mut due, waiting): (Vec<_>, Vec<_>) =
            pending.drain(..).partition(|s| s.release_at <= now);
        *pending = waiting;
        due.sort_by_key(|s| s.release_at);
        due
    }
}

impl Executor for ScheduledExecutor {
    fn name(&self) -> &str {
        "scheduled"
    }

    fn apply(&self, action: &CandidateAction) -> PipelineResult<f64> {
        let now = Utc::now();
        let release_at = action
            .activation_commitment
            .as_ref()
            .map_or(now, |c| c.reveal_time);

        log::info!("Scheduled {} (release at {})", action.description(), release_at);
        self.pending.lock().push(ScheduledAction {
            action: action.clone(),
            release_at,
            scheduled_at: now,
        });

        Ok(action.kind.default_effectiveness())
    }
}
