//! Pipeline Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::logic::policy::Decision;
use crate::logic::threat::ThreatVerdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Received,
    Scored,
    Recalled,
    Planned,
    Reviewed,
    Executed,
    Suppressed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Executed | PipelineState::Suppressed)
    }
}

/// Diagnostic record of one event's trip through the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub event_id: String,
    pub state: PipelineState,
    /// Every state visited, in order
    pub trail: Vec<PipelineState>,
    pub verdict: Option<ThreatVerdict>,
    pub decision: Option<Decision>,
    /// Effectiveness passed to memory learn
    pub effectiveness: Option<f64>,
    /// `kind: message` of the error that suppressed the event
    pub error: Option<String>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl PipelineOutcome {
    pub fn received(event_id: &str) -> Self {
        Self {
            event_id: event_id.to_string(),
            state: PipelineState::Received,
            trail: vec![PipelineState::Received],
            verdict: None,
            decision: None,
            effectiveness: None,
            error: None,
            finished_at: None,
        }
    }

    pub fn advance(&mut self, state: PipelineState) {
        self.state = state;
        self.trail.push(state);
        if state.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
    }

    pub fn fail(&mut self, err: &PipelineError) {
        self.error = Some(format!("{}: {}", err.kind(), err));
        self.advance(PipelineState::Suppressed);
    }

    /// The approved decision, only when the action was handed off
    pub fn executed_decision(&self) -> Option<&Decision> {
        match self.state {
            PipelineState::Executed => self.decision.as_ref(),
            _ => None,
        }
    }
}

/// Running counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub received: u64,
    pub threats: u64,
    pub executed: u64,
    pub suppressed: u64,
    /// Verdicts the review quorum turned down
    pub rejected: u64,
    pub errors: u64,
}

impl PipelineStats {
    pub fn record(&mut self, outcome: &PipelineOutcome) {
        self.received += 1;
        if outcome.verdict.is_some() {
            self.threats += 1;
        }
        match outcome.state {
            PipelineState::Executed => self.executed += 1,
            _ => self.suppressed += 1,
        }
        if outcome.error.is_some() {
            self.errors += 1;
        } else if outcome.decision.as_ref().map_or(false, |d| !d.approved) {
            self.rejected += 1;
        }
    }
}
