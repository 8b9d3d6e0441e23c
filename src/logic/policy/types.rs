//! Policy Types
//!
//! No logic here - data structures only.

use serde::{Deserialize, Serialize};

use crate::logic::response::CandidateAction;

/// Outcome of a review, from one reviewer or the whole quorum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub approved: bool,
    pub moderated: bool,
    pub reason: String,
    /// The candidate, or its moderated copy
    pub action: CandidateAction,
    /// Names of violated non-harm rules
    pub violations: Vec<String>,
    pub reviewer: Option<String>,
    /// Individual decisions; filled on quorum rejection
    pub collected: Vec<Decision>,
}

impl Decision {
    pub fn approve(action: CandidateAction, reason: &str) -> Self {
        Self {
            approved: true,
            moderated: false,
            reason: reason.to_string(),
            action,
            violations: vec![],
            reviewer: None,
            collected: vec![],
        }
    }

    pub fn moderate(action: CandidateAction, reason: &str) -> Self {
        Self {
            moderated: true,
            ..Self::approve(action, reason)
        }
    }

    pub fn reject(action: CandidateAction, reason: &str, violations: Vec<String>) -> Self {
        Self {
            approved: false,
            moderated: false,
            reason: reason.to_string(),
            action,
            violations,
            reviewer: None,
            collected: vec![],
        }
    }

    pub fn by(mut self, reviewer: &str) -> Self {
        self.reviewer = Some(reviewer.to_string());
        self
    }

    /// True if any violation name starts with `rule`
    pub fn violated(&self, rule: &str) -> bool {
        self.violations.iter().any(|v| v.starts_with(rule))
    }
}
