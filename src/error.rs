//! Error handling

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid setup; fatal at startup, never raised per event
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed event; rejects that event only
    #[error("validation error: {0}")]
    Validation(String),

    #[error("timeout: {stage} exceeded {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },

    /// Same-signature writers kept colliding
    #[error("store write conflict on {signature} after {attempts} attempts")]
    StoreWriteConflict { signature: String, attempts: u32 },

    #[error("scorer error: {0}")]
    Scorer(String),

    #[error("reviewer error: {0}")]
    Reviewer(String),

    #[error("executor error: {0}")]
    Executor(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("pipeline is shutting down")]
    Cancelled,
}

impl PipelineError {
    pub fn timeout(stage: &str, timeout_ms: u64) -> Self {
        PipelineError::Timeout {
            stage: stage.to_string(),
            timeout_ms,
        }
    }

    /// Short machine-readable kind, used in outcome records
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Configuration(_) => "configuration",
            PipelineError::Validation(_) => "validation",
            PipelineError::Timeout { .. } => "timeout",
            PipelineError::StoreWriteConflict { .. } => "store_write_conflict",
            PipelineError::Scorer(_) => "scorer",
            PipelineError::Reviewer(_) => "reviewer",
            PipelineError::Executor(_) => "executor",
            PipelineError::Persistence(_) => "persistence",
            PipelineError::Cancelled => "cancelled",
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Persistence(err.to_string())
    }
}
