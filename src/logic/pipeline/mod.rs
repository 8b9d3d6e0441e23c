//! Pipeline Module - event orchestration
//!
//! Sequences one event through detection, memory recall, planning, review,
//! execution hand-off and memory learn. Each stage fans out internally and
//! fans back in before the next one starts.
//!
//! States: `Received → Scored → (Recalled) → Planned → Reviewed → {Executed | Suppressed}`

pub mod types;
pub mod orchestrator;


pub use types::{PipelineState, PipelineOutcome, PipelineStats};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
