//! Immune Core - adaptive threat detection and response
//!
//! A population of stochastic scorers votes on each event; confirmed threats
//! are matched against long-term memory, turned into a candidate action,
//! reviewed by an independent quorum and handed to an executor. Outcomes
//! feed back into memory so repeat offenders are handled faster.

pub mod constants;
pub mod error;
pub mod logic;

pub use error::{PipelineError, PipelineResult};
pub use logic::config::PipelineConfig;
pub use logic::events::{Event, Features};
pub use logic::memory::{MemoryBank, MemoryStore};
pub use logic::pipeline::{Orchestrator, PipelineOutcome, PipelineState, PipelineStats};
pub use logic::policy::Decision;
pub use logic::response::{CandidateAction, Executor, ScheduledExecutor};
