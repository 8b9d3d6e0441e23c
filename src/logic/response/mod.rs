//! Response Module - countermeasure synthesis and hand-off
//!
//! # Components
//! - `types.rs`: `ActionKind`, `CandidateAction`, `Commitment`
//! - `planner.rs`: `ResponsePlanner` (verdict + memory hint -> candidate)
//! - `executor.rs`: `Executor` trait and the reveal-time `ScheduledExecutor`

pub mod types;
pub mod planner;
pub mod executor;

pub use types::{ActionKind, CandidateAction, Commitment};
pub use planner::ResponsePlanner;
pub use executor::{Executor, ScheduledExecutor, ScheduledAction};
