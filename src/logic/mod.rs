//! Logic Module - detection & response engines
//!
//! ## Flow
//! `events` → `threat` (detector quorum) → `memory` (recall) → `response`
//! (planner) → `policy` (review quorum) → executor → `memory` (learn).
//! `pipeline` sequences the stages per event.

// Ingress + setup
pub mod events;
pub mod config;

// Stages
pub mod threat;
pub mod memory;
pub mod response;
pub mod policy;

// Orchestration
pub mod pipeline;
