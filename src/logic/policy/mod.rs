//! Policy Module
//!
//! Independent review of every candidate action before it is executed.
//! Reviewers can approve, reject, or moderate (down-scope) an action; a
//! sampled quorum of them decides, and silence counts as rejection.
//!
//! ## Structure
//! - `types`: `Decision`
//! - `config`: `PolicyConfig`
//! - `rules`: non-harm rules (`NonHarmRule` trait + built-ins)
//! - `engine`: `PolicyReviewer` trait, `RegulatoryReviewer`, moderation
//! - `quorum`: `ReviewBoard` (parallel review, fail-closed) and aggregation
//!
//! ## Usage
//! ```ignore
//! let board = ReviewBoard::from_config(&config)?;
//! let decision = board.review(&verdict, &candidate).await;
//! if decision.approved {
//!     executor.apply(&decision.action)?;
//! }
//! ```

pub mod types;
pub mod config;
pub mod rules;
pub mod engine;
pub mod quorum;

pub use types::Decision;
pub use config::PolicyConfig;
pub use rules::{
    NonHarmRule, IrreversibleHarmRule, CollectivePunishmentRule, RedemptionPathRule,
    ProportionalityRule, default_rules, check_violations,
};
pub use engine::{PolicyReviewer, RegulatoryReviewer, moderate};
pub use quorum::{ReviewBoard, aggregate, majority_reached, REGULATORY_REJECTION};
