//! Threat Module
//!
//! Turns an event's feature map into a `ThreatVerdict` by quorum vote over a
//! random sample of independent scorers.
//!
//! ## Structure
//! - `types`: `ThreatVerdict`
//! - `layout`: default feature channels for the sampling scorer
//! - `scorer`: `ThreatScorer` trait + bounded-trial `SamplingScorer`
//! - `rules`: quorum arithmetic
//! - `pool`: `DetectorPool` (parallel fan-out with timeout)
//!
//! ## Usage
//! ```ignore
//! let pool = DetectorPool::from_config(&config)?;
//! match pool.evaluate(&event).await? {
//!     Some(verdict) => plan_response(verdict),
//!     None => {} // clean, pipeline stops here
//! }
//! ```

pub mod types;
pub mod layout;
pub mod scorer;
pub mod rules;
pub mod pool;

pub use types::ThreatVerdict;
pub use layout::FEATURE_LAYOUT;
pub use scorer::{ThreatScorer, SamplingScorer};
pub use rules::{quorum_size, QuorumTally};
pub use pool::DetectorPool;
