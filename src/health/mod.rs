//! Health evaluation subsystem.
//!
//! # Data Flow
//! ```text
//! probe runner (probe/runner.rs)
//!     → ProbeSample over the coordinator's sample channel
//!     → evaluator.rs (per-interface debounce)
//!     → HealthTransition, only when the verdict changes
//!     → coordinator re-runs gateway selection
//! ```
//!
//! # Design Decisions
//! - State transitions require consecutive identical samples (hysteresis)
//! - One evaluator per interface, keyed by interface name
//! - Evaluators are plain values mutated only by the coordinator loop

pub mod evaluator;
pub mod state;

pub use evaluator::HealthEvaluator;
pub use state::{HealthState, HealthTransition};
