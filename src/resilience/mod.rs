//! Resilience helpers.
//!
//! # Data Flow
//! ```text
//! Route apply attempt fails or does not verify:
//!     → backoff.rs (exponential delay with jitter)
//!     → next attempt, up to route.max_attempts
//! ```

pub mod backoff;
