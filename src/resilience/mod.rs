//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Startup connectivity probe:
//!     → retries.rs (bounded attempts, fixed backoff)
//!     → success: pool becomes Ready
//!     → exhausted: caller decides (fatal in production)
//! ```
//!
//! # Design Decisions
//! - Fixed backoff: the probe runs once per process, there is no herd to spread
//! - Connection-level recovery is left to the pool itself

pub mod retries;

pub use retries::{retry, Exhausted, RetryPolicy};
