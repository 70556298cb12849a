//! Database connection pool subsystem.
//!
//! # Data Flow
//! ```text
//! AppConfig
//!     → settings.rs (environment sizing, TLS mode, timeouts, max uses)
//!     → pool.rs (lazy PgPool + lifecycle state)
//!     → probe.rs via resilience::retry (startup connectivity check)
//!     → Ready: handlers check out PooledConnection guards
//!
//! Pool hooks:
//!     after_connect → usage.rs register(pid)
//!     after_release → usage.rs record_use(pid) → keep or retire
//!
//! Shutdown (driven by lifecycle):
//!     Ready → Draining → pool.close() → Terminated
//! ```

pub mod error;
pub mod pool;
pub mod probe;
pub mod settings;
pub mod usage;

pub use error::DbError;
pub use pool::{PoolManager, PoolState, PoolStatus, PooledConnection};
pub use probe::ProbeReport;
pub use settings::{redact_database_url, PoolSettings};
