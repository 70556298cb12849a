//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env.local / .env (dotenvy, at process start)
//!     → optional TOML file (loader.rs)
//!     → environment overlay: DATABASE_URL, NODE_ENV, BIND_ADDRESS
//!     → DATABASE_URL presence check (fatal when absent)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup and never reloaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, ConfigError};
pub use schema::{
    AppConfig, DatabaseConfig, Environment, ListenerConfig, ObservabilityConfig, SessionConfig,
};
pub use validation::ValidationError;
