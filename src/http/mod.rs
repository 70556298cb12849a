//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: request ID, trace, timeout)
//!     → /api/admin/* → admin handlers
//!     → /health → liveness
//!     → Send to client
//! ```

pub mod server;

pub use server::{AppState, HttpServer};
