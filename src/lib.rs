//! Admin Portal Backend Library

pub mod admin;
pub mod config;
pub mod db;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::AppConfig;
pub use db::PoolManager;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
