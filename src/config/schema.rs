//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the portal.
//! All types derive Serde traits for deserialization from config files;
//! environment variables are layered on top by the loader.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Deployment environment, taken from `NODE_ENV`.
///
/// Anything other than `production` or `test` is treated as development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Environment {
    Production,
    Test,
    #[default]
    Development,
}

impl Environment {
    /// Parse a `NODE_ENV` style value.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    pub fn is_test(self) -> bool {
        self == Environment::Test
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Test => "test",
            Environment::Development => "development",
        }
    }
}

impl From<String> for Environment {
    fn from(value: String) -> Self {
        Environment::from_name(&value)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root configuration for the admin portal.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment environment (pool sizing, TLS, cookie security).
    pub environment: Environment,

    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Database pool and startup probe settings.
    pub database: DatabaseConfig,

    /// Admin session cookie settings.
    pub session: SessionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Database configuration.
///
/// Pool sizes left unset fall back to the environment defaults
/// (production 5..=20, otherwise 2..=10).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string. Normally supplied via `DATABASE_URL`.
    pub url: String,

    /// Override for the maximum pool size.
    pub max_connections: Option<u32>,

    /// Override for the minimum pool size.
    pub min_connections: Option<u32>,

    /// Idle connections are closed after this many seconds.
    pub idle_timeout_secs: u64,

    /// Time allowed to obtain a connection, in milliseconds.
    pub connect_timeout_ms: u64,

    /// Physical connections are retired after this many checkouts.
    pub max_uses: u32,

    /// Startup connectivity probe attempts.
    pub probe_attempts: u32,

    /// Fixed delay between probe attempts, in milliseconds.
    pub probe_backoff_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: None,
            min_connections: None,
            idle_timeout_secs: 30,
            connect_timeout_ms: 2000,
            max_uses: 7500,
            probe_attempts: 3,
            probe_backoff_ms: 1000,
        }
    }
}

/// Admin session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie name.
    pub cookie_name: String,

    /// Cookie path.
    pub path: String,

    /// Force the `Secure` flag on or off. Unset means "production only".
    pub secure: Option<bool>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "admin_session".to_string(),
            path: "/".to_string(),
            secure: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_from_node_env() {
        assert_eq!(Environment::from_name("production"), Environment::Production);
        assert_eq!(Environment::from_name(" Production "), Environment::Production);
        assert_eq!(Environment::from_name("test"), Environment::Test);
        assert_eq!(Environment::from_name("staging"), Environment::Development);
        assert_eq!(Environment::from_name(""), Environment::Development);
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.database.idle_timeout_secs, 30);
        assert_eq!(config.database.connect_timeout_ms, 2000);
        assert_eq!(config.database.max_uses, 7500);
        assert_eq!(config.database.probe_attempts, 3);
        assert_eq!(config.database.probe_backoff_ms, 1000);
        assert_eq!(config.session.cookie_name, "admin_session");
        assert_eq!(config.session.path, "/");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            environment = "production"

            [database]
            probe_attempts = 5
            "#,
        )
        .unwrap();

        assert!(config.environment.is_production());
        assert_eq!(config.database.probe_attempts, 5);
        assert_eq!(config.database.max_uses, 7500);
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
    }
}
