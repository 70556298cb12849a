//! Pool sizing and connection options per deployment environment.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::config::{AppConfig, Environment};
use crate::resilience::RetryPolicy;

const PRODUCTION_MAX_CONNECTIONS: u32 = 20;
const PRODUCTION_MIN_CONNECTIONS: u32 = 5;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 2;

/// Everything the pool manager needs, resolved from configuration.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub database_url: String,
    pub environment: Environment,
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
    pub max_uses: u32,
    pub ssl_mode: PgSslMode,
    pub probe: RetryPolicy,
}

impl PoolSettings {
    /// Resolve settings, applying the environment's pool size defaults
    /// where the config leaves them unset.
    pub fn from_config(config: &AppConfig) -> Self {
        let db = &config.database;
        let (default_max, default_min) = if config.environment.is_production() {
            (PRODUCTION_MAX_CONNECTIONS, PRODUCTION_MIN_CONNECTIONS)
        } else {
            (DEFAULT_MAX_CONNECTIONS, DEFAULT_MIN_CONNECTIONS)
        };

        // Production requires TLS but does not verify the server certificate.
        let ssl_mode = if config.environment.is_production() {
            PgSslMode::Require
        } else {
            PgSslMode::Disable
        };

        Self {
            database_url: db.url.clone(),
            environment: config.environment,
            max_connections: db.max_connections.unwrap_or(default_max),
            min_connections: db.min_connections.unwrap_or(default_min),
            idle_timeout: Duration::from_secs(db.idle_timeout_secs),
            acquire_timeout: Duration::from_millis(db.connect_timeout_ms),
            max_uses: db.max_uses,
            ssl_mode,
            probe: RetryPolicy::new(
                db.probe_attempts,
                Duration::from_millis(db.probe_backoff_ms),
            ),
        }
    }

    /// Parse the connection string and apply the TLS mode.
    ///
    /// The environment's TLS mode always wins over any `sslmode` in the URL.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        Ok(PgConnectOptions::from_str(&self.database_url)?.ssl_mode(self.ssl_mode))
    }
}

/// Render a connection string with its password masked, for logs.
pub fn redact_database_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.to_string()
        }
        Err(_) => "<unparseable>".to_string(),
    }
}
