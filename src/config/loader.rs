//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{AppConfig, Environment};
use crate::config::validation::{validate_config, ValidationError};

/// Required connection string.
pub const DATABASE_URL: &str = "DATABASE_URL";
/// Deployment mode: production, test, anything else.
pub const NODE_ENV: &str = "NODE_ENV";
/// Optional listener address override.
pub const BIND_ADDRESS: &str = "BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("DATABASE_URL environment variable is not set")]
    MissingDatabaseUrl,

    #[error(
        "Validation failed: {}",
        .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    )]
    Validation(Vec<ValidationError>),
}

/// Build the runtime configuration: optional file, then environment.
///
/// `lookup` resolves environment variables; the binary passes
/// `std::env::var`, tests pass a map. The connection string is checked
/// before anything else is validated.
pub fn load<F>(path: Option<&Path>, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let base = match path {
        Some(path) => toml::from_str(&fs::read_to_string(path)?)?,
        None => AppConfig::default(),
    };

    let config = apply_env(base, lookup);
    if config.database.url.trim().is_empty() {
        return Err(ConfigError::MissingDatabaseUrl);
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment variables onto a configuration.
pub fn apply_env<F>(mut config: AppConfig, lookup: F) -> AppConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(DATABASE_URL) {
        config.database.url = url;
    }
    if let Some(mode) = lookup(NODE_ENV) {
        config.environment = Environment::from_name(&mode);
    }
    if let Some(addr) = lookup(BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_database_url_fails_first() {
        // An invalid bind address would also fail validation; the missing URL wins.
        let err = load(
            None,
            env(&[(NODE_ENV, "production"), (BIND_ADDRESS, "nope")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingDatabaseUrl));
    }

    #[test]
    fn blank_database_url_counts_as_missing() {
        let err = load(None, env(&[(DATABASE_URL, "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingDatabaseUrl));
    }

    #[test]
    fn environment_overlay() {
        let config = load(
            None,
            env(&[
                (DATABASE_URL, "postgres://localhost/portal"),
                (NODE_ENV, "production"),
                (BIND_ADDRESS, "127.0.0.1:4000"),
            ]),
        )
        .unwrap();

        assert_eq!(config.database.url, "postgres://localhost/portal");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.listener.bind_address, "127.0.0.1:4000");
    }

    #[test]
    fn unknown_node_env_is_development() {
        let config = load(
            None,
            env(&[(DATABASE_URL, "postgres://localhost/portal"), (NODE_ENV, "staging")]),
        )
        .unwrap();
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn validation_errors_are_joined() {
        let err = load(
            None,
            env(&[(DATABASE_URL, "postgres://localhost/portal"), (BIND_ADDRESS, "nope")]),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: invalid bind address: nope");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load(
            Some(Path::new("/nonexistent/admin-portal.toml")),
            env(&[(DATABASE_URL, "postgres://localhost/portal")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
