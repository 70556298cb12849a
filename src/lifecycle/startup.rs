//! Startup orchestration.
//!
//! # Order
//! 1. Metrics recorder (optional)
//! 2. Pool manager built lazily, then probed (may be cut short by shutdown)
//! 3. Listener bound and HTTP server started; traffic only once the pool is Ready
//! 4. On shutdown: drain HTTP, then close the pool
//!
//! Errors are returned to the entry point, which owns the exit code.

use std::io;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::{AppConfig, ConfigError};
use crate::db::{redact_database_url, DbError, PoolManager, PoolSettings};
use crate::http::HttpServer;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] io::Error),

    #[error("server error: {0}")]
    Server(#[source] io::Error),
}

impl StartupError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

/// Create the pool manager. No connection is opened yet.
pub fn build_pool(config: &AppConfig) -> Result<Arc<PoolManager>, StartupError> {
    let settings = PoolSettings::from_config(config);
    tracing::info!(
        database = %redact_database_url(&settings.database_url),
        environment = %settings.environment,
        max_connections = settings.max_connections,
        min_connections = settings.min_connections,
        max_uses = settings.max_uses,
        "Database pool configured"
    );
    Ok(Arc::new(PoolManager::new(settings)?))
}

/// Initialize the pool, serve HTTP until `shutdown` fires, then close the pool.
pub async fn run(
    config: AppConfig,
    db: Arc<PoolManager>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let initialized = tokio::select! {
        result = db.initialize() => Some(result),
        _ = shutdown.recv() => None,
    };
    match initialized {
        Some(result) => result?,
        None => {
            tracing::info!("Shutdown requested during startup");
            db.shutdown().await;
            return Ok(());
        }
    }

    let address = config.listener.bind_address.clone();
    let listener = match TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(source) => {
            db.shutdown().await;
            return Err(StartupError::Bind { address, source });
        }
    };

    let server = HttpServer::new(config, db.clone());
    let served = server.run(listener, shutdown).await;

    db.shutdown().await;
    served.map_err(StartupError::Server)
}
