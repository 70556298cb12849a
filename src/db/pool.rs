//! Process-wide PostgreSQL connection pool manager.
//!
//! Wraps a lazily connecting sqlx `PgPool` with an explicit lifecycle:
//!
//! ```text
//! Uninitialized → Initializing (probe + retry) → Ready → Draining → Terminated
//! ```
//!
//! Connections can only be checked out while Ready. Production never reaches
//! Ready without a successful probe; other environments tolerate an
//! unreachable database so local iteration is not blocked.
//!
//! Use limits are enforced from the pool's release hook, which asks the
//! server for the connection's backend PID. Every checkout therefore costs
//! one extra `SELECT pg_backend_pid()` round trip when it is returned. That
//! query also serves as the liveness check, so `test_before_acquire` is off.

use std::fmt;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::Serialize;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::Postgres;

use crate::db::error::{log_pool_error, DbError};
use crate::db::probe::{self, ProbeReport};
use crate::db::settings::PoolSettings;
use crate::db::usage::{BackendPid, UsageLedger};
use crate::observability::metrics;
use crate::resilience::{retry, Exhausted};

/// Lifecycle state of the pool manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PoolState {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
    Draining = 3,
    Terminated = 4,
}

impl PoolState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => PoolState::Uninitialized,
            1 => PoolState::Initializing,
            2 => PoolState::Ready,
            3 => PoolState::Draining,
            _ => PoolState::Terminated,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PoolState::Uninitialized => "uninitialized",
            PoolState::Initializing => "initializing",
            PoolState::Ready => "ready",
            PoolState::Draining => "draining",
            PoolState::Terminated => "terminated",
        }
    }
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of the pool, served by the admin status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub state: PoolState,
    pub size: u32,
    pub idle: usize,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Owner of the shared pool and its lifecycle.
pub struct PoolManager {
    pool: PgPool,
    settings: PoolSettings,
    ledger: Arc<UsageLedger>,
    state: AtomicU8,
}

impl PoolManager {
    /// Build the pool without touching the network.
    pub fn new(settings: PoolSettings) -> Result<Self, DbError> {
        let ledger = Arc::new(UsageLedger::new(settings.max_uses));
        let environment = settings.environment;
        let connect_ledger = ledger.clone();
        let release_ledger = ledger.clone();

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .idle_timeout(settings.idle_timeout)
            .acquire_timeout(settings.acquire_timeout)
            // Liveness is checked on release instead.
            .test_before_acquire(false)
            .after_connect(move |conn, _meta| {
                let ledger = connect_ledger.clone();
                Box::pin(async move {
                    let pid = backend_pid(conn).await?;
                    ledger.register(pid);
                    if !environment.is_production() {
                        tracing::debug!(pid, "New database client connected");
                    }
                    Ok(())
                })
            })
            .after_release(move |conn, _meta| {
                let ledger = release_ledger.clone();
                Box::pin(async move {
                    match backend_pid(conn).await {
                        Ok(pid) => {
                            let keep = ledger.record_use(pid);
                            if !keep {
                                tracing::debug!(pid, "Retiring connection after max uses");
                                metrics::record_connection_retired();
                            }
                            Ok(keep)
                        }
                        Err(err) => {
                            log_pool_error(&err, environment);
                            Ok(false)
                        }
                    }
                })
            })
            .connect_lazy_with(settings.connect_options()?);

        Ok(Self {
            pool,
            settings,
            ledger,
            state: AtomicU8::new(PoolState::Uninitialized as u8),
        })
    }

    pub fn state(&self) -> PoolState {
        PoolState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            state: self.state(),
            size: self.pool.size(),
            idle: self.pool.num_idle(),
            max_connections: self.settings.max_connections,
            min_connections: self.settings.min_connections,
        }
    }

    /// Probe connectivity and move to Ready.
    pub async fn initialize(&self) -> Result<(), DbError> {
        let pool = self.pool.clone();
        self.initialize_with(move || {
            let pool = pool.clone();
            async move { probe::probe(&pool).await }
        })
        .await
    }

    /// [`initialize`](Self::initialize) with a caller-supplied probe.
    pub async fn initialize_with<F, Fut>(&self, mut run_probe: F) -> Result<(), DbError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ProbeReport, sqlx::Error>>,
    {
        if let Err(current) = self.transition(PoolState::Uninitialized, PoolState::Initializing) {
            return Err(DbError::AlreadyInitialized(current));
        }

        let environment = self.settings.environment;
        if environment.is_test() {
            tracing::debug!("Connectivity probe skipped in test mode");
            return self.mark_ready();
        }

        let policy = self.settings.probe;
        let max_attempts = policy.max_attempts.max(1);
        let outcome = retry(&policy, |attempt| {
            let pending = run_probe();
            async move {
                let result = pending.await;
                metrics::record_probe_attempt(result.is_ok());
                if let Err(err) = &result {
                    tracing::error!(
                        attempt,
                        max_attempts,
                        error = %err,
                        "Failed to connect to PostgreSQL"
                    );
                }
                result
            }
        })
        .await;

        match outcome {
            Ok(report) => {
                tracing::info!(
                    version = report.product(),
                    connection_time = %report.current_time,
                    "PostgreSQL connected"
                );
                self.mark_ready()
            }
            Err(Exhausted {
                attempts,
                last_error,
            }) => {
                tracing::warn!("Please ensure PostgreSQL is installed and running");
                tracing::warn!("Check DATABASE_URL in your environment or .env.local file");

                if environment.is_production() {
                    // A concurrent shutdown already owns the teardown.
                    if self
                        .transition(PoolState::Initializing, PoolState::Draining)
                        .is_ok()
                    {
                        self.pool.close().await;
                        self.set_state(PoolState::Terminated);
                    }
                    return Err(DbError::Unreachable {
                        attempts,
                        source: last_error,
                    });
                }

                tracing::warn!(
                    attempts,
                    "Continuing without a confirmed database connection"
                );
                self.mark_ready()
            }
        }
    }

    /// Check out a connection. It returns to the pool when the guard drops.
    pub async fn acquire(&self) -> Result<PooledConnection, DbError> {
        match self.state() {
            PoolState::Ready => {}
            PoolState::Draining | PoolState::Terminated => return Err(DbError::Closed),
            state => return Err(DbError::NotReady(state)),
        }

        match self.pool.acquire().await {
            Ok(inner) => Ok(PooledConnection { inner }),
            Err(sqlx::Error::PoolClosed) => Err(DbError::Closed),
            Err(err) => {
                log_pool_error(&err, self.settings.environment);
                Err(DbError::Sqlx(err))
            }
        }
    }

    /// Close every pooled connection. Later calls are no-ops.
    ///
    /// Waits for checked-out connections to be returned before closing them.
    pub async fn shutdown(&self) {
        let claimed = self
            .state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |raw| {
                match PoolState::from_u8(raw) {
                    PoolState::Draining | PoolState::Terminated => None,
                    _ => Some(PoolState::Draining as u8),
                }
            });
        if claimed.is_err() {
            tracing::debug!("Database pool shutdown already in progress");
            return;
        }
        metrics::record_pool_state(PoolState::Draining);

        tracing::info!("Shutting down database pool");
        self.pool.close().await;
        self.set_state(PoolState::Terminated);
        tracing::info!(
            tracked_connections = self.ledger.tracked(),
            "Database pool closed"
        );
    }

    /// Finish initialization unless shutdown started in the meantime.
    fn mark_ready(&self) -> Result<(), DbError> {
        match self.transition(PoolState::Initializing, PoolState::Ready) {
            Ok(()) => {
                tracing::debug!(state = %PoolState::Ready, "Database pool state changed");
                Ok(())
            }
            Err(PoolState::Draining | PoolState::Terminated) => {
                tracing::debug!("Database pool closed during initialization");
                Err(DbError::Closed)
            }
            Err(current) => Err(DbError::NotReady(current)),
        }
    }

    fn transition(&self, from: PoolState, to: PoolState) -> Result<(), PoolState> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| metrics::record_pool_state(to))
            .map_err(PoolState::from_u8)
    }

    fn set_state(&self, state: PoolState) {
        self.state.store(state as u8, Ordering::SeqCst);
        metrics::record_pool_state(state);
        tracing::debug!(state = %state, "Database pool state changed");
    }
}

impl fmt::Debug for PoolManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolManager")
            .field("state", &self.state())
            .field("max_connections", &self.settings.max_connections)
            .field("min_connections", &self.settings.min_connections)
            .finish_non_exhaustive()
    }
}

/// A checked-out connection, returned to the pool on drop.
pub struct PooledConnection {
    inner: PoolConnection<Postgres>,
}

impl Deref for PooledConnection {
    type Target = PgConnection;

    fn deref(&self) -> &PgConnection {
        &self.inner
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut PgConnection {
        &mut self.inner
    }
}

impl fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection").finish_non_exhaustive()
    }
}

async fn backend_pid(conn: &mut PgConnection) -> Result<BackendPid, sqlx::Error> {
    sqlx::query_scalar("SELECT pg_backend_pid()")
        .fetch_one(conn)
        .await
}
