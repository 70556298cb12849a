use std::borrow::Cow;

use sqlx::postgres::PgDatabaseError;
use thiserror::Error;

use crate::config::Environment;
use crate::db::PoolState;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database unreachable after {attempts} attempts: {source}")]
    Unreachable {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("pool already initialized (state: {0})")]
    AlreadyInitialized(PoolState),

    #[error("pool is not ready (state: {0})")]
    NotReady(PoolState),

    #[error("pool is closed")]
    Closed,

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Log a runtime pool error with whatever diagnostics it carries.
///
/// Runtime errors never terminate the process; the pool evicts and
/// replaces broken connections on its own.
pub fn log_pool_error(err: &sqlx::Error, environment: Environment) {
    let (code, detail) = diagnostics(err);
    tracing::error!(
        error = %err,
        code = code.as_deref().unwrap_or("-"),
        detail = detail.unwrap_or("-"),
        "Database connection error"
    );

    if !environment.is_production() {
        tracing::warn!("Server will continue without database connection for now");
    }
}

/// SQLSTATE code and server-supplied detail, when present.
pub fn diagnostics(err: &sqlx::Error) -> (Option<Cow<'_, str>>, Option<&str>) {
    match err.as_database_error() {
        Some(db_err) => (
            db_err.code(),
            db_err
                .try_downcast_ref::<PgDatabaseError>()
                .and_then(PgDatabaseError::detail),
        ),
        None => (None, None),
    }
}
