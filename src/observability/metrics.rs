//! Metrics collection and exposition.
//!
//! # Metrics
//! - `admin_logouts_total` (counter): logout requests served
//! - `db_probe_attempts_total` (counter): startup probe attempts by outcome
//! - `db_connections_retired_total` (counter): connections closed at their use limit
//! - `db_pool_state` (gauge): numeric `PoolState` (0 uninitialized .. 4 terminated)
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::db::PoolState;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_logout() {
    ::metrics::counter!("admin_logouts_total").increment(1);
}

pub fn record_probe_attempt(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    ::metrics::counter!("db_probe_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_connection_retired() {
    ::metrics::counter!("db_connections_retired_total").increment(1);
}

pub fn record_pool_state(state: PoolState) {
    ::metrics::gauge!("db_pool_state").set(state as u8 as f64);
}
