//! Startup connectivity probe.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

const PROBE_QUERY: &str = "SELECT NOW() AS current_time, version() AS version";

/// Result of a successful probe. Logged, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub current_time: DateTime<Utc>,
    pub version: String,
}

impl ProbeReport {
    /// First word of the server version string, e.g. `PostgreSQL`.
    pub fn product(&self) -> &str {
        self.version.split_whitespace().next().unwrap_or("")
    }
}

/// Issue the probe query through the pool.
pub async fn probe(pool: &PgPool) -> Result<ProbeReport, sqlx::Error> {
    let (current_time, version): (DateTime<Utc>, String) =
        sqlx::query_as(PROBE_QUERY).fetch_one(pool).await?;

    Ok(ProbeReport {
        current_time,
        version,
    })
}
