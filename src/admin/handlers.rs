use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use serde::Serialize;

use crate::admin::session::SessionCookie;
use crate::db::PoolStatus;
use crate::http::server::AppState;
use crate::observability::metrics;

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub environment: &'static str,
    pub database: PoolStatus,
}

/// Clear the admin session cookie.
///
/// Reads nothing from the request and cannot fail, so repeated calls
/// produce the same response whether or not a session existed.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = SessionCookie::cleared(&state.session, state.environment);

    metrics::record_logout();
    tracing::info!(cookie = %cookie.name, "Admin session cleared");

    (
        StatusCode::OK,
        AppendHeaders([(header::SET_COOKIE, cookie.to_string())]),
        Json(LogoutResponse { success: true }),
    )
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        environment: state.environment.as_str(),
        database: state.db.status(),
    })
}
