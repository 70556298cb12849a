pub mod handlers;
pub mod session;

use axum::{
    routing::{get, post},
    Router,
};
use crate::http::server::AppState;
use self::handlers::*;

pub use session::{SameSite, SessionCookie};

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/api/admin/logout", post(logout))
        .route("/api/admin/status", get(get_status))
        .with_state(state)
}
