//! `/sessions` routes: the session lifecycle and per-session views.
//!
//! Every route requires a valid bearer token; role and class ownership are
//! decided by the session service.

pub mod get;
pub mod post;

use crate::auth::guards::allow_authenticated;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use util::state::AppState;

/// - `GET /sessions` → `list_sessions`
/// - `POST /sessions` → `start_session`
/// - `GET /sessions/{session_id}` → `get_session`
/// - `GET /sessions/{session_id}/attendance` → `get_session_attendance`
/// - `POST /sessions/{session_id}/mark` → `mark_attendance`
/// - `POST /sessions/{session_id}/restart` → `restart_attendance`
pub fn sessions_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get::list_sessions).post(post::start_session))
        .route("/{session_id}", get(get::get_session))
        .route("/{session_id}/attendance", get(get::get_session_attendance))
        .route("/{session_id}/mark", post(post::mark_attendance))
        .route("/{session_id}/restart", post(post::restart_attendance))
        .route_layer(from_fn_with_state(app_state, allow_authenticated))
}
