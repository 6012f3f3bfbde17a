//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → liveness probe (public)
//! - `/auth` → login (public) and token verification
//! - `/sessions` → session lifecycle and per-session views (authenticated)
//! - `/analysis` → class attendance analytics (faculty or admin)

use crate::routes::{
    analysis::analysis_routes, auth::auth_routes, health::health_routes,
    sessions::sessions_routes,
};
use axum::Router;
use util::state::AppState;

pub mod analysis;
pub mod auth;
pub mod common;
pub mod health;
pub mod sessions;

/// Builds the `/api` router. Unknown methods on known paths yield `405`.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes(app_state.clone()))
        .nest("/sessions", sessions_routes(app_state.clone()))
        .nest("/analysis", analysis_routes(app_state.clone()))
        .with_state(app_state)
}
