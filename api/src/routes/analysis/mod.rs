//! `/analysis` routes: attendance analytics for one class.
//!
//! Faculty or admin only; the service additionally requires faculty to own the
//! class named by `class_id`.

pub mod common;
pub mod get;

use crate::auth::guards::allow_staff;
use axum::{Router, middleware::from_fn_with_state, routing::get};
use util::state::AppState;

/// - `GET /analysis/overview`
/// - `GET /analysis/at-risk`
/// - `GET /analysis/distribution`
/// - `GET /analysis/trend`
pub fn analysis_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/overview", get(get::overview))
        .route("/at-risk", get(get::at_risk))
        .route("/distribution", get(get::distribution))
        .route("/trend", get(get::trend))
        .route_layer(from_fn_with_state(app_state, allow_staff))
}
