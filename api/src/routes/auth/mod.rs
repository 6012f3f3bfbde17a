//! `/auth` routes: credential login and token verification.

pub mod get;
pub mod post;

use crate::auth::guards::allow_authenticated;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use util::state::AppState;

/// - `POST /auth/login` → `login`
/// - `GET /auth/verify` → `verify` (authenticated)
pub fn auth_routes(app_state: AppState) -> Router<AppState> {
    Router::new().route("/login", post(post::login)).route(
        "/verify",
        get(get::verify).route_layer(from_fn_with_state(app_state, allow_authenticated)),
    )
}
