pub mod auth;
pub mod response;
pub mod routes;

use axum::{Router, middleware::from_fn_with_state};
use tower_http::cors::CorsLayer;
use util::state::AppState;

/// Builds the full application: `/api` routes, request logging and CORS.
pub fn app(app_state: AppState) -> Router {
    let cors = CorsLayer::very_permissive();

    Router::new()
        .nest("/api", routes::routes(app_state.clone()))
        .layer(from_fn_with_state(app_state, auth::middleware::log_request))
        .layer(cors)
}
