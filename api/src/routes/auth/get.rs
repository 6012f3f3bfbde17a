use crate::auth::AuthUser;
use crate::response::ApiResponse;
use axum::{Json, http::StatusCode, response::IntoResponse};
use db::models::user::Role;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct VerifiedIdentity {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

/// GET /auth/verify
///
/// Echoes the identity carried by a valid bearer token.
pub async fn verify(AuthUser(claims): AuthUser) -> impl IntoResponse {
    let identity = VerifiedIdentity {
        user_id: claims.sub,
        username: claims.username,
        role: claims.role,
        exp: claims.exp,
    };
    (
        StatusCode::OK,
        Json(ApiResponse::success(identity, "Token is valid")),
    )
}
