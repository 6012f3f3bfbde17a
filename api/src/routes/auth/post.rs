use crate::auth::generate_jwt;
use crate::response::{ApiError, ApiResponse, Empty};
use crate::routes::common::format_validation_errors;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::user::{self, Role};
use serde::{Deserialize, Serialize};
use services::ServiceError;
use util::state::AppState;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: String,
    pub role: Role,
    pub user_id: i64,
    pub username: String,
    pub name: String,
}

/// POST /auth/login
///
/// ### Request Body
/// ```json
/// { "username": "25101300127", "password": "student123" }
/// ```
///
/// ### Responses
/// - `200 OK` with `{ token, expires_at, role, user_id, username, name }`
/// - `400 Bad Request` when a field is empty
/// - `401 Unauthorized` for unknown users or wrong passwords
pub async fn login(
    State(app_state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Response {
    if let Err(validation_errors) = req.validate() {
        let message = format_validation_errors(&validation_errors);
        return ApiError(ServiceError::BadRequest(message)).into_response();
    }

    let found = match user::Model::find_by_username(app_state.db(), &req.username).await {
        Ok(found) => found,
        Err(e) => return ApiError(ServiceError::from(e)).into_response(),
    };

    let Some(user) = found.filter(|u| u.verify_password(&req.password)) else {
        tracing::debug!(username = %req.username, "login rejected");
        return ApiError(ServiceError::Unauthenticated(
            "Invalid username or password".into(),
        ))
        .into_response();
    };

    let (token, expires_at) = match generate_jwt(app_state.config(), &user) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(error = %e, "token encoding failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Internal server error")),
            )
                .into_response();
        }
    };

    tracing::info!(user = user.id, role = %user.role, "login");

    let body = LoginResponse {
        token,
        expires_at,
        role: user.role,
        user_id: user.id,
        username: user.username,
        name: user.name,
    };
    (
        StatusCode::OK,
        Json(ApiResponse::success(body, "Login successful")),
    )
        .into_response()
}
