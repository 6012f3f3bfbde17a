use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use jsonwebtoken::errors::ErrorKind;
use services::ServiceError;
use util::state::AppState;

use crate::auth::{claims::AuthUser, decode_jwt};
use crate::response::ApiError;

/// Extracts `AuthUser` from the `Authorization: Bearer` header.
///
/// A guard that already verified the token leaves the `AuthUser` in the request
/// extensions, in which case it is reused. Otherwise the token is verified with
/// the secret from the application's config.
///
/// # Errors
/// - `401 Unauthorized` if the header is missing or malformed, or the token is
///   invalid. An expired token gets its own message.
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| unauthenticated("Missing or invalid Authorization header"))?;

        let app_state = AppState::from_ref(state);
        let claims = decode_jwt(&app_state.config().jwt_secret, bearer.token()).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => ApiError(ServiceError::Expired),
                _ => unauthenticated("Invalid token"),
            }
        })?;

        Ok(AuthUser(claims))
    }
}

fn unauthenticated(message: &str) -> ApiError {
    ApiError(ServiceError::Unauthenticated(message.to_string()))
}
