use crate::auth::claims::AuthUser;
use crate::response::ApiError;
use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use db::models::user::Role;
use services::ServiceError;
use util::state::AppState;

type GuardRejection = ApiError;

/// Verifies the bearer token and stores the `AuthUser` in the request extensions.
async fn extract_and_insert_authuser(
    app_state: &AppState,
    req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), GuardRejection> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, app_state).await?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

/// Basic guard to ensure the request is authenticated.
pub async fn allow_authenticated(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    let (req, _user) = extract_and_insert_authuser(&app_state, req).await?;

    Ok(next.run(req).await)
}

/// Faculty or admin only. Class ownership is checked by the operation itself.
pub async fn allow_staff(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    let (req, user) = extract_and_insert_authuser(&app_state, req).await?;

    if user.0.role == Role::Student {
        return Err(ApiError(ServiceError::Forbidden(
            "Faculty or admin access required".into(),
        )));
    }

    Ok(next.run(req).await)
}
