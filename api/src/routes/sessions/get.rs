use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};
use crate::routes::common::parse_count;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use services::ServiceError;
use services::attendance_session::{AttendanceSessionService, DEFAULT_LIST_LIMIT};
use util::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub skip: Option<String>,
    pub limit: Option<String>,
}

impl ListQuery {
    /// `(skip, limit)` with defaults `0` and `20`; a zero limit is rejected.
    pub fn page(&self) -> Result<(u64, u64), ServiceError> {
        let skip = parse_count("skip", self.skip.as_deref())?.unwrap_or(0);
        let limit = parse_count("limit", self.limit.as_deref())?.unwrap_or(DEFAULT_LIST_LIMIT);
        if limit == 0 {
            return Err(ServiceError::BadRequest("limit must be at least 1".into()));
        }
        Ok((skip, limit))
    }
}

/// GET /sessions
///
/// Sessions newest first. Admin sees all, faculty sees their classes.
///
/// ### Query Parameters
/// - `skip` (default 0), `limit` (default 20)
///
/// ### Responses
/// - `200 OK` with `{ sessions, count, total, skip, limit }`
/// - `403 Forbidden` for students
pub async fn list_sessions(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Response {
    let (skip, limit) = match query.page() {
        Ok(page) => page,
        Err(e) => return ApiError(e).into_response(),
    };

    match AttendanceSessionService::from_state(&app_state)
        .list_sessions(&user.caller(), skip, limit)
        .await
    {
        Ok(list) => (
            StatusCode::OK,
            Json(ApiResponse::success(list, "Sessions retrieved")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// GET /sessions/{session_id}
///
/// Session details with the present/absent roster.
pub async fn get_session(
    State(app_state): State<AppState>,
    Path(session_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    match AttendanceSessionService::from_state(&app_state)
        .session_details(&session_id, &user.caller())
        .await
    {
        Ok(details) => (
            StatusCode::OK,
            Json(ApiResponse::success(details, "Session retrieved")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// GET /sessions/{session_id}/attendance
pub async fn get_session_attendance(
    State(app_state): State<AppState>,
    Path(session_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    match AttendanceSessionService::from_state(&app_state)
        .session_attendance(&session_id, &user.caller())
        .await
    {
        Ok(list) => (
            StatusCode::OK,
            Json(ApiResponse::success(list, "Attendance retrieved")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
