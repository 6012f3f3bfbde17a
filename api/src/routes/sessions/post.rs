use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};
use crate::routes::common::{format_validation_errors, parse_optional_body};
use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use db::models::attendance_record::Channel;
use serde::Deserialize;
use services::ServiceError;
use services::attendance_session::{
    AttendanceSessionService, DEFAULT_ATTENDANCE_MINUTES, MarkAttendance, StartSession,
};
use std::str::FromStr;
use util::state::AppState;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct StartSessionRequest {
    #[validate(length(min = 1, message = "class_id is required"))]
    pub class_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[validate(range(
        min = 1,
        max = 1440,
        message = "attendance_minutes must be between 1 and 1440"
    ))]
    pub attendance_minutes: Option<i32>,
    pub year: Option<i32>,
}

/// POST /sessions
///
/// Starts a session for a class. Admin, or the faculty assigned to the class.
///
/// ### Request Body
/// ```json
/// {
///   "class_id": "CSE101",
///   "start": "2025-03-03T09:00:00Z",
///   "end": "2025-03-03T10:00:00Z",
///   "attendance_minutes": 15
/// }
/// ```
///
/// ### Responses
/// - `201 Created` with `{ session_id, class_code, qr_payload, attendance_start, ... }`
/// - `400 Bad Request` (validation, `start >= end`)
/// - `403 Forbidden` (not the assigned faculty)
/// - `404 Not Found` (unknown class)
pub async fn start_session(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<StartSessionRequest>,
) -> Response {
    if let Err(validation_errors) = req.validate() {
        let message = format_validation_errors(&validation_errors);
        return ApiError(ServiceError::BadRequest(message)).into_response();
    }

    let params = StartSession {
        class_code: req.class_id,
        start: req.start,
        end: req.end,
        attendance_minutes: req.attendance_minutes.unwrap_or(DEFAULT_ATTENDANCE_MINUTES),
        year: req.year,
    };

    match AttendanceSessionService::from_state(&app_state)
        .start_session(&user.caller(), params, Utc::now())
        .await
    {
        Ok(started) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(started, "Session started")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkRequest {
    pub via: Option<String>,
    pub qr_payload: Option<String>,
}

/// POST /sessions/{session_id}/mark
///
/// Marks the calling student present. The body is optional.
///
/// ### Request Body
/// ```json
/// { "via": "app", "qr_payload": "S-CSE101-1741000000000-1741000000000-9f86d081" }
/// ```
///
/// ### Responses
/// - `200 OK` with `{ session_id, user_id, roll, taken_at, via }`
/// - `400 Bad Request` (window not open or closed, duplicate mark, invalid QR, bad `via`)
/// - `403 Forbidden` (not enrolled)
/// - `404 Not Found` (unknown session)
pub async fn mark_attendance(
    State(app_state): State<AppState>,
    Path(session_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Response {
    let params = match parse_mark_request(&body) {
        Ok(params) => params,
        Err(e) => return ApiError(e).into_response(),
    };

    match AttendanceSessionService::from_state(&app_state)
        .mark_attendance(&session_id, &user.caller(), params, Utc::now())
        .await
    {
        Ok(ack) => (
            StatusCode::OK,
            Json(ApiResponse::success(ack, "Attendance marked")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

fn parse_mark_request(body: &[u8]) -> Result<MarkAttendance, ServiceError> {
    let req: MarkRequest = parse_optional_body(body)?;
    let via = match req.via.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        None => Channel::default(),
        Some(v) => Channel::from_str(v).map_err(|_| {
            ServiceError::BadRequest(format!("via must be one of web, app, unknown; got '{v}'"))
        })?,
    };
    Ok(MarkAttendance {
        via,
        qr_payload: req.qr_payload,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct RestartRequest {
    pub attendance_start: Option<DateTime<Utc>>,
}

/// POST /sessions/{session_id}/restart
///
/// Reopens the attendance window with a fresh QR challenge. Without a body the
/// window starts now; `attendance_start` overrides it verbatim.
///
/// ### Responses
/// - `200 OK` with `{ session_id, attendance_start, attendance_minutes, window_end, qr_payload }`
/// - `403 Forbidden` (not admin or the assigned faculty)
/// - `404 Not Found` (unknown session)
pub async fn restart_attendance(
    State(app_state): State<AppState>,
    Path(session_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Response {
    let req: RestartRequest = match parse_optional_body(&body) {
        Ok(req) => req,
        Err(e) => return ApiError(e).into_response(),
    };

    match AttendanceSessionService::from_state(&app_state)
        .restart_attendance(&session_id, &user.caller(), req.attendance_start, Utc::now())
        .await
    {
        Ok(info) => (
            StatusCode::OK,
            Json(ApiResponse::success(info, "Attendance restarted")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
