use super::common::AnalysisQuery;
use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use services::analytics::AnalyticsService;
use util::state::AppState;

/// GET /analysis/overview
///
/// ### Query Parameters
/// - `class_id` (required)
/// - `mode` = `days` (default, with `from`/`to`) or `sessions` (with `sessions`, default 30)
///
/// ### Response
/// `{ class_id, total_students, avg_attendance_rate, at_risk_students, total_absences,
///    session_count, mode, range }`
pub async fn overview(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AnalysisQuery>,
) -> Response {
    let parsed = query
        .class_code()
        .and_then(|code| Ok((code, query.window()?)));
    let (class_code, window) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return ApiError(e).into_response(),
    };

    match AnalyticsService::new(app_state.db())
        .overview(&user.caller(), class_code, &window, Utc::now())
        .await
    {
        Ok(overview) => (
            StatusCode::OK,
            Json(ApiResponse::success(overview, "Overview computed")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// GET /analysis/at-risk
///
/// Window parameters as for overview, plus `threshold` (default 80), `skip`
/// (default 0) and `limit` (default 50).
pub async fn at_risk(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AnalysisQuery>,
) -> Response {
    let parsed = query
        .class_code()
        .and_then(|code| Ok((code, query.window()?, query.at_risk()?)));
    let (class_code, window, params) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return ApiError(e).into_response(),
    };

    match AnalyticsService::new(app_state.db())
        .at_risk(&user.caller(), class_code, &window, params, Utc::now())
        .await
    {
        Ok(report) => (
            StatusCode::OK,
            Json(ApiResponse::success(report, "At-risk students computed")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// GET /analysis/distribution
///
/// Window parameters as for overview, plus `excellent` (default 90) and `good`
/// (default 80).
pub async fn distribution(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AnalysisQuery>,
) -> Response {
    let parsed = query
        .class_code()
        .and_then(|code| Ok((code, query.window()?, query.distribution()?)));
    let (class_code, window, params) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return ApiError(e).into_response(),
    };

    match AnalyticsService::new(app_state.db())
        .distribution(&user.caller(), class_code, &window, params, Utc::now())
        .await
    {
        Ok(dist) => (
            StatusCode::OK,
            Json(ApiResponse::success(dist, "Distribution computed")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// GET /analysis/trend
///
/// `period` = `weekly` | `monthly` (default), `last_n` buckets (default 6).
/// Without `mode`, `from` or `to`, every session of the class is included.
pub async fn trend(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AnalysisQuery>,
) -> Response {
    let parsed = query
        .class_code()
        .and_then(|code| Ok((code, query.trend()?)));
    let (class_code, params) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return ApiError(e).into_response(),
    };

    match AnalyticsService::new(app_state.db())
        .trend(&user.caller(), class_code, &params, Utc::now())
        .await
    {
        Ok(trend) => (
            StatusCode::OK,
            Json(ApiResponse::success(trend, "Trend computed")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
