use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use services::ServiceError;

/// Standardized API response wrapper for all outgoing JSON responses.
///
/// ```json
/// {
///   "success": true,
///   "data": { ... },
///   "message": "Some message"
/// }
/// ```
///
/// Error responses carry `success: false`, an empty `data` object and the
/// error text in `message`.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// Constructs a success response with the given data and message.
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    /// Constructs an error response with a message and default `data`.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }
}

/// Empty `data` payload for error responses; serializes as `{}`.
#[derive(Serialize, Default, Debug)]
pub struct Empty {}

/// A core error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

pub fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::BadRequest(_)
        | ServiceError::WindowNotOpen
        | ServiceError::WindowClosed
        | ServiceError::DuplicateMark
        | ServiceError::InvalidQr => StatusCode::BAD_REQUEST,
        ServiceError::Unauthenticated(_) | ServiceError::Expired => StatusCode::UNAUTHORIZED,
        ServiceError::Forbidden(_) | ServiceError::NotEnrolled => StatusCode::FORBIDDEN,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Internal(_) | ServiceError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let message = match &self.0 {
            ServiceError::Internal(_) | ServiceError::Signing(_) => {
                tracing::error!(error = %self.0, "internal error while handling request");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiResponse::<Empty>::error(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use sea_orm::DbErr;
    use serde_json::Value;

    #[test]
    fn maps_every_kind() {
        let cases = [
            (ServiceError::BadRequest("x".into()), 400),
            (ServiceError::WindowNotOpen, 400),
            (ServiceError::WindowClosed, 400),
            (ServiceError::DuplicateMark, 400),
            (ServiceError::InvalidQr, 400),
            (ServiceError::Unauthenticated("x".into()), 401),
            (ServiceError::Expired, 401),
            (ServiceError::Forbidden("x".into()), 403),
            (ServiceError::NotEnrolled, 403),
            (ServiceError::NotFound("x".into()), 404),
            (ServiceError::Internal(DbErr::Custom("x".into())), 500),
        ];
        for (err, code) in cases {
            assert_eq!(status_for(&err).as_u16(), code, "{err:?}");
        }
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let response =
            ApiError(ServiceError::Internal(DbErr::Custom("secret table".into()))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Internal server error");
        assert_eq!(json["data"], serde_json::json!({}));
    }
}
