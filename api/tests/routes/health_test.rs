#[cfg(test)]
mod tests {
    use crate::helpers::make_test_app;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn health_check_returns_ok_json() {
        let app = make_test_app().await;

        let (status, json) = app.get("/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], "OK");
        assert_eq!(json["message"], "Health check passed");
    }

    #[tokio::test]
    async fn wrong_method_is_405() {
        let app = make_test_app().await;

        let (status, _) = app.post("/api/health", None, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
