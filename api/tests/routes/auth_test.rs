#[cfg(test)]
mod tests {
    use crate::helpers::make_test_app;
    use api::auth::Claims;
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use db::models::user::{Model as UserModel, Role};
    use serde_json::json;

    #[tokio::test]
    async fn login_issues_a_token_that_verifies() {
        let app = make_test_app().await;
        let user = UserModel::create(app.db(), "F1", "Dr. Sharma", "faculty123", Role::Faculty)
            .await
            .unwrap();

        let (status, json) = app
            .post(
                "/api/auth/login",
                None,
                Some(json!({"username": "F1", "password": "faculty123"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["role"], "faculty");
        assert_eq!(json["data"]["user_id"], user.id);
        assert_eq!(json["data"]["name"], "Dr. Sharma");
        let token = json["data"]["token"].as_str().unwrap().to_string();

        let (status, json) = app.get("/api/auth/verify", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["user_id"], user.id);
        assert_eq!(json["data"]["username"], "F1");
        assert_eq!(json["data"]["role"], "faculty");

        let (status, json) = app
            .post(
                "/api/auth/login",
                None,
                Some(json!({"username": "F1", "password": "wrong"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Invalid username or password");

        let (status, json) = app
            .post(
                "/api/auth/login",
                None,
                Some(json!({"username": "nobody", "password": "faculty123"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "Invalid username or password");

        let (status, _) = app
            .post(
                "/api/auth/login",
                None,
                Some(json!({"username": "", "password": "x"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn verify_requires_a_valid_token() {
        let app = make_test_app().await;

        let (status, json) = app.get("/api/auth/verify", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["success"], false);

        let (status, json) = app.get("/api/auth/verify", Some("not-a-jwt")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "Invalid token");
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let app = make_test_app().await;
        let claims = Claims {
            sub: 1,
            username: "S01".into(),
            role: Role::Student,
            exp: (Utc::now() - Duration::hours(2)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(app.state.config().jwt_secret.as_bytes()),
        )
        .unwrap();

        let (status, json) = app.get("/api/auth/verify", Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Token has expired");

        let (status, json) = app.get("/api/sessions", Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "Token has expired");
    }
}
