#[cfg(test)]
mod tests {
    use crate::helpers::{make_test_app, make_test_app_with_policy};
    use axum::http::StatusCode;
    use chrono::{Duration, SecondsFormat, Utc};
    use db::models::user::Role;
    use serde_json::json;
    use util::config::AttendancePolicy;

    fn start_body(class: &str, minutes_ago: i64) -> serde_json::Value {
        let start = Utc::now() - Duration::minutes(minutes_ago);
        let end = start + Duration::hours(1);
        json!({
            "class_id": class,
            "start": start.to_rfc3339_opts(SecondsFormat::Secs, true),
            "end": end.to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }

    #[tokio::test]
    async fn faculty_starts_and_student_marks_once() {
        let app = make_test_app().await;
        let f1 = app.user("F1", Role::Faculty).await;
        let s1 = app.user("S01", Role::Student).await;
        let s2 = app.user("S02", Role::Student).await;
        app.class_with_students("CSE101", &f1, &[&s1, &s2]).await;
        let f1_token = app.token(&f1);
        let s1_token = app.token(&s1);

        let (status, json) = app
            .post("/api/sessions", Some(&f1_token), Some(start_body("CSE101", 1)))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["message"], "Session started");
        assert_eq!(json["data"]["class_code"], "CSE101");
        assert_eq!(json["data"]["attendance_minutes"], 15);
        let session_id = json["data"]["session_id"].as_str().unwrap().to_string();
        assert!(session_id.starts_with("S-CSE101-"));

        let mark_uri = format!("/api/sessions/{session_id}/mark");
        let (status, json) = app
            .post(&mark_uri, Some(&s1_token), Some(json!({"via": "app"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["roll"], "S01");
        assert_eq!(json["data"]["via"], "app");

        let (status, json) = app.post(&mark_uri, Some(&s1_token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);

        let (status, json) = app.get(&format!("/api/sessions/{session_id}"), Some(&f1_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["total_students"], 2);
        assert_eq!(json["data"]["present_count"], 1);
        assert_eq!(json["data"]["absent_count"], 1);
        assert_eq!(json["data"]["roster"][0]["roll"], "S01");
        assert_eq!(json["data"]["roster"][0]["status"], "Present");
        assert_eq!(json["data"]["roster"][1]["status"], "Absent");

        let (status, json) = app
            .get(&format!("/api/sessions/{session_id}/attendance"), Some(&f1_token))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["attendance"].as_array().unwrap().len(), 1);

        let (status, json) = app.get("/api/sessions", Some(&f1_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["total"], 1);
        assert_eq!(json["data"]["sessions"][0]["attendance_count"], 1);
        assert_eq!(json["data"]["sessions"][0]["student_count"], 2);
    }

    #[tokio::test]
    async fn start_session_rejections() {
        let app = make_test_app().await;
        let f1 = app.user("F1", Role::Faculty).await;
        let f2 = app.user("F2", Role::Faculty).await;
        let s1 = app.user("S01", Role::Student).await;
        app.class_with_students("CSE101", &f1, &[&s1]).await;

        let (status, _) = app
            .post("/api/sessions", Some(&app.token(&f2)), Some(start_body("CSE101", 0)))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .post("/api/sessions", Some(&app.token(&s1)), Some(start_body("CSE101", 0)))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .post("/api/sessions", Some(&app.token(&f1)), Some(start_body("NOPE", 0)))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let mut inverted = start_body("CSE101", 0);
        inverted["end"] = inverted["start"].clone();
        let (status, _) = app
            .post("/api/sessions", Some(&app.token(&f1)), Some(inverted))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app.post("/api/sessions", None, Some(start_body("CSE101", 0))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn mark_rejections_map_to_status_codes() {
        let app = make_test_app().await;
        let f1 = app.user("F1", Role::Faculty).await;
        let s1 = app.user("S01", Role::Student).await;
        let outsider = app.user("S99", Role::Student).await;
        let class = app.class_with_students("CSE101", &f1, &[&s1]).await;
        let now = Utc::now();

        let unopened = app.session(&class, now - Duration::hours(2), None).await;
        let open = app.session(&class, now - Duration::hours(1), Some(now - Duration::minutes(1))).await;

        let (status, _) = app
            .post(
                &format!("/api/sessions/{}/mark", unopened.session_code),
                Some(&app.token(&s1)),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .post(
                &format!("/api/sessions/{}/mark", open.session_code),
                Some(&app.token(&outsider)),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .post("/api/sessions/S-NOPE-1/mark", Some(&app.token(&s1)), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .post(
                &format!("/api/sessions/{}/mark", open.session_code),
                Some(&app.token(&s1)),
                Some(json!({"via": "carrier-pigeon"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn restart_opens_window_with_new_qr() {
        let app = make_test_app_with_policy(AttendancePolicy {
            require_qr: true,
            enforce_close: true,
        })
        .await;
        let f1 = app.user("F1", Role::Faculty).await;
        let s1 = app.user("S01", Role::Student).await;
        let class = app.class_with_students("CSE101", &f1, &[&s1]).await;
        let now = Utc::now();
        let session = app
            .session(&class, now - Duration::hours(3), Some(now - Duration::hours(3)))
            .await;
        let mark_uri = format!("/api/sessions/{}/mark", session.session_code);

        let (status, _) = app
            .post(&mark_uri, Some(&app.token(&s1)), Some(json!({"qr_payload": session.qr_payload})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .post(
                &format!("/api/sessions/{}/restart", session.session_code),
                Some(&app.token(&s1)),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, json) = app
            .post(
                &format!("/api/sessions/{}/restart", session.session_code),
                Some(&app.token(&f1)),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Attendance restarted");
        let qr = json["data"]["qr_payload"].as_str().unwrap().to_string();
        assert_ne!(qr, session.qr_payload);

        let (status, _) = app
            .post(&mark_uri, Some(&app.token(&s1)), Some(json!({"qr_payload": "stale"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = app
            .post(&mark_uri, Some(&app.token(&s1)), Some(json!({"qr_payload": qr})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["via"], "unknown");
    }

    #[tokio::test]
    async fn students_cannot_list_sessions_and_zero_limit_is_rejected() {
        let app = make_test_app().await;
        let admin = app.user("admin", Role::Admin).await;
        let s1 = app.user("S01", Role::Student).await;

        let (status, _) = app.get("/api/sessions", Some(&app.token(&s1))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.get("/api/sessions?limit=0", Some(&app.token(&admin))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        for uri in [
            "/api/sessions?skip=9223372036854775808",
            "/api/sessions?limit=18446744073709551615",
        ] {
            let (status, json) = app.get(uri, Some(&app.token(&admin))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(json["success"], false);
        }

        let (status, json) = app.get("/api/sessions", Some(&app.token(&admin))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["count"], 0);
        assert_eq!(json["data"]["limit"], 20);
    }
}
