#[cfg(test)]
mod tests {
    use crate::helpers::{TestApp, make_test_app};
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use db::models::{
        attendance_record::{Channel, Model as RecordModel},
        attendance_session, user,
        user::Role,
    };

    struct Scenario {
        app: TestApp,
        faculty: user::Model,
        other_faculty: user::Model,
        student: user::Model,
    }

    async fn mark(app: &TestApp, session: &attendance_session::Model, student: &user::Model) {
        RecordModel::insert_once(
            app.db(),
            session.id,
            student.id,
            &student.username,
            Channel::Web,
            session.class_start,
        )
        .await
        .unwrap();
    }

    /// Two sessions in the last week: S01 attends both, S02 one, S03 none.
    async fn scenario() -> Scenario {
        let app = make_test_app().await;
        let faculty = app.user("F1", Role::Faculty).await;
        let other_faculty = app.user("F2", Role::Faculty).await;
        let s1 = app.user("S01", Role::Student).await;
        let s2 = app.user("S02", Role::Student).await;
        let s3 = app.user("S03", Role::Student).await;
        let class = app.class_with_students("CSE101", &faculty, &[&s1, &s2, &s3]).await;

        let now = Utc::now();
        let older = app.session(&class, now - Duration::days(2), Some(now - Duration::days(2))).await;
        let newer = app.session(&class, now - Duration::days(1), Some(now - Duration::days(1))).await;
        mark(&app, &older, &s1).await;
        mark(&app, &newer, &s1).await;
        mark(&app, &older, &s2).await;

        Scenario {
            app,
            faculty,
            other_faculty,
            student: s1,
        }
    }

    #[tokio::test]
    async fn overview_summarises_the_window() {
        let Scenario { app, faculty, .. } = scenario().await;

        let (status, json) = app
            .get("/api/analysis/overview?class_id=CSE101", Some(&app.token(&faculty)))
            .await;
        assert_eq!(status, StatusCode::OK);
        let data = &json["data"];
        assert_eq!(data["total_students"], 3);
        assert_eq!(data["session_count"], 2);
        assert_eq!(data["avg_attendance_rate"], 50);
        assert_eq!(data["at_risk_students"], 2);
        assert_eq!(data["total_absences"], 3);
        assert_eq!(data["mode"], "days");

        let (status, json) = app
            .get(
                "/api/analysis/overview?class_id=CSE101&mode=sessions&sessions=1",
                Some(&app.token(&faculty)),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["session_count"], 1);
        assert_eq!(json["data"]["avg_attendance_rate"], 33);
        assert_eq!(json["data"]["range"]["last_n_sessions"], 1);
    }

    #[tokio::test]
    async fn at_risk_lists_lowest_rates_first() {
        let Scenario { app, faculty, .. } = scenario().await;

        let (status, json) = app
            .get("/api/analysis/at-risk?class_id=CSE101", Some(&app.token(&faculty)))
            .await;
        assert_eq!(status, StatusCode::OK);
        let students = json["data"]["students"].as_array().unwrap();
        assert_eq!(json["data"]["total"], 2);
        assert_eq!(students[0]["roll"], "S03");
        assert_eq!(students[0]["attendance_rate"], 0);
        assert_eq!(students[0]["last_class_status"], "Absent");
        assert_eq!(students[1]["roll"], "S02");
        assert_eq!(students[1]["attendance_rate"], 50);

        let (status, json) = app
            .get(
                "/api/analysis/at-risk?class_id=CSE101&skip=1&limit=1",
                Some(&app.token(&faculty)),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["total"], 2);
        assert_eq!(json["data"]["students"][0]["roll"], "S02");

        let (status, _) = app
            .get(
                "/api/analysis/at-risk?class_id=CSE101&threshold=101",
                Some(&app.token(&faculty)),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn distribution_partitions_the_roster() {
        let Scenario { app, faculty, .. } = scenario().await;

        let (status, json) = app
            .get("/api/analysis/distribution?class_id=CSE101", Some(&app.token(&faculty)))
            .await;
        assert_eq!(status, StatusCode::OK);
        let data = &json["data"];
        assert_eq!(data["excellent"], 1);
        assert_eq!(data["good"], 0);
        assert_eq!(data["poor"], 2);
        assert_eq!(data["total"], 3);
        assert_eq!(data["thresholds"]["excellent"], ">90%");

        let (status, _) = app
            .get(
                "/api/analysis/distribution?class_id=CSE101&excellent=70&good=80",
                Some(&app.token(&faculty)),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn trend_covers_all_sessions_by_default() {
        let Scenario { app, faculty, .. } = scenario().await;

        let (status, json) = app
            .get(
                "/api/analysis/trend?class_id=CSE101&period=weekly&last_n=12",
                Some(&app.token(&faculty)),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["mode"], "all");
        let points = json["data"]["trend"].as_array().unwrap();
        let sessions: u64 = points.iter().map(|p| p["sessions"].as_u64().unwrap()).sum();
        let attended: u64 = points
            .iter()
            .map(|p| p["attendance_count"].as_u64().unwrap())
            .sum();
        assert_eq!(sessions, 2);
        assert_eq!(attended, 3);
    }

    #[tokio::test]
    async fn access_is_limited_to_the_owning_staff() {
        let Scenario {
            app,
            other_faculty,
            student,
            ..
        } = scenario().await;

        let (status, _) = app
            .get("/api/analysis/overview?class_id=CSE101", Some(&app.token(&student)))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .get("/api/analysis/overview?class_id=CSE101", Some(&app.token(&other_faculty)))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.get("/api/analysis/overview", Some(&app.token(&other_faculty))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .get("/api/analysis/overview?class_id=NOPE", Some(&app.token(&other_faculty)))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.get("/api/analysis/overview?class_id=CSE101", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn out_of_range_window_parameters_are_rejected() {
        let Scenario { app, faculty, .. } = scenario().await;
        let token = app.token(&faculty);

        for uri in [
            "/api/analysis/overview?class_id=CSE101&to=-262143-01-01",
            "/api/analysis/overview?class_id=CSE101&mode=sessions&sessions=18446744073709551615",
            "/api/analysis/overview?class_id=CSE101&mode=sessions&sessions=9223372036854775808",
            "/api/analysis/at-risk?class_id=CSE101&skip=9223372036854775808",
        ] {
            let (status, json) = app.get(uri, Some(&token)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(json["success"], false);
        }

        let (status, json) = app
            .get(
                "/api/analysis/overview?class_id=CSE101&mode=sessions&sessions=9223372036854775807",
                Some(&token),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["session_count"], 2);
    }
}
