#![allow(dead_code)]

use api::{app, auth::generate_jwt};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header::AUTHORIZATION, header::CONTENT_TYPE},
};
use chrono::{DateTime, Duration, Utc};
use db::models::{
    attendance_session, class, class_student,
    user::{self, Role},
};
use db::test_utils::setup_test_db;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tower::ServiceExt;
use util::{
    config::{AppConfig, AttendancePolicy},
    state::AppState,
};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub async fn make_test_app() -> TestApp {
    make_test_app_with_policy(AttendancePolicy::default()).await
}

pub async fn make_test_app_with_policy(policy: AttendancePolicy) -> TestApp {
    let db = setup_test_db().await;
    let mut config = AppConfig::for_tests();
    config.attendance = policy;
    let state = AppState::new(db, config);

    TestApp {
        router: app(state.clone()),
        state,
    }
}

impl TestApp {
    pub fn db(&self) -> &sea_orm::DatabaseConnection {
        self.state.db()
    }

    /// Inserts a user without hashing; use `user::Model::create` when logging in.
    pub async fn user(&self, username: &str, role: Role) -> user::Model {
        let now = Utc::now();
        user::ActiveModel {
            username: Set(username.to_owned()),
            name: Set(format!("User {username}")),
            password_hash: Set("not-a-hash".into()),
            role: Set(role),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .unwrap()
    }

    pub fn token(&self, user: &user::Model) -> String {
        generate_jwt(self.state.config(), user).unwrap().0
    }

    pub async fn class_with_students(
        &self,
        code: &str,
        faculty: &user::Model,
        students: &[&user::Model],
    ) -> class::Model {
        let class = class::Model::create(self.db(), code, &format!("Class {code}"), None, faculty.id)
            .await
            .unwrap();
        for s in students {
            class_student::Model::enroll(self.db(), class.id, s.id)
                .await
                .unwrap();
        }
        class
    }

    pub async fn session(
        &self,
        class: &class::Model,
        class_start: DateTime<Utc>,
        attendance_start: Option<DateTime<Utc>>,
    ) -> attendance_session::Model {
        let code = format!("S-{}-{}", class.code, class_start.timestamp_millis());
        attendance_session::ActiveModel {
            session_code: Set(code.clone()),
            class_id: Set(class.id),
            created_by: Set(class.assigned_to),
            year: Set(2025),
            class_start: Set(class_start),
            class_end: Set(class_start + Duration::hours(1)),
            attendance_start: Set(attendance_start),
            attendance_minutes: Set(15),
            qr_payload: Set(format!("{code}-qr")),
            created_at: Set(class_start),
            updated_at: Set(class_start),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .unwrap()
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut req = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(req.body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method("POST").uri(uri);
        if let Some(token) = token {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                req = req.header(CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };
        self.send(req.body(body).unwrap()).await
    }
}
