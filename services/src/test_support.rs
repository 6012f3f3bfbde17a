use chrono::{DateTime, Duration, Utc};
use db::models::{
    attendance_record::{self, Channel},
    attendance_session, class, class_student,
    user::{self, Role},
};
use db::test_utils::setup_test_db;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

pub struct Fixture {
    pub db: DatabaseConnection,
    pub admin: user::Model,
    pub faculty: user::Model,
    pub other_faculty: user::Model,
    pub students: Vec<user::Model>,
    pub class: class::Model,
}

/// Inserts a user with a placeholder hash; the services never check passwords.
pub async fn insert_user(db: &DatabaseConnection, username: &str, role: Role) -> user::Model {
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
    .insert(db)
    .await
    .unwrap()
}

/// `CSE101` assigned to `F1`, with `n` enrolled students `S01..`.
pub async fn fixture(n: usize) -> Fixture {
    let db = setup_test_db().await;
    let admin = insert_user(&db, "admin", Role::Admin).await;
    let faculty = insert_user(&db, "F1", Role::Faculty).await;
    let other_faculty = insert_user(&db, "F2", Role::Faculty).await;
    let class = class::Model::create(&db, "CSE101", "Intro to Programming", None, faculty.id)
        .await
        .unwrap();

    let mut students = Vec::with_capacity(n);
    for i in 1..=n {
        let s = insert_user(&db, &format!("S{i:02}"), Role::Student).await;
        class_student::Model::enroll(&db, class.id, s.id).await.unwrap();
        students.push(s);
    }

    Fixture {
        db,
        admin,
        faculty,
        other_faculty,
        students,
        class,
    }
}

pub async fn insert_session(
    db: &DatabaseConnection,
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
    .insert(db)
    .await
    .unwrap()
}

pub async fn record(db: &DatabaseConnection, session: &attendance_session::Model, student: &user::Model) {
    let inserted = attendance_record::Model::insert_once(
        db,
        session.id,
        student.id,
        &student.username,
        Channel::Web,
        session.class_start,
    )
    .await
    .unwrap();
    assert!(inserted);
}
