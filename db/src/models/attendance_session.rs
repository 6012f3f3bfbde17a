use chrono::{DateTime, Duration, Utc};
use sea_orm::EntityTrait;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "attendance_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Public identifier, unique per (class, creation instant).
    pub session_code: String,
    pub class_id: i64,
    pub created_by: i64,
    pub year: i32,
    pub class_start: DateTime<Utc>,
    pub class_end: DateTime<Utc>,
    /// Instant marking opens. `None` means the window has never been opened.
    pub attendance_start: Option<DateTime<Utc>>,
    pub attendance_minutes: i32,
    /// Current QR challenge; replaced on every restart.
    pub qr_payload: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::ClassId",
        to = "super::class::Column::Id"
    )]
    Class,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    Creator,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Where a session's attendance window stands at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// `attendance_start` is unset or still in the future.
    NotOpen,
    Open,
    /// Past `attendance_start + attendance_minutes`.
    Elapsed,
}

impl Model {
    pub async fn find_by_code(db: &DbConn, code: &str) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::SessionCode.eq(code))
            .one(db)
            .await
    }

    /// End of the attendance window, if it has been opened.
    pub fn window_end(&self) -> Option<DateTime<Utc>> {
        self.attendance_start
            .map(|start| start + Duration::minutes(i64::from(self.attendance_minutes)))
    }

    pub fn window_state(&self, now: DateTime<Utc>) -> WindowState {
        match (self.attendance_start, self.window_end()) {
            (Some(start), _) if now < start => WindowState::NotOpen,
            (Some(_), Some(end)) if now > end => WindowState::Elapsed,
            (Some(_), _) => WindowState::Open,
            (None, _) => WindowState::NotOpen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(attendance_start: Option<DateTime<Utc>>) -> Model {
        let start = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
        Model {
            id: 1,
            session_code: "S-CSE101-1".into(),
            class_id: 1,
            created_by: 1,
            year: 2025,
            class_start: start,
            class_end: start + Duration::hours(1),
            attendance_start,
            attendance_minutes: 15,
            qr_payload: String::new(),
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn window_state_transitions() {
        let open_at = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
        let s = session(Some(open_at));

        assert_eq!(s.window_state(open_at - Duration::seconds(1)), WindowState::NotOpen);
        assert_eq!(s.window_state(open_at), WindowState::Open);
        assert_eq!(s.window_state(open_at + Duration::minutes(15)), WindowState::Open);
        assert_eq!(
            s.window_state(open_at + Duration::minutes(15) + Duration::seconds(1)),
            WindowState::Elapsed
        );
    }

    #[test]
    fn unset_start_is_never_open() {
        let s = session(None);
        assert_eq!(s.window_end(), None);
        assert_eq!(s.window_state(Utc::now()), WindowState::NotOpen);
    }
}
