use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set};

use super::user::Role;

/// A class taught by one faculty member, with an enrolled student roster.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable unique code, e.g. `CSE101`.
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// The faculty (or admin) user who owns this class.
    pub assigned_to: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AssignedTo",
        to = "super::user::Column::Id"
    )]
    AssignedTo,
    #[sea_orm(has_many = "super::class_student::Entity")]
    Students,
    #[sea_orm(has_many = "super::attendance_session::Entity")]
    Sessions,
}

impl Related<super::class_student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Creates a class owned by `assigned_to`, which must be a faculty or admin user.
    pub async fn create(
        db: &DbConn,
        code: &str,
        name: &str,
        description: Option<&str>,
        assigned_to: i64,
    ) -> Result<Self, DbErr> {
        let assignee = super::user::Entity::find_by_id(assigned_to).one(db).await?;
        match assignee.map(|u| u.role) {
            Some(Role::Faculty | Role::Admin) => {}
            Some(Role::Student) => {
                return Err(DbErr::Custom(format!(
                    "User {assigned_to} is a student and cannot own a class"
                )));
            }
            None => return Err(DbErr::RecordNotFound(format!("User {assigned_to}"))),
        }

        let now = Utc::now();
        ActiveModel {
            code: Set(code.to_owned()),
            name: Set(name.to_owned()),
            description: Set(description.map(str::to_owned)),
            assigned_to: Set(assigned_to),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find_by_code(db: &DbConn, code: &str) -> Result<Option<Self>, DbErr> {
        Entity::find().filter(Column::Code.eq(code)).one(db).await
    }

    /// Ids of every class assigned to `user_id`.
    pub async fn ids_assigned_to(db: &DbConn, user_id: i64) -> Result<Vec<i64>, DbErr> {
        Ok(Entity::find()
            .filter(Column::AssignedTo.eq(user_id))
            .order_by_asc(Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect())
    }

    /// Enrolled students ordered by username (roll).
    pub async fn students(&self, db: &DbConn) -> Result<Vec<super::user::Model>, DbErr> {
        let ids = super::class_student::Model::student_ids(db, self.id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        super::user::Entity::find()
            .filter(super::user::Column::Id.is_in(ids))
            .order_by_asc(super::user::Column::Username)
            .all(db)
            .await
    }
}
