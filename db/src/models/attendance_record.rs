use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DbErr, EntityTrait, FromQueryResult, QueryFilter, QuerySelect, Set};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,

    /// Student roll (username) at the time of marking.
    pub roll: String,
    pub taken_at: DateTime<Utc>,
    pub via: Channel,
}

/// Client channel a mark arrived through.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Deserialize,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "attendance_channel_type"
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Channel {
    #[sea_orm(string_value = "web")]
    Web,

    #[sea_orm(string_value = "app")]
    App,

    #[default]
    #[sea_orm(string_value = "unknown")]
    Unknown,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::attendance_session::Entity",
        from = "Column::SessionId",
        to = "super::attendance_session::Column::Id"
    )]
    Session,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}
impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, FromQueryResult)]
struct GroupCount {
    group_key: i64,
    n: i64,
}

impl Model {
    /// Inserts the record unless one already exists for (session, user).
    ///
    /// The existence check is part of the write itself (`ON CONFLICT DO NOTHING`
    /// on the composite key), so of two racing calls exactly one returns `true`.
    pub async fn insert_once(
        db: &DbConn,
        session_id: i64,
        user_id: i64,
        roll: &str,
        via: Channel,
        taken_at: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let affected = Entity::insert(ActiveModel {
            session_id: Set(session_id),
            user_id: Set(user_id),
            roll: Set(roll.to_owned()),
            taken_at: Set(taken_at),
            via: Set(via),
        })
        .on_conflict(
            OnConflict::columns([Column::SessionId, Column::UserId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

        Ok(affected > 0)
    }

    pub async fn exists(db: &DbConn, session_id: i64, user_id: i64) -> Result<bool, DbErr> {
        Ok(Entity::find_by_id((session_id, user_id))
            .one(db)
            .await?
            .is_some())
    }

    /// Presence count per student across `session_ids`, as one grouped query.
    pub async fn counts_by_user(
        db: &DbConn,
        session_ids: &[i64],
    ) -> Result<HashMap<i64, i64>, DbErr> {
        Self::grouped_count(db, session_ids, Column::UserId).await
    }

    /// Number of records per session across `session_ids`, as one grouped query.
    pub async fn counts_by_session(
        db: &DbConn,
        session_ids: &[i64],
    ) -> Result<HashMap<i64, i64>, DbErr> {
        Self::grouped_count(db, session_ids, Column::SessionId).await
    }

    async fn grouped_count(
        db: &DbConn,
        session_ids: &[i64],
        key: Column,
    ) -> Result<HashMap<i64, i64>, DbErr> {
        if session_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = Entity::find()
            .select_only()
            .column_as(key, "group_key")
            .column_as(Column::UserId.count(), "n")
            .filter(Column::SessionId.is_in(session_ids.iter().copied()))
            .group_by(key)
            .into_model::<GroupCount>()
            .all(db)
            .await?;

        Ok(rows.into_iter().map(|r| (r.group_key, r.n)).collect())
    }
}
