use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, Set};

/// Enrollment of a student in a class. The composite key keeps the roster a set.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "class_students")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub class_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
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
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Enrolls `user_id` in `class_id`. Enrolling twice is a no-op.
    pub async fn enroll(db: &DbConn, class_id: i64, user_id: i64) -> Result<(), DbErr> {
        Entity::insert(ActiveModel {
            class_id: Set(class_id),
            user_id: Set(user_id),
        })
        .on_conflict(
            OnConflict::columns([Column::ClassId, Column::UserId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
        Ok(())
    }

    pub async fn is_enrolled(db: &DbConn, class_id: i64, user_id: i64) -> Result<bool, DbErr> {
        Ok(Entity::find_by_id((class_id, user_id)).one(db).await?.is_some())
    }

    pub async fn student_ids(db: &DbConn, class_id: i64) -> Result<Vec<i64>, DbErr> {
        Entity::find()
            .select_only()
            .column(Column::UserId)
            .filter(Column::ClassId.eq(class_id))
            .into_tuple::<i64>()
            .all(db)
            .await
    }

    pub async fn count_for_class(db: &DbConn, class_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .count(db)
            .await
    }
}
