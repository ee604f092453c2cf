use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, Set};
use serde::Serialize;

/// A scheduled occurrence of a course. Created and archived by its owner; the
/// attendance engine only reads it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_id: i64,
    pub owner_id: i64,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub location_id: Option<i64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id"
    )]
    Location,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Fields needed to schedule a session.
#[derive(Debug, Clone)]
pub struct NewSession<'a> {
    pub course_id: i64,
    pub owner_id: i64,
    pub title: &'a str,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub location_id: Option<i64>,
    pub active: bool,
}

impl Model {
    pub async fn create(db: &DatabaseConnection, new: NewSession<'_>) -> Result<Self, DbErr> {
        if new.ends_at < new.starts_at {
            return Err(DbErr::Custom("Session cannot end before it starts".into()));
        }

        let now = Utc::now();
        ActiveModel {
            id: NotSet,
            course_id: Set(new.course_id),
            owner_id: Set(new.owner_id),
            title: Set(new.title.to_owned()),
            starts_at: Set(new.starts_at),
            ends_at: Set(new.ends_at),
            location_id: Set(new.location_id),
            active: Set(new.active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }

    /// Flips the active flag, e.g. when the owner archives the session.
    pub async fn set_active(
        db: &DatabaseConnection,
        id: i64,
        active: bool,
    ) -> Result<Self, DbErr> {
        let Some(row) = Entity::find_by_id(id).one(db).await? else {
            return Err(DbErr::RecordNotFound(format!("Session ID {id} not found")));
        };
        let mut active_model: ActiveModel = row.into();
        active_model.active = Set(active);
        active_model.updated_at = Set(Utc::now());
        active_model.update(db).await
    }

    #[inline]
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }
}
