use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A participant's enrolled face descriptors plus the review status of the enrollment.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "biometric_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    /// JSON array of numeric vectors.
    pub descriptors: Json,
    pub status: ProfileStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString,
    Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProfileStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Inserts or replaces the profile for `user_id`.
    pub async fn upsert(
        db: &DatabaseConnection,
        user_id: i64,
        descriptors: &[Vec<f64>],
        status: ProfileStatus,
    ) -> Result<Self, DbErr> {
        let descriptors = serde_json::to_value(descriptors)
            .map_err(|e| DbErr::Custom(format!("Invalid descriptors: {e}")))?;

        let active = ActiveModel {
            user_id: Set(user_id),
            descriptors: Set(descriptors),
            status: Set(status),
            updated_at: Set(Utc::now()),
        };

        match Entity::find_by_id(user_id).one(db).await? {
            Some(_) => active.update(db).await,
            None => active.insert(db).await,
        }
    }

    #[inline]
    pub fn is_approved(&self) -> bool {
        self.status == ProfileStatus::Approved
    }

    /// Decodes the stored descriptor set. Malformed entries decode to an empty set,
    /// which never matches.
    pub fn descriptor_vectors(&self) -> Vec<Vec<f64>> {
        serde_json::from_value(self.descriptors.clone()).unwrap_or_default()
    }
}
