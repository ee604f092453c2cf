use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The durable fact of a check-in.
///
/// At most one row exists per (`user_id`, `session_id`, `day`); the
/// `uq_attendance_user_session_day` index enforces it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub session_id: i64,
    pub day: NaiveDate,
    pub checked_in_at: DateTime<Utc>,
    pub method: AttendanceMethod,
    pub status: AttendanceStatus,
    /// Verdicts of every channel invoked for this check-in.
    pub verification: Json,
    pub qr_token: Option<String>,
}

/// How presence was proven.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Display, EnumString,
    Deserialize, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum AttendanceMethod {
    #[sea_orm(string_value = "FACE")]
    Face,
    #[sea_orm(string_value = "WIFI")]
    Wifi,
    #[sea_orm(string_value = "FACE_WIFI")]
    FaceWifi,
    #[sea_orm(string_value = "QR")]
    Qr,
}

impl AttendanceMethod {
    pub fn requires_face(self) -> bool {
        match self {
            AttendanceMethod::Face | AttendanceMethod::FaceWifi => true,
            AttendanceMethod::Wifi | AttendanceMethod::Qr => false,
        }
    }

    pub fn requires_wifi(self) -> bool {
        match self {
            AttendanceMethod::Wifi | AttendanceMethod::FaceWifi => true,
            AttendanceMethod::Face | AttendanceMethod::Qr => false,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString,
    Deserialize, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "PRESENT")]
    Present,
    #[sea_orm(string_value = "LATE")]
    Late,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::session::Entity",
        from = "Column::SessionId",
        to = "super::session::Column::Id"
    )]
    Session,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
