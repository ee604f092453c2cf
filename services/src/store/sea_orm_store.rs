use async_trait::async_trait;
use chrono::NaiveDate;
use db::models::{
    attendance_record::{self, AttendanceStatus, Model as AttendanceRecord},
    biometric_profile::{self, Model as BiometricProfile},
    enrollment::{self, Model as Enrollment},
    location::{self, Model as Location},
    session::{self, Model as Session},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};

use super::{AttendanceStore, InsertOutcome, NewAttendance};

/// Relational store backed by sea-orm.
///
/// Duplicate prevention rests on the `uq_attendance_user_session_day` unique
/// index; a violation of it is reported as [`InsertOutcome::Duplicate`].
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl AttendanceStore for SeaOrmStore {
    async fn find_session(&self, session_id: i64) -> Result<Option<Session>, DbErr> {
        session::Entity::find_by_id(session_id).one(&self.db).await
    }

    async fn find_active_session(&self, session_id: i64) -> Result<Option<Session>, DbErr> {
        session::Entity::find()
            .filter(session::Column::Id.eq(session_id))
            .filter(session::Column::Active.eq(true))
            .one(&self.db)
            .await
    }

    async fn find_enrollment(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<Option<Enrollment>, DbErr> {
        enrollment::Entity::find_by_id((user_id, course_id))
            .one(&self.db)
            .await
    }

    async fn find_location(&self, location_id: i64) -> Result<Option<Location>, DbErr> {
        location::Entity::find_by_id(location_id).one(&self.db).await
    }

    async fn find_biometric_profile(
        &self,
        user_id: i64,
    ) -> Result<Option<BiometricProfile>, DbErr> {
        biometric_profile::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
    }

    async fn attendance_exists(
        &self,
        user_id: i64,
        session_id: i64,
        day: NaiveDate,
    ) -> Result<bool, DbErr> {
        let count = attendance_record::Entity::find()
            .filter(attendance_record::Column::UserId.eq(user_id))
            .filter(attendance_record::Column::SessionId.eq(session_id))
            .filter(attendance_record::Column::Day.eq(day))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn insert_attendance_if_absent(
        &self,
        record: NewAttendance,
    ) -> Result<InsertOutcome, DbErr> {
        let active = attendance_record::ActiveModel {
            id: NotSet,
            user_id: Set(record.user_id),
            session_id: Set(record.session_id),
            day: Set(record.day),
            checked_in_at: Set(record.checked_in_at),
            method: Set(record.method),
            status: Set(record.status),
            verification: Set(record.verification),
            qr_token: Set(record.qr_token),
        };

        match active.insert(&self.db).await {
            Ok(row) => Ok(InsertOutcome::Inserted(row)),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Ok(InsertOutcome::Duplicate),
                _ => Err(err),
            },
        }
    }

    async fn count_enrolled(&self, course_id: i64) -> Result<u64, DbErr> {
        enrollment::Entity::find()
            .filter(enrollment::Column::CourseId.eq(course_id))
            .count(&self.db)
            .await
    }

    async fn count_attendance(&self, session_id: i64, day: NaiveDate) -> Result<u64, DbErr> {
        attendance_record::Entity::find()
            .filter(attendance_record::Column::SessionId.eq(session_id))
            .filter(attendance_record::Column::Day.eq(day))
            .filter(
                attendance_record::Column::Status
                    .is_in([AttendanceStatus::Present, AttendanceStatus::Late]),
            )
            .count(&self.db)
            .await
    }

    async fn list_attendance(
        &self,
        session_id: i64,
        day: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, DbErr> {
        let mut query = attendance_record::Entity::find()
            .filter(attendance_record::Column::SessionId.eq(session_id));
        if let Some(day) = day {
            query = query.filter(attendance_record::Column::Day.eq(day));
        }
        query
            .order_by_asc(attendance_record::Column::CheckedInAt)
            .all(&self.db)
            .await
    }
}
