//! Durable store collaborator.
//!
//! The uniqueness of (participant, session, day) is enforced by
//! [`AttendanceStore::insert_attendance_if_absent`] alone. Any existence check
//! the engine performs beforehand is a best-effort fast path.

mod memory;
mod sea_orm_store;

pub use memory::InMemoryStore;
pub use sea_orm_store::SeaOrmStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use db::models::{
    attendance_record::{AttendanceMethod, AttendanceStatus, Model as AttendanceRecord},
    biometric_profile::Model as BiometricProfile,
    enrollment::Model as Enrollment,
    location::Model as Location,
    session::Model as Session,
};
use sea_orm::DbErr;

/// An attendance record that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendance {
    pub user_id: i64,
    pub session_id: i64,
    pub day: NaiveDate,
    pub checked_in_at: DateTime<Utc>,
    pub method: AttendanceMethod,
    pub status: AttendanceStatus,
    pub verification: serde_json::Value,
    pub qr_token: Option<String>,
}

/// Outcome of an atomic insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(AttendanceRecord),
    /// A record for the same (participant, session, day) already existed.
    Duplicate,
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_session(&self, session_id: i64) -> Result<Option<Session>, DbErr>;

    /// Like [`find_session`](Self::find_session) but ignores archived sessions.
    async fn find_active_session(&self, session_id: i64) -> Result<Option<Session>, DbErr>;

    async fn find_enrollment(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<Option<Enrollment>, DbErr>;

    async fn find_location(&self, location_id: i64) -> Result<Option<Location>, DbErr>;

    async fn find_biometric_profile(&self, user_id: i64)
    -> Result<Option<BiometricProfile>, DbErr>;

    /// Best-effort pre-check; may race with a concurrent insert.
    async fn attendance_exists(
        &self,
        user_id: i64,
        session_id: i64,
        day: NaiveDate,
    ) -> Result<bool, DbErr>;

    /// Inserts the record unless one already exists for its key.
    ///
    /// Atomic with respect to concurrent callers on any instance: of several
    /// racing inserts for one key, exactly one returns `Inserted`.
    async fn insert_attendance_if_absent(
        &self,
        record: NewAttendance,
    ) -> Result<InsertOutcome, DbErr>;

    async fn count_enrolled(&self, course_id: i64) -> Result<u64, DbErr>;

    /// Records with status PRESENT or LATE for the session on `day`.
    async fn count_attendance(&self, session_id: i64, day: NaiveDate) -> Result<u64, DbErr>;

    async fn list_attendance(
        &self,
        session_id: i64,
        day: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, DbErr>;
}
