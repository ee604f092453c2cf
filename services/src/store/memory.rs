use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use db::models::{
    attendance_record::{AttendanceStatus, Model as AttendanceRecord},
    biometric_profile::Model as BiometricProfile,
    enrollment::Model as Enrollment,
    location::Model as Location,
    session::Model as Session,
};
use sea_orm::DbErr;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{AttendanceStore, InsertOutcome, NewAttendance};

#[derive(Default)]
struct Tables {
    sessions: HashMap<i64, Session>,
    enrollments: HashMap<(i64, i64), Enrollment>,
    locations: HashMap<i64, Location>,
    profiles: HashMap<i64, BiometricProfile>,
    records: Vec<AttendanceRecord>,
    next_record_id: i64,
}

/// Deterministic in-process store for tests.
///
/// Every operation runs under one mutex, so `insert_attendance_if_absent` is
/// atomic the same way a unique index makes it atomic in the database.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_session(&self, session: Session) {
        self.tables.lock().await.sessions.insert(session.id, session);
    }

    pub async fn enroll(&self, user_id: i64, course_id: i64) {
        self.tables.lock().await.enrollments.insert(
            (user_id, course_id),
            Enrollment {
                user_id,
                course_id,
                enrolled_at: Utc::now(),
            },
        );
    }

    pub async fn put_location(&self, location: Location) {
        self.tables
            .lock()
            .await
            .locations
            .insert(location.id, location);
    }

    pub async fn put_profile(&self, profile: BiometricProfile) {
        self.tables
            .lock()
            .await
            .profiles
            .insert(profile.user_id, profile);
    }

    pub async fn records(&self) -> Vec<AttendanceRecord> {
        self.tables.lock().await.records.clone()
    }
}

#[async_trait]
impl AttendanceStore for InMemoryStore {
    async fn find_session(&self, session_id: i64) -> Result<Option<Session>, DbErr> {
        Ok(self.tables.lock().await.sessions.get(&session_id).cloned())
    }

    async fn find_active_session(&self, session_id: i64) -> Result<Option<Session>, DbErr> {
        Ok(self
            .tables
            .lock()
            .await
            .sessions
            .get(&session_id)
            .filter(|s| s.active)
            .cloned())
    }

    async fn find_enrollment(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<Option<Enrollment>, DbErr> {
        Ok(self
            .tables
            .lock()
            .await
            .enrollments
            .get(&(user_id, course_id))
            .cloned())
    }

    async fn find_location(&self, location_id: i64) -> Result<Option<Location>, DbErr> {
        Ok(self.tables.lock().await.locations.get(&location_id).cloned())
    }

    async fn find_biometric_profile(
        &self,
        user_id: i64,
    ) -> Result<Option<BiometricProfile>, DbErr> {
        Ok(self.tables.lock().await.profiles.get(&user_id).cloned())
    }

    async fn attendance_exists(
        &self,
        user_id: i64,
        session_id: i64,
        day: NaiveDate,
    ) -> Result<bool, DbErr> {
        Ok(self
            .tables
            .lock()
            .await
            .records
            .iter()
            .any(|r| r.user_id == user_id && r.session_id == session_id && r.day == day))
    }

    async fn insert_attendance_if_absent(
        &self,
        record: NewAttendance,
    ) -> Result<InsertOutcome, DbErr> {
        let mut tables = self.tables.lock().await;
        let exists = tables.records.iter().any(|r| {
            r.user_id == record.user_id && r.session_id == record.session_id && r.day == record.day
        });
        if exists {
            return Ok(InsertOutcome::Duplicate);
        }

        tables.next_record_id += 1;
        let row = AttendanceRecord {
            id: tables.next_record_id,
            user_id: record.user_id,
            session_id: record.session_id,
            day: record.day,
            checked_in_at: record.checked_in_at,
            method: record.method,
            status: record.status,
            verification: record.verification,
            qr_token: record.qr_token,
        };
        tables.records.push(row.clone());
        Ok(InsertOutcome::Inserted(row))
    }

    async fn count_enrolled(&self, course_id: i64) -> Result<u64, DbErr> {
        Ok(self
            .tables
            .lock()
            .await
            .enrollments
            .keys()
            .filter(|(_, c)| *c == course_id)
            .count() as u64)
    }

    async fn count_attendance(&self, session_id: i64, day: NaiveDate) -> Result<u64, DbErr> {
        Ok(self
            .tables
            .lock()
            .await
            .records
            .iter()
            .filter(|r| r.session_id == session_id && r.day == day)
            .filter(|r| matches!(r.status, AttendanceStatus::Present | AttendanceStatus::Late))
            .count() as u64)
    }

    async fn list_attendance(
        &self,
        session_id: i64,
        day: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, DbErr> {
        Ok(self
            .tables
            .lock()
            .await
            .records
            .iter()
            .filter(|r| r.session_id == session_id && day.is_none_or(|d| r.day == d))
            .cloned()
            .collect())
    }
}
