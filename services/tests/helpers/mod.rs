#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use db::models::{
    attendance_record::Model as AttendanceRecord,
    biometric_profile::{Model as BiometricProfile, ProfileStatus},
    enrollment::Model as Enrollment,
    location::Model as Location,
    session::Model as Session,
};
use sea_orm::DbErr;
use serde_json::json;
use services::store::{AttendanceStore, InsertOutcome, NewAttendance};
use services::verifier::{FixedFaceVerifier, FixedGeofenceVerifier};
use services::{CheckInOrchestrator, Clock, EngineConfig, InMemoryStore, ManualClock, MemoryCache};
use std::sync::Arc;
use std::time::Duration;

pub const SESSION_ID: i64 = 1;
pub const COURSE_ID: i64 = 10;
pub const OWNER_ID: i64 = 100;
pub const PARTICIPANT_ID: i64 = 1;
pub const LOCATION_ID: i64 = 5;
pub const ROOM_SSID: &str = "Lab-5";

/// 2025-03-03 at the given UTC time.
pub fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, h, m, s).unwrap()
}

pub fn session(id: i64, location_id: Option<i64>, active: bool) -> Session {
    Session {
        id,
        course_id: COURSE_ID,
        owner_id: OWNER_ID,
        title: format!("Lecture {id}"),
        starts_at: at(10, 0, 0),
        ends_at: at(11, 0, 0),
        location_id,
        active,
        created_at: at(8, 0, 0),
        updated_at: at(8, 0, 0),
    }
}

pub fn profile(user_id: i64, status: ProfileStatus) -> BiometricProfile {
    BiometricProfile {
        user_id,
        descriptors: json!([[0.1, 0.2, 0.3]]),
        status,
        updated_at: at(8, 0, 0),
    }
}

/// An engine over in-memory collaborators, seeded with one 10:00-11:00
/// session in a room and one enrolled participant with an approved profile.
/// The clock starts at 10:05.
pub struct Harness {
    pub engine: CheckInOrchestrator,
    pub store: Arc<InMemoryStore>,
    pub cache: Arc<MemoryCache>,
    pub clock: ManualClock,
    pub face: Arc<FixedFaceVerifier>,
    pub geofence: Arc<FixedGeofenceVerifier>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::build(
            EngineConfig::default(),
            FixedFaceVerifier::matching(0.9),
            FixedGeofenceVerifier::matching(1.0),
        )
        .await
    }

    pub async fn build(
        config: EngineConfig,
        face: FixedFaceVerifier,
        geofence: FixedGeofenceVerifier,
    ) -> Self {
        let clock = ManualClock::new(at(10, 5, 0));
        let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(MemoryCache::new(shared_clock.clone()));
        let face = Arc::new(face);
        let geofence = Arc::new(geofence);

        store.put_session(session(SESSION_ID, Some(LOCATION_ID), true)).await;
        store
            .put_location(Location {
                id: LOCATION_ID,
                name: "Lab 5".into(),
                ssid: ROOM_SSID.into(),
                latitude: None,
                longitude: None,
            })
            .await;
        store.enroll(PARTICIPANT_ID, COURSE_ID).await;
        store
            .put_profile(profile(PARTICIPANT_ID, ProfileStatus::Approved))
            .await;

        let engine = CheckInOrchestrator::new(
            config,
            store.clone(),
            cache.clone(),
            face.clone(),
            geofence.clone(),
            shared_clock,
        );

        Self {
            engine,
            store,
            cache,
            clock,
            face,
            geofence,
        }
    }

    /// A second engine sharing this harness's cache, verifiers and clock but
    /// reading and writing through `store`.
    pub fn engine_over(
        &self,
        config: EngineConfig,
        store: Arc<dyn AttendanceStore>,
    ) -> CheckInOrchestrator {
        CheckInOrchestrator::new(
            config,
            store,
            self.cache.clone(),
            self.face.clone(),
            self.geofence.clone(),
            Arc::new(self.clock.clone()),
        )
    }
}

/// Delegates to an [`InMemoryStore`] with selected behaviour altered.
pub struct AlteredStore {
    pub inner: Arc<InMemoryStore>,
    /// `count_enrolled` never completes.
    pub hang_counts: bool,
    /// `attendance_exists` always answers `false`.
    pub skip_precheck: bool,
}

impl AlteredStore {
    pub fn hanging_counts(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            hang_counts: true,
            skip_precheck: false,
        }
    }

    pub fn without_precheck(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            hang_counts: false,
            skip_precheck: true,
        }
    }
}

#[async_trait]
impl AttendanceStore for AlteredStore {
    async fn find_session(&self, session_id: i64) -> Result<Option<Session>, DbErr> {
        self.inner.find_session(session_id).await
    }

    async fn find_active_session(&self, session_id: i64) -> Result<Option<Session>, DbErr> {
        self.inner.find_active_session(session_id).await
    }

    async fn find_enrollment(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<Option<Enrollment>, DbErr> {
        self.inner.find_enrollment(user_id, course_id).await
    }

    async fn find_location(&self, location_id: i64) -> Result<Option<Location>, DbErr> {
        self.inner.find_location(location_id).await
    }

    async fn find_biometric_profile(
        &self,
        user_id: i64,
    ) -> Result<Option<BiometricProfile>, DbErr> {
        self.inner.find_biometric_profile(user_id).await
    }

    async fn attendance_exists(
        &self,
        user_id: i64,
        session_id: i64,
        day: NaiveDate,
    ) -> Result<bool, DbErr> {
        if self.skip_precheck {
            return Ok(false);
        }
        self.inner.attendance_exists(user_id, session_id, day).await
    }

    async fn insert_attendance_if_absent(
        &self,
        record: NewAttendance,
    ) -> Result<InsertOutcome, DbErr> {
        self.inner.insert_attendance_if_absent(record).await
    }

    async fn count_enrolled(&self, course_id: i64) -> Result<u64, DbErr> {
        if self.hang_counts {
            tokio::time::sleep(Duration::from_secs(3_600)).await;
        }
        self.inner.count_enrolled(course_id).await
    }

    async fn count_attendance(&self, session_id: i64, day: NaiveDate) -> Result<u64, DbErr> {
        self.inner.count_attendance(session_id, day).await
    }

    async fn list_attendance(
        &self,
        session_id: i64,
        day: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, DbErr> {
        self.inner.list_attendance(session_id, day).await
    }
}
