#![allow(dead_code)]

use api::{app, state::AppState};
use axum::{
    Router,
    body::{Body, to_bytes},
    extract::ConnectInfo,
    http::{Request, StatusCode},
};
use chrono::{TimeZone, Utc};
use db::models::{
    biometric_profile::{self, ProfileStatus},
    course, enrollment, location,
    session::{self, NewSession},
    user,
};
use db::test_utils::setup_test_db;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use services::verifier::{DescriptorFaceVerifier, SsidGeofenceVerifier};
use services::{CheckInOrchestrator, Clock, DatabaseCache, EngineConfig, ManualClock, SeaOrmStore};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tower::ServiceExt;
use util::config::AppConfig;

pub const ROOM_SSID: &str = "UP-IT44";

/// A router over a fresh in-memory database seeded with one course, its
/// owner, an admin, one enrolled student with an approved face profile, one
/// outsider and a 10:00-11:00 session. The clock reads 10:05.
pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    pub clock: ManualClock,
    pub owner: user::Model,
    pub admin: user::Model,
    pub student: user::Model,
    pub outsider: user::Model,
    pub course: course::Model,
    pub session: session::Model,
}

pub async fn make_test_app() -> TestApp {
    AppConfig::set_jwt_secret("attendance-test-secret");
    AppConfig::set_jwt_duration_minutes(60u64);

    let db = setup_test_db().await;

    let owner = user::Model::create(&db, "owner", "owner@test.com", false).await.unwrap();
    let admin = user::Model::create(&db, "admin", "admin@test.com", true).await.unwrap();
    let student = user::Model::create(&db, "student", "student@test.com", false)
        .await
        .unwrap();
    let outsider = user::Model::create(&db, "outsider", "outsider@test.com", false)
        .await
        .unwrap();

    let course = course::Model::create(&db, "COS301", "Software Engineering", owner.id)
        .await
        .unwrap();
    enrollment::Model::enroll(&db, student.id, course.id).await.unwrap();
    biometric_profile::Model::upsert(
        &db,
        student.id,
        &[vec![0.1, 0.2, 0.3]],
        ProfileStatus::Approved,
    )
    .await
    .unwrap();

    let room = location::Model::create(&db, "IT 4-4", ROOM_SSID, Some((-25.7545, 28.2314)))
        .await
        .unwrap();
    let session = session::Model::create(
        &db,
        NewSession {
            course_id: course.id,
            owner_id: owner.id,
            title: "Week 3 lecture",
            starts_at: Utc.with_ymd_and_hms(2025, 3, 3, 10, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2025, 3, 3, 11, 0, 0).unwrap(),
            location_id: Some(room.id),
            active: true,
        },
    )
    .await
    .unwrap();

    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 3, 10, 5, 0).unwrap());
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let config = EngineConfig::default();
    let engine = CheckInOrchestrator::new(
        config.clone(),
        Arc::new(SeaOrmStore::new(db.clone())),
        Arc::new(DatabaseCache::new(db.clone(), shared.clone())),
        Arc::new(DescriptorFaceVerifier),
        Arc::new(SsidGeofenceVerifier::new(config.geofence_radius_meters)),
        shared,
    );

    TestApp {
        router: app(AppState::new(db.clone(), engine)),
        db,
        clock,
        owner,
        admin,
        student,
        outsider,
        course,
        session,
    }
}

pub fn token_for(user: &user::Model) -> String {
    api::auth::generate_jwt(user.id, user.admin).unwrap().0
}

/// Builds a request with a peer address attached, the way the server's
/// connect-info service would.
pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let mut req = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)), 43210);
    req.extensions_mut().insert(ConnectInfo(addr));
    req
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }
}
