//! Shared state handed to every route handler.

use chrono::Duration;
use sea_orm::DatabaseConnection;
use services::verifier::{DescriptorFaceVerifier, SsidGeofenceVerifier};
use services::{
    CheckInOrchestrator, Clock, DatabaseCache, EngineConfig, EphemeralStore, MemoryCache,
    SeaOrmStore, SystemClock,
};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use util::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    engine: CheckInOrchestrator,
}

impl AppState {
    pub fn new(db: DatabaseConnection, engine: CheckInOrchestrator) -> Self {
        Self { db, engine }
    }

    /// Production wiring: SQLite-backed store, the configured ephemeral
    /// backend, the built-in verifiers and the system clock.
    pub fn from_config(db: DatabaseConnection) -> Self {
        let cfg = AppConfig::global().clone();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let engine_config = engine_config(&cfg);

        let engine = CheckInOrchestrator::new(
            engine_config.clone(),
            Arc::new(SeaOrmStore::new(db.clone())),
            ephemeral_store(&cfg.cache_backend, db.clone(), clock.clone()),
            Arc::new(DescriptorFaceVerifier),
            Arc::new(SsidGeofenceVerifier::new(engine_config.geofence_radius_meters)),
            clock,
        );

        Self::new(db, engine)
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn engine(&self) -> &CheckInOrchestrator {
        &self.engine
    }
}

pub fn engine_config(cfg: &AppConfig) -> EngineConfig {
    EngineConfig {
        grace_period: Duration::minutes(cfg.check_in_grace_minutes),
        late_threshold: Duration::minutes(cfg.late_threshold_minutes),
        face_match_threshold: cfg.face_match_threshold,
        geofence_radius_meters: cfg.geofence_radius_meters,
        adapter_timeout: StdDuration::from_millis(cfg.adapter_timeout_ms),
        store_timeout: StdDuration::from_millis(cfg.store_timeout_ms),
        aggregate_ttl: StdDuration::from_secs(cfg.aggregate_ttl_seconds),
        qr_max_ttl: StdDuration::from_secs(cfg.qr_max_ttl_seconds),
        day_offset_minutes: cfg.day_offset_minutes,
    }
}

/// `memory` keeps tokens in this process only; anything else shares them
/// through the database.
pub fn ephemeral_store(
    backend: &str,
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
) -> Arc<dyn EphemeralStore> {
    match backend.trim().to_ascii_lowercase().as_str() {
        "memory" => Arc::new(MemoryCache::new(clock)),
        _ => Arc::new(DatabaseCache::new(db, clock)),
    }
}
