//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_duration_minutes: u64,
    /// `database` (shared across instances) or `memory` (single process only).
    pub cache_backend: String,
    pub check_in_grace_minutes: i64,
    pub late_threshold_minutes: i64,
    pub face_match_threshold: f64,
    pub geofence_radius_meters: f64,
    pub adapter_timeout_ms: u64,
    pub store_timeout_ms: u64,
    pub aggregate_ttl_seconds: u64,
    pub qr_max_ttl_seconds: u64,
    pub day_offset_minutes: i32,
    pub cache_purge_interval_seconds: u64,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

/// Reads `key` and parses it, falling back to `default` when unset or malformed.
fn parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Every value has a default so the singleton can always be built; the
    /// server binary refuses to start when `jwt_secret` is left empty.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "rollcall".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "api=info,services=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/rollcall.db".into()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: parsed("PORT", 3000),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_default(),
            jwt_duration_minutes: parsed("JWT_DURATION_MINUTES", 60),
            cache_backend: env::var("CACHE_BACKEND").unwrap_or_else(|_| "database".into()),
            check_in_grace_minutes: parsed("CHECK_IN_GRACE_MINUTES", 15),
            late_threshold_minutes: parsed("LATE_THRESHOLD_MINUTES", 10),
            face_match_threshold: parsed("FACE_MATCH_THRESHOLD", 0.6),
            geofence_radius_meters: parsed("GEOFENCE_RADIUS_METERS", 100.0),
            adapter_timeout_ms: parsed("ADAPTER_TIMEOUT_MS", 5_000),
            store_timeout_ms: parsed("STORE_TIMEOUT_MS", 5_000),
            aggregate_ttl_seconds: parsed("AGGREGATE_TTL_SECONDS", 3_600),
            qr_max_ttl_seconds: parsed("QR_MAX_TTL_SECONDS", 3_600),
            day_offset_minutes: parsed("DAY_OFFSET_MINUTES", 0),
            cache_purge_interval_seconds: parsed("CACHE_PURGE_INTERVAL_SECONDS", 60),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            if let Ok(mut guard) = lock.write() {
                *guard = AppConfig::from_env();
            }
        }
    }

    /// Generic internal setter for any field in the config.
    ///
    /// Used by public per-field setter methods.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_jwt_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.jwt_secret = value.into());
    }

    pub fn set_jwt_duration_minutes(value: impl Into<u64>) {
        AppConfig::set_field(|cfg| cfg.jwt_duration_minutes = value.into());
    }

    pub fn set_cache_backend(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.cache_backend = value.into());
    }

    pub fn set_late_threshold_minutes(value: i64) {
        AppConfig::set_field(|cfg| cfg.late_threshold_minutes = value);
    }
}

// --- Free accessors, mirroring the fields most call sites need ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn jwt_secret() -> String {
    AppConfig::global().jwt_secret.clone()
}

pub fn jwt_duration_minutes() -> u64 {
    AppConfig::global().jwt_duration_minutes
}

pub fn cache_backend() -> String {
    AppConfig::global().cache_backend.clone()
}

pub fn cache_purge_interval_seconds() -> u64 {
    AppConfig::global().cache_purge_interval_seconds
}
