//! Error taxonomy of the attendance engine.

use sea_orm::DbErr;
use std::future::Future;
use std::time::Duration;

pub type AttendanceResult<T> = Result<T, AttendanceError>;

/// Every way a check-in, issuance or redemption can fail.
///
/// Client-caused and verification kinds are surfaced verbatim and never
/// retried by the engine. Only the internal kinds (`Store`, `StoreTimeout`,
/// `Cache`, `Serialization`) are eligible for a caller-side retry.
#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    #[error("Session not found or inactive")]
    SessionInactive,

    #[error("Participant is not enrolled for this session")]
    NotEnrolled,

    #[error("Check-in is outside the session window")]
    OutOfWindow,

    #[error("Attendance already recorded for this session today")]
    DuplicateCheckIn,

    #[error("Face did not match the enrolled profile")]
    FaceMismatch {
        confidence: f64,
        distance: Option<f64>,
    },

    #[error("Location did not match the session location")]
    LocationMismatch {
        confidence: f64,
        distance_meters: Option<f64>,
    },

    #[error("QR token not found")]
    TokenNotFound,

    #[error("QR token expired")]
    TokenExpired,

    #[error("{adapter} verifier timed out")]
    AdapterTimeout { adapter: &'static str },

    #[error("Only the session owner or an administrator may do this")]
    SessionNotOwned,

    #[error("No biometric profile enrolled")]
    ProfileNotFound,

    #[error("Biometric profile is not approved")]
    ProfileNotApproved,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Durable store timed out")]
    StoreTimeout,

    #[error("Database error: {0}")]
    Store(#[from] DbErr),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AttendanceError {
    /// Stable machine-readable code for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AttendanceError::SessionInactive => "SESSION_INACTIVE",
            AttendanceError::NotEnrolled => "NOT_ENROLLED",
            AttendanceError::OutOfWindow => "OUT_OF_WINDOW",
            AttendanceError::DuplicateCheckIn => "DUPLICATE_CHECK_IN",
            AttendanceError::FaceMismatch { .. } => "FACE_MISMATCH",
            AttendanceError::LocationMismatch { .. } => "LOCATION_MISMATCH",
            AttendanceError::TokenNotFound => "TOKEN_NOT_FOUND",
            AttendanceError::TokenExpired => "TOKEN_EXPIRED",
            AttendanceError::AdapterTimeout { .. } => "ADAPTER_TIMEOUT",
            AttendanceError::SessionNotOwned => "SESSION_NOT_OWNED",
            AttendanceError::ProfileNotFound => "PROFILE_NOT_FOUND",
            AttendanceError::ProfileNotApproved => "PROFILE_NOT_APPROVED",
            AttendanceError::InvalidRequest(_) => "INVALID_REQUEST",
            AttendanceError::StoreTimeout
            | AttendanceError::Store(_)
            | AttendanceError::Cache(_)
            | AttendanceError::Serialization(_) => "INTERNAL",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AttendanceError::StoreTimeout
                | AttendanceError::Store(_)
                | AttendanceError::Cache(_)
                | AttendanceError::Serialization(_)
        )
    }

    /// Verification failures carry the verdict's confidence back to the caller.
    pub fn confidence(&self) -> Option<f64> {
        match self {
            AttendanceError::FaceMismatch { confidence, .. }
            | AttendanceError::LocationMismatch { confidence, .. } => Some(*confidence),
            _ => None,
        }
    }

    pub fn distance(&self) -> Option<f64> {
        match self {
            AttendanceError::FaceMismatch { distance, .. } => *distance,
            AttendanceError::LocationMismatch {
                distance_meters, ..
            } => *distance_meters,
            _ => None,
        }
    }
}

/// Runs a store or cache call; an overrun of `limit` becomes `StoreTimeout`.
pub(crate) async fn bounded<T, E, F>(limit: Duration, fut: F) -> AttendanceResult<T>
where
    F: Future<Output = Result<T, E>>,
    AttendanceError: From<E>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => Ok(res?),
        Err(_) => Err(AttendanceError::StoreTimeout),
    }
}
