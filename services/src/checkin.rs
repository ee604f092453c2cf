//! The check-in orchestrator.
//!
//! Every path that creates an attendance record goes through here: direct
//! biometric/network check-ins and QR redemptions alike. Preconditions run in
//! a fixed order and the first failure wins; nothing is written unless all of
//! them and every requested verification pass.

use chrono::{DateTime, NaiveDate, Utc};
use db::models::{
    attendance_record::{AttendanceMethod, Model as AttendanceRecord},
    session::Model as Session,
};
use sea_orm::DbErr;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::aggregate::{AggregateCache, SessionAggregate};
use crate::cache::EphemeralStore;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{AttendanceError, AttendanceResult, bounded};
use crate::policy::{calendar_day, status_for, within_window};
use crate::qr::{QrSession, QrSessionManager};
use crate::store::{AttendanceStore, InsertOutcome, NewAttendance};
use crate::verifier::{Coordinates, FaceVerifier, GeofenceVerifier, Verdict};

/// Inputs of a single check-in attempt.
#[derive(Debug, Clone)]
pub struct CheckInRequest {
    pub session_id: i64,
    pub method: AttendanceMethod,
    pub face_sample: Option<Vec<f64>>,
    pub observed_ssid: Option<String>,
    pub coordinates: Option<Coordinates>,
    /// Only read for `QR`.
    pub qr_token: Option<String>,
}

impl CheckInRequest {
    pub fn new(session_id: i64, method: AttendanceMethod) -> Self {
        Self {
            session_id,
            method,
            face_sample: None,
            observed_ssid: None,
            coordinates: None,
            qr_token: None,
        }
    }
}

/// Who is acting on a session: issuing tokens or reading its attendance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub admin: bool,
}

impl Actor {
    pub fn may_manage(&self, session: &Session) -> bool {
        self.admin || session.is_owned_by(self.user_id)
    }
}

/// Evidence persisted alongside a record.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerificationPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    face: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wifi: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    qr: Option<QrEvidence>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QrEvidence {
    issuer_id: i64,
    issued_at: DateTime<Utc>,
}

/// Session, day and instant that passed the shared preconditions.
struct Admitted {
    session: Session,
    day: NaiveDate,
    now: DateTime<Utc>,
}

#[derive(Clone)]
pub struct CheckInOrchestrator {
    config: EngineConfig,
    store: Arc<dyn AttendanceStore>,
    face: Arc<dyn FaceVerifier>,
    geofence: Arc<dyn GeofenceVerifier>,
    clock: Arc<dyn Clock>,
    qr: QrSessionManager,
    aggregates: AggregateCache,
}

impl CheckInOrchestrator {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn AttendanceStore>,
        cache: Arc<dyn EphemeralStore>,
        face: Arc<dyn FaceVerifier>,
        geofence: Arc<dyn GeofenceVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let qr = QrSessionManager::new(cache.clone(), clock.clone(), config.store_timeout);
        let aggregates = AggregateCache::new(
            store.clone(),
            cache,
            clock.clone(),
            config.aggregate_ttl,
            config.store_timeout,
        );
        Self {
            config,
            store,
            face,
            geofence,
            clock,
            qr,
            aggregates,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn aggregates(&self) -> &AggregateCache {
        &self.aggregates
    }

    /// The calendar day "now" belongs to.
    pub fn today(&self) -> NaiveDate {
        calendar_day(self.clock.now(), self.config.day_offset_minutes)
    }

    /// Records the participant's attendance for `request.session_id` today.
    pub async fn check_in(
        &self,
        participant_id: i64,
        request: CheckInRequest,
    ) -> AttendanceResult<AttendanceRecord> {
        let method = request.method;
        let session_id = request.session_id;
        let result = if method == AttendanceMethod::Qr {
            match request.qr_token.as_deref() {
                Some(token) if !token.is_empty() => {
                    self.redeem(token, participant_id, Some(session_id)).await
                }
                _ => Err(AttendanceError::InvalidRequest(
                    "qrToken is required for QR check-in".into(),
                )),
            }
        } else {
            self.verified_check_in(participant_id, request).await
        };

        log_outcome(participant_id, Some(session_id), method, &result);
        result
    }

    /// Mints a QR token for an active session the issuer manages.
    ///
    /// `ttl_seconds` beyond the configured maximum is capped to it.
    pub async fn issue_qr(
        &self,
        session_id: i64,
        issuer: Actor,
        ttl_seconds: u64,
    ) -> AttendanceResult<QrSession> {
        if ttl_seconds == 0 {
            return Err(AttendanceError::InvalidRequest(
                "ttlSeconds must be positive".into(),
            ));
        }

        let session = self
            .bounded(self.store.find_active_session(session_id))
            .await?
            .ok_or(AttendanceError::SessionInactive)?;
        if !issuer.may_manage(&session) {
            return Err(AttendanceError::SessionNotOwned);
        }

        let ttl = Duration::from_secs(ttl_seconds).min(self.config.qr_max_ttl);
        let qr = self.qr.issue(session.id, issuer.user_id, ttl).await?;
        info!(
            session_id,
            issuer_id = issuer.user_id,
            expires_at = %qr.expires_at,
            "QR token issued"
        );
        Ok(qr)
    }

    /// Spends `token` and records a QR check-in for the participant.
    pub async fn redeem_qr(
        &self,
        token: &str,
        participant_id: i64,
    ) -> AttendanceResult<AttendanceRecord> {
        let result = self.redeem(token, participant_id, None).await;
        let session_id = result.as_ref().ok().map(|r| r.session_id);
        log_outcome(participant_id, session_id, AttendanceMethod::Qr, &result);
        result
    }

    /// Rollup for a session the viewer manages, cached or freshly counted.
    pub async fn session_aggregate(
        &self,
        session_id: i64,
        viewer: Actor,
        day: NaiveDate,
    ) -> AttendanceResult<SessionAggregate> {
        let session = self.managed_session(session_id, viewer).await?;
        self.aggregates.get(&session, day).await
    }

    pub async fn session_records(
        &self,
        session_id: i64,
        viewer: Actor,
        day: Option<NaiveDate>,
    ) -> AttendanceResult<Vec<AttendanceRecord>> {
        let session = self.managed_session(session_id, viewer).await?;
        self.bounded(self.store.list_attendance(session.id, day))
            .await
    }

    async fn managed_session(&self, session_id: i64, viewer: Actor) -> AttendanceResult<Session> {
        let session = self
            .bounded(self.store.find_session(session_id))
            .await?
            .ok_or(AttendanceError::SessionInactive)?;
        if !viewer.may_manage(&session) {
            return Err(AttendanceError::SessionNotOwned);
        }
        Ok(session)
    }

    async fn verified_check_in(
        &self,
        participant_id: i64,
        request: CheckInRequest,
    ) -> AttendanceResult<AttendanceRecord> {
        let method = request.method;
        let face_sample = match (method.requires_face(), request.face_sample) {
            (true, Some(sample)) if !sample.is_empty() => Some(sample),
            (true, _) => {
                return Err(AttendanceError::InvalidRequest(
                    "faceSample is required for face check-in".into(),
                ));
            }
            (false, _) => None,
        };
        let observed_ssid = match (method.requires_wifi(), request.observed_ssid) {
            (true, Some(ssid)) if !ssid.is_empty() => Some(ssid),
            (true, _) => {
                return Err(AttendanceError::InvalidRequest(
                    "observedSSID is required for WIFI check-in".into(),
                ));
            }
            (false, _) => None,
        };

        let admitted = self.admit(participant_id, request.session_id).await?;

        let mut evidence = VerificationPayload::default();
        if let Some(sample) = face_sample {
            evidence.face = Some(self.verify_face(participant_id, &sample).await?);
        }
        if let Some(ssid) = observed_ssid {
            evidence.wifi = Some(
                self.verify_location(&admitted.session, &ssid, request.coordinates)
                    .await?,
            );
        }

        self.record(participant_id, admitted, method, evidence, None)
            .await
    }

    async fn redeem(
        &self,
        token: &str,
        participant_id: i64,
        expected_session: Option<i64>,
    ) -> AttendanceResult<AttendanceRecord> {
        let qr = self.qr.consume(token).await?;
        if expected_session.is_some_and(|id| id != qr.session_id) {
            return Err(AttendanceError::InvalidRequest(
                "QR token belongs to a different session".into(),
            ));
        }

        let admitted = self.admit(participant_id, qr.session_id).await?;
        let evidence = VerificationPayload {
            qr: Some(QrEvidence {
                issuer_id: qr.issuer_id,
                issued_at: qr.issued_at,
            }),
            ..Default::default()
        };
        self.record(
            participant_id,
            admitted,
            AttendanceMethod::Qr,
            evidence,
            Some(qr.token),
        )
        .await
    }

    /// Active session, enrollment, timing window and the duplicate fast path,
    /// in that order.
    async fn admit(&self, participant_id: i64, session_id: i64) -> AttendanceResult<Admitted> {
        let session = self
            .bounded(self.store.find_active_session(session_id))
            .await?
            .ok_or(AttendanceError::SessionInactive)?;

        self.bounded(self.store.find_enrollment(participant_id, session.course_id))
            .await?
            .ok_or(AttendanceError::NotEnrolled)?;

        let now = self.clock.now();
        if !within_window(
            session.starts_at,
            session.ends_at,
            self.config.grace_period,
            now,
        ) {
            return Err(AttendanceError::OutOfWindow);
        }

        let day = calendar_day(now, self.config.day_offset_minutes);
        if self
            .bounded(self.store.attendance_exists(participant_id, session.id, day))
            .await?
        {
            return Err(AttendanceError::DuplicateCheckIn);
        }

        Ok(Admitted { session, day, now })
    }

    async fn verify_face(&self, participant_id: i64, sample: &[f64]) -> AttendanceResult<Verdict> {
        let profile = self
            .bounded(self.store.find_biometric_profile(participant_id))
            .await?
            .ok_or(AttendanceError::ProfileNotFound)?;
        if !profile.is_approved() {
            return Err(AttendanceError::ProfileNotApproved);
        }

        let descriptors = profile.descriptor_vectors();
        let verdict = tokio::time::timeout(
            self.config.adapter_timeout,
            self.face
                .verify(sample, &descriptors, self.config.face_match_threshold),
        )
        .await
        .map_err(|_| {
            warn!(adapter = "face", participant_id, "Verifier timed out");
            AttendanceError::AdapterTimeout { adapter: "face" }
        })?;

        if !verdict.matched {
            return Err(AttendanceError::FaceMismatch {
                confidence: verdict.confidence,
                distance: verdict.distance,
            });
        }
        Ok(verdict)
    }

    async fn verify_location(
        &self,
        session: &Session,
        observed_ssid: &str,
        observed: Option<Coordinates>,
    ) -> AttendanceResult<Verdict> {
        let location = match session.location_id {
            Some(id) => self.bounded(self.store.find_location(id)).await?,
            None => None,
        };
        let Some(location) = location else {
            return Err(AttendanceError::LocationMismatch {
                confidence: 0.0,
                distance_meters: None,
            });
        };

        let expected = location.coordinates().map(Coordinates::from);
        let verdict = tokio::time::timeout(
            self.config.adapter_timeout,
            self.geofence
                .verify(observed_ssid, &location.ssid, observed, expected),
        )
        .await
        .map_err(|_| {
            warn!(adapter = "geofence", session_id = session.id, "Verifier timed out");
            AttendanceError::AdapterTimeout { adapter: "geofence" }
        })?;

        if !verdict.matched {
            return Err(AttendanceError::LocationMismatch {
                confidence: verdict.confidence,
                distance_meters: verdict.distance,
            });
        }
        Ok(verdict)
    }

    /// Atomic insert, then the aggregate refresh. A failed refresh is logged
    /// and never undoes the committed record.
    async fn record(
        &self,
        participant_id: i64,
        admitted: Admitted,
        method: AttendanceMethod,
        evidence: VerificationPayload,
        qr_token: Option<String>,
    ) -> AttendanceResult<AttendanceRecord> {
        let Admitted { session, day, now } = admitted;
        let new = NewAttendance {
            user_id: participant_id,
            session_id: session.id,
            day,
            checked_in_at: now,
            method,
            status: status_for(session.starts_at, self.config.late_threshold, now),
            verification: serde_json::to_value(&evidence)?,
            qr_token,
        };

        let record = match self
            .bounded(self.store.insert_attendance_if_absent(new))
            .await?
        {
            InsertOutcome::Inserted(record) => record,
            InsertOutcome::Duplicate => return Err(AttendanceError::DuplicateCheckIn),
        };

        if let Err(e) = self.aggregates.recompute_for(&session, day).await {
            warn!(session_id = session.id, %day, error = %e, "Aggregate recompute failed");
        }

        Ok(record)
    }

    async fn bounded<T, F>(&self, fut: F) -> AttendanceResult<T>
    where
        F: Future<Output = Result<T, DbErr>>,
    {
        bounded(self.config.store_timeout, fut).await
    }
}

/// `session_id` is `None` when a redemption failed before the token's session
/// was known.
fn log_outcome(
    participant_id: i64,
    session_id: Option<i64>,
    method: AttendanceMethod,
    result: &AttendanceResult<AttendanceRecord>,
) {
    match result {
        Ok(record) => info!(
            user_id = participant_id,
            session_id = session_id.unwrap_or(record.session_id),
            %method,
            status = %record.status,
            "Check-in recorded"
        ),
        Err(e) if e.is_retryable() => error!(
            user_id = participant_id,
            session_id,
            %method,
            error = %e,
            "Check-in failed"
        ),
        Err(
            e @ (AttendanceError::FaceMismatch { .. }
            | AttendanceError::LocationMismatch { .. }
            | AttendanceError::AdapterTimeout { .. }),
        ) => warn!(
            user_id = participant_id,
            session_id,
            %method,
            kind = e.kind(),
            confidence = e.confidence(),
            "Check-in verification failed"
        ),
        Err(e) => info!(
            user_id = participant_id,
            session_id,
            %method,
            kind = e.kind(),
            "Check-in rejected"
        ),
    }
}
