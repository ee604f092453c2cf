use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use validator::Validate;

use super::common::{
    AttendanceRecordResponse, CheckInReq, IssueQrReq, QrIssuedResponse, RedeemQrReq,
    error_response,
};
use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::format_validation_errors;
use crate::state::AppState;

fn validation_failure(errors: &validator::ValidationErrors) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(format_validation_errors(errors))),
    )
        .into_response()
}

/// POST /api/attendance/check-in
///
/// Records the caller's attendance for a session.
///
/// ### Request Body
/// ```json
/// {
///   "sessionId": 12,
///   "method": "FACE_WIFI",
///   "faceSample": [0.12, 0.03, 0.88],
///   "observedSSID": "UP-IT44",
///   "coordinates": { "latitude": -25.7545, "longitude": 28.2314 }
/// }
/// ```
/// `method` is one of `FACE`, `WIFI`, `FACE_WIFI` or `QR`; a `QR` check-in
/// carries `qrToken` instead of the biometric/network fields.
///
/// ### Responses
/// - `201 Created` with the attendance record
/// - `400 Bad Request` on validation, timing, duplicate, verification or token failures
/// - `401 Unauthorized`
/// - `403 Forbidden` when the caller is not enrolled
/// - `404 Not Found` when the session is unknown/archived or no face profile exists
pub async fn check_in(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CheckInReq>,
) -> Response {
    if let Err(errors) = req.validate() {
        return validation_failure(&errors);
    }

    match state.engine().check_in(user.0.sub, req.into()).await {
        Ok(record) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                AttendanceRecordResponse::from(record),
                "Attendance recorded",
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/attendance/qr/issue
///
/// Mints a single-use QR token for a session the caller owns (or any
/// session, for administrators).
///
/// ### Request Body
/// ```json
/// { "sessionId": 12, "ttlSeconds": 300 }
/// ```
///
/// ### Responses
/// - `201 Created` → `{ "token": "...", "sessionId": 12, "expiresAt": "..." }`
/// - `400 Bad Request` for a TTL outside 1..=86400
/// - `403 Forbidden` when the caller does not own the session
/// - `404 Not Found` when the session is unknown or archived
pub async fn issue_qr(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<IssueQrReq>,
) -> Response {
    if let Err(errors) = req.validate() {
        return validation_failure(&errors);
    }

    match state
        .engine()
        .issue_qr(req.session_id, user.actor(), req.ttl_seconds)
        .await
    {
        Ok(qr) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                QrIssuedResponse::from(qr),
                "QR token issued",
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/attendance/qr/redeem
///
/// Spends a QR token and records the caller's attendance for its session.
/// The token is spent even when the check-in then fails.
///
/// ### Request Body
/// ```json
/// { "token": "9f2c...e1" }
/// ```
pub async fn redeem_qr(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<RedeemQrReq>,
) -> Response {
    if let Err(errors) = req.validate() {
        return validation_failure(&errors);
    }

    match state.engine().redeem_qr(&req.token, user.0.sub).await {
        Ok(record) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                AttendanceRecordResponse::from(record),
                "Attendance recorded",
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
