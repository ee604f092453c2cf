use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use db::models::attendance_record::{AttendanceMethod, AttendanceStatus, Model as AttendanceRecord};
use serde::{Deserialize, Serialize};
use services::verifier::Coordinates;
use services::{AttendanceError, CheckInRequest, QrSession, SessionAggregate};
use validator::Validate;

use crate::response::ApiResponse;

#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct CoordinatesReq {
    #[validate(range(min = -90.0, max = 90.0, message = "latitude must be between -90 and 90"))]
    pub latitude: f64,
    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "longitude must be between -180 and 180"
    ))]
    pub longitude: f64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckInReq {
    pub session_id: i64,
    pub method: AttendanceMethod,
    #[validate(length(min = 1, message = "faceSample must not be empty"))]
    pub face_sample: Option<Vec<f64>>,
    #[serde(rename = "observedSSID", alias = "observedSsid")]
    #[validate(length(min = 1, max = 32, message = "observedSSID must be 1-32 characters"))]
    pub observed_ssid: Option<String>,
    #[validate(nested)]
    pub coordinates: Option<CoordinatesReq>,
    pub qr_token: Option<String>,
}

impl From<CheckInReq> for CheckInRequest {
    fn from(req: CheckInReq) -> Self {
        Self {
            session_id: req.session_id,
            method: req.method,
            face_sample: req.face_sample,
            observed_ssid: req.observed_ssid,
            coordinates: req.coordinates.map(|c| Coordinates {
                latitude: c.latitude,
                longitude: c.longitude,
            }),
            qr_token: req.qr_token,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueQrReq {
    pub session_id: i64,
    #[validate(range(min = 1, max = 86400, message = "ttlSeconds must be between 1 and 86400"))]
    pub ttl_seconds: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RedeemQrReq {
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DayQuery {
    pub day: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecordResponse {
    pub id: i64,
    pub user_id: i64,
    pub session_id: i64,
    pub day: String,
    pub checked_in_at: String,
    pub method: AttendanceMethod,
    pub status: AttendanceStatus,
    pub verification: serde_json::Value,
}

impl From<AttendanceRecord> for AttendanceRecordResponse {
    fn from(r: AttendanceRecord) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            session_id: r.session_id,
            day: r.day.format("%Y-%m-%d").to_string(),
            checked_in_at: r.checked_in_at.to_rfc3339(),
            method: r.method,
            status: r.status,
            verification: r.verification,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrIssuedResponse {
    pub token: String,
    pub session_id: i64,
    pub expires_at: String,
}

impl From<QrSession> for QrIssuedResponse {
    fn from(qr: QrSession) -> Self {
        Self {
            token: qr.token,
            session_id: qr.session_id,
            expires_at: qr.expires_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResponse {
    pub session_id: i64,
    pub day: String,
    pub enrolled: u64,
    pub present: u64,
    pub rate: f64,
    pub computed_at: String,
}

impl From<SessionAggregate> for AggregateResponse {
    fn from(a: SessionAggregate) -> Self {
        Self {
            session_id: a.session_id,
            day: a.day.format("%Y-%m-%d").to_string(),
            enrolled: a.enrolled,
            present: a.present,
            rate: a.rate,
            computed_at: a.computed_at.to_rfc3339(),
        }
    }
}

/// `data` of an engine error response.
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

pub fn status_for(err: &AttendanceError) -> StatusCode {
    use AttendanceError::*;
    match err {
        NotEnrolled | SessionNotOwned => StatusCode::FORBIDDEN,
        SessionInactive | ProfileNotFound => StatusCode::NOT_FOUND,
        OutOfWindow
        | DuplicateCheckIn
        | FaceMismatch { .. }
        | LocationMismatch { .. }
        | TokenNotFound
        | TokenExpired
        | AdapterTimeout { .. }
        | ProfileNotApproved
        | InvalidRequest(_) => StatusCode::BAD_REQUEST,
        StoreTimeout | Store(_) | Cache(_) | Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Renders an engine error in the standard envelope. Internal failures are
/// made opaque; their detail only goes to the log.
pub fn error_response(err: AttendanceError) -> Response {
    let status = status_for(&err);
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "Attendance request failed");
        "Internal server error".to_owned()
    } else {
        err.to_string()
    };

    let details = ErrorDetails {
        kind: err.kind(),
        confidence: err.confidence(),
        distance: err.distance(),
    };
    (status, Json(ApiResponse::failure(details, message))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(status_for(&AttendanceError::NotEnrolled), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&AttendanceError::SessionInactive), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&AttendanceError::ProfileNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&AttendanceError::DuplicateCheckIn), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&AttendanceError::AdapterTimeout { adapter: "face" }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&AttendanceError::Cache("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn check_in_body_uses_wire_names() {
        let body: CheckInReq = serde_json::from_value(serde_json::json!({
            "sessionId": 3,
            "method": "FACE_WIFI",
            "faceSample": [0.1, 0.2],
            "observedSSID": "Lab-5",
            "coordinates": { "latitude": -25.7, "longitude": 28.2 }
        }))
        .unwrap();

        assert!(body.validate().is_ok());
        let request = CheckInRequest::from(body);
        assert_eq!(request.method, AttendanceMethod::FaceWifi);
        assert_eq!(request.observed_ssid.as_deref(), Some("Lab-5"));
        assert_eq!(request.coordinates.map(|c| c.latitude), Some(-25.7));
    }

    #[test]
    fn ttl_outside_range_is_rejected() {
        let req = IssueQrReq {
            session_id: 1,
            ttl_seconds: 0,
        };
        assert!(req.validate().is_err());
        let req = IssueQrReq {
            session_id: 1,
            ttl_seconds: 86_401,
        };
        assert!(req.validate().is_err());
    }
}
