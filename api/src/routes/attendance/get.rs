use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::common::{AggregateResponse, AttendanceRecordResponse, DayQuery, error_response};
use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /api/attendance/sessions/{session_id}/aggregate?day=YYYY-MM-DD
///
/// Present/enrolled rollup for one day of a session, `day` defaulting to
/// today. Served from cache when available, otherwise recounted.
///
/// ### Responses
/// - `200 OK` → `{ "sessionId", "day", "enrolled", "present", "rate", "computedAt" }`
/// - `403 Forbidden` unless the caller owns the session or is an admin
/// - `404 Not Found`
pub async fn get_aggregate(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DayQuery>,
) -> Response {
    let engine = state.engine();
    let day = query.day.unwrap_or_else(|| engine.today());

    match engine.session_aggregate(session_id, user.actor(), day).await {
        Ok(aggregate) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                AggregateResponse::from(aggregate),
                "Attendance aggregate retrieved",
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/attendance/sessions/{session_id}/records?day=YYYY-MM-DD
///
/// Every record of the session in check-in order; all days when `day` is omitted.
pub async fn list_records(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DayQuery>,
) -> Response {
    match state
        .engine()
        .session_records(session_id, user.actor(), query.day)
        .await
    {
        Ok(records) => {
            let records: Vec<AttendanceRecordResponse> =
                records.into_iter().map(AttendanceRecordResponse::from).collect();
            (
                StatusCode::OK,
                Json(ApiResponse::success(records, "Attendance records retrieved")),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}
