//! Pure timing rules. Nothing here looks at verification results.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use db::models::attendance_record::AttendanceStatus;

/// `start <= now <= end + grace`
pub fn within_window(
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    grace: Duration,
    now: DateTime<Utc>,
) -> bool {
    now >= starts_at && now <= ends_at + grace
}

pub fn status_for(
    starts_at: DateTime<Utc>,
    late_threshold: Duration,
    now: DateTime<Utc>,
) -> AttendanceStatus {
    if now - starts_at >= late_threshold {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

/// The calendar day an instant belongs to, after shifting it by a fixed offset.
pub fn calendar_day(now: DateTime<Utc>, offset_minutes: i32) -> NaiveDate {
    (now + Duration::minutes(i64::from(offset_minutes))).date_naive()
}
