use chrono::Duration;
use std::time::Duration as StdDuration;

/// Thresholds and limits of the attendance engine.
///
/// Passed into every engine component at construction so tests can vary them
/// per case. `Default` carries the reference values.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Check-ins are accepted until the session's end plus this period.
    pub grace_period: Duration,
    /// Check-ins at or beyond `start + late_threshold` are recorded as late.
    pub late_threshold: Duration,
    /// Maximum descriptor distance accepted as a face match.
    pub face_match_threshold: f64,
    /// Radius of the coordinate proximity check, in meters.
    pub geofence_radius_meters: f64,
    pub adapter_timeout: StdDuration,
    pub store_timeout: StdDuration,
    pub aggregate_ttl: StdDuration,
    pub qr_max_ttl: StdDuration,
    /// Offset applied to a check-in instant before taking its calendar day.
    pub day_offset_minutes: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::minutes(15),
            late_threshold: Duration::minutes(10),
            face_match_threshold: 0.6,
            geofence_radius_meters: 100.0,
            adapter_timeout: StdDuration::from_secs(5),
            store_timeout: StdDuration::from_secs(5),
            aggregate_ttl: StdDuration::from_secs(3_600),
            qr_max_ttl: StdDuration::from_secs(3_600),
            day_offset_minutes: 0,
        }
    }
}
