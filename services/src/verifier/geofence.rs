use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{Coordinates, GeofenceVerifier, Verdict};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two points.
pub fn haversine_meters(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Exact SSID match, plus a fixed-radius proximity check when both positions are known.
#[derive(Debug, Clone, Copy)]
pub struct SsidGeofenceVerifier {
    radius_meters: f64,
}

impl SsidGeofenceVerifier {
    pub fn new(radius_meters: f64) -> Self {
        Self { radius_meters }
    }
}

#[async_trait]
impl GeofenceVerifier for SsidGeofenceVerifier {
    async fn verify(
        &self,
        observed_ssid: &str,
        expected_ssid: &str,
        observed: Option<Coordinates>,
        expected: Option<Coordinates>,
    ) -> Verdict {
        let ssid_matched = observed_ssid == expected_ssid;

        let (Some(observed), Some(expected)) = (observed, expected) else {
            return if ssid_matched {
                Verdict::matched(1.0)
            } else {
                Verdict::rejected(0.0)
            };
        };

        let distance = haversine_meters(observed, expected);
        let in_range = distance <= self.radius_meters;
        let proximity = if self.radius_meters > 0.0 {
            1.0 - distance / self.radius_meters
        } else {
            0.0
        };

        let verdict = match (ssid_matched, in_range) {
            (true, true) => Verdict::matched(proximity),
            (true, false) => Verdict::rejected(proximity),
            (false, _) => Verdict::rejected(0.0),
        };
        verdict.with_distance(distance)
    }
}

/// Deterministic fake returning a canned verdict, optionally after a delay.
#[derive(Debug)]
pub struct FixedGeofenceVerifier {
    verdict: Verdict,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FixedGeofenceVerifier {
    pub fn new(verdict: Verdict) -> Self {
        Self {
            verdict,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn matching(confidence: f64) -> Self {
        Self::new(Verdict::matched(confidence))
    }

    pub fn rejecting(confidence: f64) -> Self {
        Self::new(Verdict::rejected(confidence))
    }

    pub fn hanging() -> Self {
        Self {
            delay: Some(Duration::from_secs(3_600)),
            ..Self::matching(1.0)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeofenceVerifier for FixedGeofenceVerifier {
    async fn verify(
        &self,
        _observed_ssid: &str,
        _expected_ssid: &str,
        _observed: Option<Coordinates>,
        _expected: Option<Coordinates>,
    ) -> Verdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOM: Coordinates = Coordinates {
        latitude: -25.7545,
        longitude: 28.2314,
    };

    #[test]
    fn haversine_is_zero_for_same_point_and_symmetric() {
        assert!(haversine_meters(ROOM, ROOM).abs() < 1e-6);
        let other = Coordinates {
            latitude: -25.7550,
            longitude: 28.2320,
        };
        let d1 = haversine_meters(ROOM, other);
        let d2 = haversine_meters(other, ROOM);
        assert!((d1 - d2).abs() < 1e-9);
        assert!(d1 > 50.0 && d1 < 100.0, "distance was {d1}");
    }

    #[tokio::test]
    async fn ssid_only_match() {
        let v = SsidGeofenceVerifier::new(100.0)
            .verify("Campus-WiFi", "Campus-WiFi", None, Some(ROOM))
            .await;
        assert!(v.matched);
        assert_eq!(v.confidence, 1.0);
        assert_eq!(v.distance, None);
    }

    #[tokio::test]
    async fn ssid_compare_is_exact() {
        let v = SsidGeofenceVerifier::new(100.0)
            .verify("campus-wifi", "Campus-WiFi", None, None)
            .await;
        assert!(!v.matched);
    }

    #[tokio::test]
    async fn both_checks_must_agree_when_coordinates_present() {
        let verifier = SsidGeofenceVerifier::new(100.0);
        let far = Coordinates {
            latitude: -25.7600,
            longitude: 28.2314,
        };

        let near = verifier.verify("Lab", "Lab", Some(ROOM), Some(ROOM)).await;
        assert!(near.matched);

        let too_far = verifier.verify("Lab", "Lab", Some(far), Some(ROOM)).await;
        assert!(!too_far.matched);
        assert!(too_far.distance.unwrap() > 100.0);

        let wrong_network = verifier.verify("Other", "Lab", Some(ROOM), Some(ROOM)).await;
        assert!(!wrong_network.matched);
    }
}
