//! Verifier adapters.
//!
//! The engine treats both adapters as black boxes returning a [`Verdict`]. It
//! bounds every call with a timeout and never mutates what it passes in.

mod face;
mod geofence;

pub use face::{DescriptorFaceVerifier, FixedFaceVerifier};
pub use geofence::{FixedGeofenceVerifier, SsidGeofenceVerifier, haversine_meters};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of one verification channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub matched: bool,
    /// In `0.0..=1.0`.
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl Verdict {
    pub fn matched(confidence: f64) -> Self {
        Self {
            matched: true,
            confidence: confidence.clamp(0.0, 1.0),
            distance: None,
        }
    }

    pub fn rejected(confidence: f64) -> Self {
        Self {
            matched: false,
            confidence: confidence.clamp(0.0, 1.0),
            distance: None,
        }
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<(f64, f64)> for Coordinates {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Compares a captured face descriptor against a participant's enrolled set.
///
/// Implementations must be deterministic for identical inputs.
#[async_trait]
pub trait FaceVerifier: Send + Sync {
    async fn verify(&self, sample: &[f64], enrolled: &[Vec<f64>], threshold: f64) -> Verdict;
}

/// Decides whether an observed network (and optionally a position) is the
/// session's room.
///
/// SSIDs compare exactly. When both coordinate pairs are supplied, the
/// proximity check must pass as well.
#[async_trait]
pub trait GeofenceVerifier: Send + Sync {
    async fn verify(
        &self,
        observed_ssid: &str,
        expected_ssid: &str,
        observed: Option<Coordinates>,
        expected: Option<Coordinates>,
    ) -> Verdict;
}
