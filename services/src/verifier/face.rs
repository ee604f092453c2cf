use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{FaceVerifier, Verdict};

/// Matches by the smallest Euclidean distance between the sample and any
/// enrolled descriptor.
#[derive(Debug, Default, Clone, Copy)]
pub struct DescriptorFaceVerifier;

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[async_trait]
impl FaceVerifier for DescriptorFaceVerifier {
    async fn verify(&self, sample: &[f64], enrolled: &[Vec<f64>], threshold: f64) -> Verdict {
        if sample.is_empty() {
            return Verdict::rejected(0.0);
        }

        let best = enrolled
            .iter()
            .filter(|d| d.len() == sample.len())
            .map(|d| euclidean(sample, d))
            .min_by(|a, b| a.total_cmp(b));

        match best {
            Some(distance) => {
                let confidence = 1.0 - distance;
                let verdict = if distance <= threshold {
                    Verdict::matched(confidence)
                } else {
                    Verdict::rejected(confidence)
                };
                verdict.with_distance(distance)
            }
            None => Verdict::rejected(0.0),
        }
    }
}

/// Deterministic fake returning a canned verdict, optionally after a delay.
#[derive(Debug)]
pub struct FixedFaceVerifier {
    verdict: Verdict,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FixedFaceVerifier {
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

    /// Never answers within any realistic timeout.
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
impl FaceVerifier for FixedFaceVerifier {
    async fn verify(&self, _sample: &[f64], _enrolled: &[Vec<f64>], _threshold: f64) -> Verdict {
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

    #[tokio::test]
    async fn closest_descriptor_decides() {
        let enrolled = vec![vec![1.0, 1.0, 1.0], vec![0.1, 0.0, 0.0]];
        let v = DescriptorFaceVerifier
            .verify(&[0.0, 0.0, 0.0], &enrolled, 0.6)
            .await;
        assert!(v.matched);
        assert!((v.distance.unwrap() - 0.1).abs() < 1e-9);
        assert!((v.confidence - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn distance_above_threshold_is_rejected() {
        let enrolled = vec![vec![1.0, 0.0]];
        let v = DescriptorFaceVerifier.verify(&[0.0, 0.0], &enrolled, 0.6).await;
        assert!(!v.matched);
        assert_eq!(v.confidence, 0.0);
        assert_eq!(v.distance, Some(1.0));
    }

    #[tokio::test]
    async fn mismatched_dimensions_never_match() {
        let enrolled = vec![vec![0.0, 0.0, 0.0]];
        let v = DescriptorFaceVerifier.verify(&[0.0, 0.0], &enrolled, 0.6).await;
        assert!(!v.matched);
        assert_eq!(v.distance, None);

        let v = DescriptorFaceVerifier.verify(&[], &enrolled, 0.6).await;
        assert!(!v.matched);
    }

    #[tokio::test]
    async fn verification_is_deterministic_and_leaves_profile_untouched() {
        let enrolled = vec![vec![0.3, 0.4], vec![0.9, 0.9]];
        let snapshot = enrolled.clone();
        let a = DescriptorFaceVerifier.verify(&[0.0, 0.0], &enrolled, 0.6).await;
        let b = DescriptorFaceVerifier.verify(&[0.0, 0.0], &enrolled, 0.6).await;
        assert_eq!(a, b);
        assert_eq!(enrolled, snapshot);
    }
}
