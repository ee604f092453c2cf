//! Single-use QR tokens.
//!
//! A token lives only in the ephemeral store under `qr:<token>`. Consuming it
//! is one atomic get-and-delete, so a token is handed out at most once no
//! matter how many instances race on it.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::debug;

use crate::cache::EphemeralStore;
use crate::clock::Clock;
use crate::error::{AttendanceError, AttendanceResult, bounded};

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrSession {
    pub token: String,
    pub session_id: i64,
    pub issuer_id: i64,
    pub issued_at: DateTime<Utc>,
    pub ttl_seconds: u64,
    pub expires_at: DateTime<Utc>,
}

impl QrSession {
    /// Expired at and after `issued_at + ttl_seconds`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

fn cache_key(token: &str) -> String {
    format!("qr:{token}")
}

fn generate_token() -> String {
    let mut buf = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

#[derive(Clone)]
pub struct QrSessionManager {
    cache: Arc<dyn EphemeralStore>,
    clock: Arc<dyn Clock>,
    store_timeout: StdDuration,
}

impl QrSessionManager {
    pub fn new(
        cache: Arc<dyn EphemeralStore>,
        clock: Arc<dyn Clock>,
        store_timeout: StdDuration,
    ) -> Self {
        Self {
            cache,
            clock,
            store_timeout,
        }
    }

    /// Mints a token for `session_id` and stores it with a TTL of `ttl`.
    ///
    /// Authorization and session checks are the caller's job.
    pub async fn issue(
        &self,
        session_id: i64,
        issuer_id: i64,
        ttl: StdDuration,
    ) -> AttendanceResult<QrSession> {
        if ttl.is_zero() {
            return Err(AttendanceError::InvalidRequest(
                "ttlSeconds must be positive".into(),
            ));
        }

        let issued_at = self.clock.now();
        let ttl_seconds = ttl.as_secs();
        let expires_at = Duration::from_std(StdDuration::from_secs(ttl_seconds))
            .ok()
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .ok_or_else(|| AttendanceError::InvalidRequest("ttlSeconds is too large".into()))?;

        let qr = QrSession {
            token: generate_token(),
            session_id,
            issuer_id,
            issued_at,
            ttl_seconds,
            expires_at,
        };

        let payload = serde_json::to_string(&qr)?;
        let key = cache_key(&qr.token);
        let ttl = StdDuration::from_secs(ttl_seconds);
        bounded(self.store_timeout, self.cache.set_with_ttl(&key, payload, ttl)).await?;

        debug!(session_id, issuer_id, ttl_seconds, "QR token issued");
        Ok(qr)
    }

    /// Spends the token. It is invalidated before anything else is checked and
    /// is never restored, even if the caller fails afterwards.
    pub async fn consume(&self, token: &str) -> AttendanceResult<QrSession> {
        let key = cache_key(token);
        let spent = bounded(self.store_timeout, self.cache.get_and_delete_if_present(&key)).await?;
        let Some(payload) = spent else {
            return Err(AttendanceError::TokenNotFound);
        };

        let qr: QrSession = serde_json::from_str(&payload)?;
        if qr.is_expired_at(self.clock.now()) {
            return Err(AttendanceError::TokenExpired);
        }
        Ok(qr)
    }
}
