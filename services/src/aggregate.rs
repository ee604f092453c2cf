//! Per-(session, day) attendance rollups kept in the ephemeral store.
//!
//! The cached value is a read optimization only. Readers that miss fall back
//! to a live recount against the durable store.

use chrono::{DateTime, NaiveDate, Utc};
use db::models::session::Model as Session;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::EphemeralStore;
use crate::clock::Clock;
use crate::error::{AttendanceError, AttendanceResult, bounded};
use crate::store::AttendanceStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAggregate {
    pub session_id: i64,
    pub day: NaiveDate,
    pub enrolled: u64,
    /// PRESENT and LATE records together.
    pub present: u64,
    pub rate: f64,
    pub computed_at: DateTime<Utc>,
}

impl SessionAggregate {
    pub fn rate_of(present: u64, enrolled: u64) -> f64 {
        if enrolled == 0 {
            0.0
        } else {
            present as f64 / enrolled as f64
        }
    }
}

fn cache_key(session_id: i64, day: NaiveDate) -> String {
    format!("aggregate:{session_id}:{}", day.format("%Y-%m-%d"))
}

#[derive(Clone)]
pub struct AggregateCache {
    store: Arc<dyn AttendanceStore>,
    cache: Arc<dyn EphemeralStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    /// Bound on each store or cache call.
    store_timeout: Duration,
}

impl AggregateCache {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        cache: Arc<dyn EphemeralStore>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            ttl,
            store_timeout,
        }
    }

    /// Recounts enrollment and attendance for the session on `day` and
    /// overwrites the cached rollup.
    pub async fn recompute(
        &self,
        session_id: i64,
        day: NaiveDate,
    ) -> AttendanceResult<SessionAggregate> {
        let session = bounded(self.store_timeout, self.store.find_session(session_id))
            .await?
            .ok_or(AttendanceError::SessionInactive)?;
        self.recompute_for(&session, day).await
    }

    pub(crate) async fn recompute_for(
        &self,
        session: &Session,
        day: NaiveDate,
    ) -> AttendanceResult<SessionAggregate> {
        let aggregate = self.count(session, day).await?;
        let payload = serde_json::to_string(&aggregate)?;
        self.store_payload(session.id, day, payload).await?;

        debug!(
            session_id = session.id,
            %day,
            enrolled = aggregate.enrolled,
            present = aggregate.present,
            "Aggregate recomputed"
        );
        Ok(aggregate)
    }

    /// Cached rollup if there is one, otherwise a live recount.
    pub async fn get(
        &self,
        session: &Session,
        day: NaiveDate,
    ) -> AttendanceResult<SessionAggregate> {
        let key = cache_key(session.id, day);
        match bounded(self.store_timeout, self.cache.get(&key)).await {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(aggregate) => return Ok(aggregate),
                Err(e) => {
                    warn!(session_id = session.id, error = %e, "Discarding unreadable aggregate")
                }
            },
            Ok(None) => {}
            Err(e) => warn!(session_id = session.id, error = %e, "Aggregate cache unavailable"),
        }

        let aggregate = self.count(session, day).await?;
        match serde_json::to_string(&aggregate) {
            Ok(payload) => {
                if let Err(e) = self.store_payload(session.id, day, payload).await {
                    warn!(session_id = session.id, error = %e, "Failed to cache aggregate");
                }
            }
            Err(e) => warn!(session_id = session.id, error = %e, "Failed to encode aggregate"),
        }
        Ok(aggregate)
    }

    async fn store_payload(
        &self,
        session_id: i64,
        day: NaiveDate,
        payload: String,
    ) -> AttendanceResult<()> {
        let key = cache_key(session_id, day);
        bounded(
            self.store_timeout,
            self.cache.set_with_ttl(&key, payload, self.ttl),
        )
        .await
    }

    async fn count(&self, session: &Session, day: NaiveDate) -> AttendanceResult<SessionAggregate> {
        let enrolled = bounded(self.store_timeout, self.store.count_enrolled(session.course_id))
            .await?;
        let present = bounded(self.store_timeout, self.store.count_attendance(session.id, day))
            .await?;
        Ok(SessionAggregate {
            session_id: session.id,
            day,
            enrolled,
            present,
            rate: SessionAggregate::rate_of(present, enrolled),
            computed_at: self.clock.now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_zero_without_enrollment() {
        assert_eq!(SessionAggregate::rate_of(0, 0), 0.0);
        assert_eq!(SessionAggregate::rate_of(3, 4), 0.75);
    }

    #[test]
    fn key_carries_session_and_day() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        assert_eq!(cache_key(12, day), "aggregate:12:2025-03-03");
    }
}
