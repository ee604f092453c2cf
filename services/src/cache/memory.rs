use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::{EphemeralStore, ttl_to_chrono};
use crate::clock::Clock;
use crate::error::AttendanceResult;

/// Process-local ephemeral store. Only correct for a single instance.
///
/// Lapsed entries are dropped on every write, so keys nobody reads again do
/// not outlive their TTL by more than one write.
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, DateTime<Utc>)>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

#[async_trait]
impl EphemeralStore for MemoryCache {
    async fn set_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> AttendanceResult<()> {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(ttl_to_chrono(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut entries = self.entries.lock().await;
        entries.retain(|_, (_, exp)| now < *exp);
        entries.insert(key.to_owned(), (value, expires_at));
        Ok(())
    }

    async fn get(&self, key: &str) -> AttendanceResult<Option<String>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((value, expires_at)) if now < *expires_at => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn get_and_delete_if_present(&self, key: &str) -> AttendanceResult<Option<String>> {
        let now = self.clock.now();
        let removed = self.entries.lock().await.remove(key);
        Ok(removed
            .filter(|(_, expires_at)| now < *expires_at)
            .map(|(value, _)| value))
    }

    async fn delete(&self, key: &str) -> AttendanceResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
