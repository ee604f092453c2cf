//! Ephemeral key/value store for QR tokens and aggregates.

mod database;
mod memory;

pub use database::DatabaseCache;
pub use memory::MemoryCache;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::AttendanceResult;

#[async_trait]
pub trait EphemeralStore: Send + Sync {
    /// Stores `value` under `key`, replacing any previous entry. The entry
    /// disappears on its own once `ttl` has elapsed.
    async fn set_with_ttl(&self, key: &str, value: String, ttl: Duration)
    -> AttendanceResult<()>;

    /// Live entries only; an expired entry reads as absent.
    async fn get(&self, key: &str) -> AttendanceResult<Option<String>>;

    /// Removes the entry and returns its value if it was live.
    ///
    /// Atomic: when several callers race on one key at most one of them gets
    /// `Some`.
    async fn get_and_delete_if_present(&self, key: &str) -> AttendanceResult<Option<String>>;

    async fn delete(&self, key: &str) -> AttendanceResult<()>;
}

pub(crate) fn ttl_to_chrono(ttl: Duration) -> chrono::Duration {
    chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX)
}
