use async_trait::async_trait;
use chrono::{DateTime, Utc};
use db::models::cache_entry;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, sea_query::OnConflict,
};
use std::sync::Arc;
use std::time::Duration;

use super::{EphemeralStore, ttl_to_chrono};
use crate::clock::Clock;
use crate::error::{AttendanceError, AttendanceResult};

/// Ephemeral store shared by every instance through the `cache_entries` table.
///
/// Expired rows read as absent. `get_and_delete_if_present` only reports a
/// value when its own delete removed the row, so one racing caller wins.
#[derive(Clone)]
pub struct DatabaseCache {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl DatabaseCache {
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Reclaims rows whose TTL has lapsed. Returns how many were removed.
    pub async fn purge_expired(&self) -> AttendanceResult<u64> {
        let res = cache_entry::Entity::delete_many()
            .filter(cache_entry::Column::ExpiresAt.lte(self.clock.now()))
            .exec(&self.db)
            .await
            .map_err(cache_err)?;
        Ok(res.rows_affected)
    }

    async fn live_entry(&self, key: &str) -> AttendanceResult<Option<cache_entry::Model>> {
        cache_entry::Entity::find_by_id(key.to_owned())
            .filter(cache_entry::Column::ExpiresAt.gt(self.clock.now()))
            .one(&self.db)
            .await
            .map_err(cache_err)
    }
}

fn cache_err(e: sea_orm::DbErr) -> AttendanceError {
    AttendanceError::Cache(e.to_string())
}

#[async_trait]
impl EphemeralStore for DatabaseCache {
    async fn set_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> AttendanceResult<()> {
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl_to_chrono(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let row = cache_entry::ActiveModel {
            cache_key: Set(key.to_owned()),
            value: Set(value),
            expires_at: Set(expires_at),
        };

        cache_entry::Entity::insert(row)
            .on_conflict(
                OnConflict::column(cache_entry::Column::CacheKey)
                    .update_columns([cache_entry::Column::Value, cache_entry::Column::ExpiresAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(cache_err)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> AttendanceResult<Option<String>> {
        Ok(self.live_entry(key).await?.map(|row| row.value))
    }

    async fn get_and_delete_if_present(&self, key: &str) -> AttendanceResult<Option<String>> {
        let Some(row) = self.live_entry(key).await? else {
            return Ok(None);
        };

        let res = cache_entry::Entity::delete_many()
            .filter(cache_entry::Column::CacheKey.eq(key))
            .filter(cache_entry::Column::ExpiresAt.eq(row.expires_at))
            .exec(&self.db)
            .await
            .map_err(cache_err)?;

        // Someone else deleted (or replaced) the row between our read and delete.
        if res.rows_affected == 1 {
            Ok(Some(row.value))
        } else {
            Ok(None)
        }
    }

    async fn delete(&self, key: &str) -> AttendanceResult<()> {
        cache_entry::Entity::delete_by_id(key.to_owned())
            .exec(&self.db)
            .await
            .map_err(cache_err)?;
        Ok(())
    }
}
