// crates/sync-engine/src/last_request.rs
//! Staleness bookkeeping per sync group

use showsync_core::{Result, SyncGroup, Timestamp};
use showsync_database::queries::last_requests;
use showsync_database::DbPool;
use std::time::Duration;

/// Remembers when each group last finished a sync attempt
///
/// Only callers deciding whether to sync consult this; reconciliation never
/// does.
#[derive(Debug, Clone)]
pub struct LastRequestStore {
    pool: DbPool,
}

impl LastRequestStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// When `group` last completed a sync, if ever
    pub async fn last_request(&self, group: SyncGroup) -> Result<Option<Timestamp>> {
        last_requests::last_request(&self.pool, group.name, group.entity_id).await
    }

    /// True if `group` never synced or its last sync is older than `expiry`
    pub async fn is_stale(&self, group: SyncGroup, expiry: Duration) -> Result<bool> {
        self.is_stale_at(group, expiry, Timestamp::now()).await
    }

    /// [`LastRequestStore::is_stale`] evaluated at `now`
    pub async fn is_stale_at(
        &self,
        group: SyncGroup,
        expiry: Duration,
        now: Timestamp,
    ) -> Result<bool> {
        let stale = match self.last_request(group).await? {
            // A timestamp ahead of `now` means the clock moved back
            Some(last) => now.duration_since(last).is_some_and(|age| age > expiry),
            None => true,
        };
        Ok(stale)
    }

    /// Marks `group` as synced now
    pub async fn record_success(&self, group: SyncGroup) -> Result<()> {
        self.record_success_at(group, Timestamp::now()).await
    }

    pub async fn record_success_at(&self, group: SyncGroup, at: Timestamp) -> Result<()> {
        log::trace!("Recording sync of {} at {}", group, at);
        last_requests::upsert_last_request(&self.pool, group.name, group.entity_id, at).await
    }

    /// Forgets the last sync so the next staleness check reports stale
    pub async fn clear(&self, group: SyncGroup) -> Result<()> {
        last_requests::delete_last_request(&self.pool, group.name, group.entity_id).await
    }
}
