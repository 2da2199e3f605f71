// crates/sync-engine/src/followed_shows.rs
//! The user's followed shows

use crate::error::Result;
use crate::last_request::LastRequestStore;
use crate::orchestrator::SyncOrchestrator;
use crate::pending::{add_locally, remove_locally};
use crate::remote::RemoteDataSource;
use crate::result::SyncResult;
use crate::store::SqliteFollowedShowsStore;
use crate::syncer::EntitySyncer;
use serde::{Deserialize, Serialize};
use showsync_core::{FollowedShowEntry, PendingAction, Timestamp};
use showsync_database::DbPool;
use std::time::Duration;

/// Default staleness window for the followed list
pub const FOLLOWED_SHOWS_EXPIRY: Duration = Duration::from_secs(3 * 60 * 60);

/// One show on the remote followed list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowedShowItem {
    pub show_id: i64,
    pub title: String,
    /// When the show was put on the list
    pub listed_at: Timestamp,
}

/// Matches followed shows on their catalog id
pub fn followed_shows_syncer() -> EntitySyncer<FollowedShowEntry, FollowedShowItem> {
    EntitySyncer::new(
        |item: &FollowedShowItem| item.show_id,
        |item: &FollowedShowItem, current: Option<&FollowedShowEntry>| FollowedShowEntry {
            local_id: current.and_then(|c| c.local_id),
            show_id: item.show_id,
            title: item.title.clone(),
            followed_at: item.listed_at,
            pending_action: PendingAction::Nothing,
        },
    )
}

pub struct FollowedShowsRepository<R>
where
    R: RemoteDataSource<Entity = FollowedShowEntry, Item = FollowedShowItem>,
{
    orchestrator: SyncOrchestrator<SqliteFollowedShowsStore, R>,
}

impl<R> FollowedShowsRepository<R>
where
    R: RemoteDataSource<Entity = FollowedShowEntry, Item = FollowedShowItem>,
{
    pub fn new(pool: DbPool, remote: R) -> Self {
        Self {
            orchestrator: SyncOrchestrator::new(
                SqliteFollowedShowsStore::new(pool.clone()),
                remote,
                followed_shows_syncer(),
                LastRequestStore::new(pool),
            ),
        }
    }

    pub fn orchestrator(&self) -> &SyncOrchestrator<SqliteFollowedShowsStore, R> {
        &self.orchestrator
    }

    /// Follows a show locally; the change is pushed on the next sync
    pub async fn mark_added(&self, show_id: i64, title: &str) -> Result<()> {
        let existing = self.orchestrator.store().entry_with_show_id(show_id).await?;
        log::debug!("Following show {}, current entry: {:?}", show_id, existing);

        let draft = FollowedShowEntry::new(show_id, title, Timestamp::now());
        let saved = self.orchestrator.apply(add_locally(existing, draft)).await?;
        log::trace!("Follow of show {} saved as {:?}", show_id, saved);
        Ok(())
    }

    /// Unfollows a show locally; the change is pushed on the next sync
    pub async fn mark_removed(&self, show_id: i64) -> Result<()> {
        let existing = self.orchestrator.store().entry_with_show_id(show_id).await?;
        log::debug!("Unfollowing show {}, current entry: {:?}", show_id, existing);

        self.orchestrator.apply(remove_locally(existing)).await?;
        Ok(())
    }

    /// True if the show is followed or queued to be, and not queued for removal
    pub async fn is_followed(&self, show_id: i64) -> Result<bool> {
        let entry = self.orchestrator.store().entry_with_show_id(show_id).await?;
        Ok(entry.is_some_and(|e| e.pending_action != PendingAction::Delete))
    }

    pub async fn sync(&self) -> Result<SyncResult> {
        self.orchestrator.sync().await
    }

    pub async fn needs_sync(&self, expiry: Duration) -> Result<bool> {
        self.orchestrator.needs_sync(expiry).await
    }

    pub async fn current_items(&self) -> Result<Vec<FollowedShowEntry>> {
        self.orchestrator.current_items().await
    }

    pub async fn pending_items(&self) -> Result<Vec<FollowedShowEntry>> {
        self.orchestrator.pending_items().await
    }

    pub async fn invalidate_endpoint(&self) {
        self.orchestrator.invalidate_endpoint().await
    }
}
