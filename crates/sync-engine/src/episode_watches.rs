// crates/sync-engine/src/episode_watches.rs
//! Watch history, one sync group per show

use crate::error::Result;
use crate::last_request::LastRequestStore;
use crate::orchestrator::SyncOrchestrator;
use crate::pending::{add_locally, remove_locally, Transition};
use crate::remote::RemoteDataSource;
use crate::result::SyncResult;
use crate::store::{LocalStore, SqliteEpisodeWatchStore};
use crate::syncer::{EntitySyncer, SyncPlan};
use serde::{Deserialize, Serialize};
use showsync_core::{EpisodeWatchEntry, LocalId, PendingAction, Timestamp};
use showsync_database::DbPool;
use std::time::Duration;

/// Default staleness window for a show's watch history
pub const EPISODE_WATCHES_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

/// One entry of a show's remote watch history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeWatchItem {
    /// History entry id assigned by the remote service
    pub remote_id: i64,
    pub episode_id: i64,
    pub watched_at: Timestamp,
}

/// Matches a show's watches on their history entry id
pub fn episode_watches_syncer(show_id: i64) -> EntitySyncer<EpisodeWatchEntry, EpisodeWatchItem> {
    EntitySyncer::new(
        |item: &EpisodeWatchItem| item.remote_id,
        move |item: &EpisodeWatchItem, current: Option<&EpisodeWatchEntry>| EpisodeWatchEntry {
            local_id: current.and_then(|c| c.local_id),
            remote_id: Some(item.remote_id),
            show_id,
            episode_id: item.episode_id,
            watched_at: item.watched_at,
            pending_action: PendingAction::Nothing,
        },
    )
}

pub struct EpisodeWatchesRepository<R>
where
    R: RemoteDataSource<Entity = EpisodeWatchEntry, Item = EpisodeWatchItem>,
{
    orchestrator: SyncOrchestrator<SqliteEpisodeWatchStore, R>,
}

impl<R> EpisodeWatchesRepository<R>
where
    R: RemoteDataSource<Entity = EpisodeWatchEntry, Item = EpisodeWatchItem>,
{
    pub fn new(pool: DbPool, show_id: i64, remote: R) -> Self {
        Self {
            orchestrator: SyncOrchestrator::new(
                SqliteEpisodeWatchStore::new(pool.clone(), show_id),
                remote,
                episode_watches_syncer(show_id),
                LastRequestStore::new(pool),
            ),
        }
    }

    pub fn show_id(&self) -> i64 {
        self.orchestrator.store().show_id()
    }

    pub fn orchestrator(&self) -> &SyncOrchestrator<SqliteEpisodeWatchStore, R> {
        &self.orchestrator
    }

    /// Records a viewing locally; it is pushed on the next sync
    ///
    /// Every call adds a new watch, so rewatching an episode is kept.
    pub async fn mark_added(
        &self,
        episode_id: i64,
        watched_at: Timestamp,
    ) -> Result<EpisodeWatchEntry> {
        let draft = EpisodeWatchEntry::new(self.show_id(), episode_id, watched_at);
        let saved = self.orchestrator.apply(add_locally(None, draft.clone())).await?;
        Ok(saved.unwrap_or(draft))
    }

    /// Removes one watch locally
    pub async fn mark_removed(&self, watch_id: LocalId) -> Result<()> {
        let existing = self.orchestrator.store().watch_with_id(watch_id).await?;
        log::debug!("Removing watch {}, current entry: {:?}", watch_id, existing);

        self.orchestrator.apply(remove_locally(existing)).await?;
        Ok(())
    }

    /// Removes every watch of an episode locally, returning how many changed
    pub async fn mark_all_removed(&self, episode_id: i64) -> Result<usize> {
        let store = self.orchestrator.store();
        let watches = store.watches_for_episode(episode_id).await?;

        let mut plan = SyncPlan::default();
        for watch in watches {
            match remove_locally(Some(watch)) {
                Transition::Upsert(queued) => plan.updates.push(queued),
                Transition::Delete(id) => plan.deletes.push(id),
                Transition::Unchanged => {}
            }
        }

        store.apply_plan(&plan).await?;
        Ok(plan.updates.len() + plan.deletes.len())
    }

    /// True if any watch of the episode is not queued for removal
    pub async fn has_been_watched(&self, episode_id: i64) -> Result<bool> {
        let watches = self
            .orchestrator
            .store()
            .watches_for_episode(episode_id)
            .await?;
        Ok(watches
            .iter()
            .any(|w| w.pending_action != PendingAction::Delete))
    }

    pub async fn sync(&self) -> Result<SyncResult> {
        self.orchestrator.sync().await
    }

    pub async fn needs_sync(&self, expiry: Duration) -> Result<bool> {
        self.orchestrator.needs_sync(expiry).await
    }

    pub async fn current_items(&self) -> Result<Vec<EpisodeWatchEntry>> {
        self.orchestrator.current_items().await
    }

    pub async fn pending_items(&self) -> Result<Vec<EpisodeWatchEntry>> {
        self.orchestrator.pending_items().await
    }

    pub async fn invalidate_endpoint(&self) {
        self.orchestrator.invalidate_endpoint().await
    }
}
