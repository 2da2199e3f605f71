// crates/sync-engine/src/store.rs
//! Local store seam and its SQLite implementations

use crate::syncer::SyncPlan;
use async_trait::async_trait;
use showsync_core::{
    EpisodeWatchEntry, FollowedShowEntry, LocalId, PendingAction, Result, SyncGroup,
    SyncedEntity,
};
use showsync_database::queries::{episode_watches, followed_shows};
use showsync_database::{DbPool, TransactionRunner};

/// Persistence for one sync group
///
/// Every method is scoped to [`LocalStore::group`].
#[async_trait]
pub trait LocalStore: Send + Sync {
    type Entity: SyncedEntity;

    fn group(&self) -> SyncGroup;

    /// Records without a pending action
    async fn all_active(&self) -> Result<Vec<Self::Entity>>;

    async fn all_with_pending_action(&self, action: PendingAction) -> Result<Vec<Self::Entity>>;

    /// Inserts a draft or rewrites a stored record, returning it with its local id
    async fn upsert(&self, entity: Self::Entity) -> Result<Self::Entity>;

    async fn delete_by_ids(&self, ids: &[LocalId]) -> Result<u64>;

    async fn set_pending_action(&self, ids: &[LocalId], action: PendingAction) -> Result<u64>;

    /// Applies every write in `plan` atomically
    ///
    /// Returns the local ids of planned updates and deletes that were skipped
    /// because their row no longer carries [`SyncPlan::expected_action`].
    async fn apply_plan(&self, plan: &SyncPlan<Self::Entity>) -> Result<Vec<LocalId>>;
}

/// Followed shows table
#[derive(Debug, Clone)]
pub struct SqliteFollowedShowsStore {
    pool: DbPool,
    transactions: TransactionRunner,
}

impl SqliteFollowedShowsStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            transactions: TransactionRunner::new(pool.clone()),
            pool,
        }
    }

    /// Entry for a catalog show in any pending state
    pub async fn entry_with_show_id(&self, show_id: i64) -> Result<Option<FollowedShowEntry>> {
        followed_shows::entry_with_show_id(&self.pool, show_id).await
    }
}

#[async_trait]
impl LocalStore for SqliteFollowedShowsStore {
    type Entity = FollowedShowEntry;

    fn group(&self) -> SyncGroup {
        SyncGroup::followed_shows()
    }

    async fn all_active(&self) -> Result<Vec<FollowedShowEntry>> {
        followed_shows::entries_with_pending_action(&self.pool, PendingAction::Nothing).await
    }

    async fn all_with_pending_action(
        &self,
        action: PendingAction,
    ) -> Result<Vec<FollowedShowEntry>> {
        followed_shows::entries_with_pending_action(&self.pool, action).await
    }

    async fn upsert(&self, entity: FollowedShowEntry) -> Result<FollowedShowEntry> {
        if entity.local_id().is_some() {
            followed_shows::update_entry(&self.pool, &entity).await?;
            return Ok(entity);
        }
        let id = followed_shows::insert_entry(&self.pool, &entity).await?;
        Ok(entity.with_local_id(Some(id)))
    }

    async fn delete_by_ids(&self, ids: &[LocalId]) -> Result<u64> {
        followed_shows::delete_with_ids(&self.pool, ids).await
    }

    async fn set_pending_action(&self, ids: &[LocalId], action: PendingAction) -> Result<u64> {
        followed_shows::update_pending_action(&self.pool, ids, action).await
    }

    async fn apply_plan(&self, plan: &SyncPlan<FollowedShowEntry>) -> Result<Vec<LocalId>> {
        let mut tx = self.transactions.begin().await?;
        let mut skipped: Vec<LocalId> = Vec::new();

        match plan.expected_action {
            None => {
                followed_shows::delete_with_ids(&mut *tx, &plan.deletes).await?;
                for entry in &plan.updates {
                    followed_shows::update_entry(&mut *tx, entry).await?;
                }
                for entry in &plan.inserts {
                    followed_shows::insert_entry(&mut *tx, entry).await?;
                }
            }
            Some(expected) => {
                let deleted =
                    followed_shows::delete_with_ids_if_pending(&mut *tx, &plan.deletes, expected)
                        .await?;
                skipped.extend(plan.deletes.iter().filter(|id| !deleted.contains(id)));
                for entry in &plan.updates {
                    if !followed_shows::update_entry_if_pending(&mut *tx, entry, expected).await? {
                        skipped.extend(entry.local_id);
                    }
                }
                for entry in &plan.inserts {
                    if followed_shows::insert_entry_if_pending(&mut *tx, entry, expected)
                        .await?
                        .is_none()
                    {
                        log::debug!("Kept local state of followed show {}", entry.show_id);
                    }
                }
            }
        }

        TransactionRunner::commit(tx).await?;
        Ok(skipped)
    }
}

/// Episode watches of a single show
#[derive(Debug, Clone)]
pub struct SqliteEpisodeWatchStore {
    pool: DbPool,
    transactions: TransactionRunner,
    show_id: i64,
}

impl SqliteEpisodeWatchStore {
    pub fn new(pool: DbPool, show_id: i64) -> Self {
        Self {
            transactions: TransactionRunner::new(pool.clone()),
            pool,
            show_id,
        }
    }

    pub fn show_id(&self) -> i64 {
        self.show_id
    }

    /// Watch by local id, if it belongs to this show
    pub async fn watch_with_id(&self, id: LocalId) -> Result<Option<EpisodeWatchEntry>> {
        let watch = episode_watches::watch_with_id(&self.pool, id).await?;
        Ok(watch.filter(|w| w.show_id == self.show_id))
    }

    /// Watches of one episode of this show in any pending state
    pub async fn watches_for_episode(&self, episode_id: i64) -> Result<Vec<EpisodeWatchEntry>> {
        let watches = episode_watches::watches_for_episode(&self.pool, episode_id).await?;
        Ok(watches
            .into_iter()
            .filter(|w| w.show_id == self.show_id)
            .collect())
    }
}

#[async_trait]
impl LocalStore for SqliteEpisodeWatchStore {
    type Entity = EpisodeWatchEntry;

    fn group(&self) -> SyncGroup {
        SyncGroup::episode_watches(self.show_id)
    }

    async fn all_active(&self) -> Result<Vec<EpisodeWatchEntry>> {
        episode_watches::watches_with_pending_action(&self.pool, self.show_id, PendingAction::Nothing)
            .await
    }

    async fn all_with_pending_action(
        &self,
        action: PendingAction,
    ) -> Result<Vec<EpisodeWatchEntry>> {
        episode_watches::watches_with_pending_action(&self.pool, self.show_id, action).await
    }

    async fn upsert(&self, entity: EpisodeWatchEntry) -> Result<EpisodeWatchEntry> {
        if entity.local_id().is_some() {
            episode_watches::update_watch(&self.pool, &entity).await?;
            return Ok(entity);
        }
        let id = episode_watches::insert_watch(&self.pool, &entity).await?;
        Ok(entity.with_local_id(Some(id)))
    }

    async fn delete_by_ids(&self, ids: &[LocalId]) -> Result<u64> {
        episode_watches::delete_with_ids(&self.pool, ids).await
    }

    async fn set_pending_action(&self, ids: &[LocalId], action: PendingAction) -> Result<u64> {
        episode_watches::update_pending_action(&self.pool, ids, action).await
    }

    async fn apply_plan(&self, plan: &SyncPlan<EpisodeWatchEntry>) -> Result<Vec<LocalId>> {
        let mut tx = self.transactions.begin().await?;
        let mut skipped: Vec<LocalId> = Vec::new();

        match plan.expected_action {
            None => {
                episode_watches::delete_with_ids(&mut *tx, &plan.deletes).await?;
                for watch in &plan.updates {
                    episode_watches::update_watch(&mut *tx, watch).await?;
                }
                for watch in &plan.inserts {
                    episode_watches::insert_watch(&mut *tx, watch).await?;
                }
            }
            Some(expected) => {
                let deleted =
                    episode_watches::delete_with_ids_if_pending(&mut *tx, &plan.deletes, expected)
                        .await?;
                skipped.extend(plan.deletes.iter().filter(|id| !deleted.contains(id)));
                for watch in &plan.updates {
                    if !episode_watches::update_watch_if_pending(&mut *tx, watch, expected).await? {
                        skipped.extend(watch.local_id);
                    }
                }
                for watch in &plan.inserts {
                    if episode_watches::insert_watch_if_pending(&mut *tx, watch, expected)
                        .await?
                        .is_none()
                    {
                        log::debug!("Kept local state of watch {:?}", watch.remote_id);
                    }
                }
            }
        }

        TransactionRunner::commit(tx).await?;
        Ok(skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use showsync_core::Timestamp;
    use showsync_database::{connect_in_memory, run_migrations};

    async fn setup() -> DbPool {
        let pool = connect_in_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_upsert_assigns_then_keeps_local_id() {
        let store = SqliteFollowedShowsStore::new(setup().await);

        let inserted = store
            .upsert(FollowedShowEntry::new(5, "Show", Timestamp::from_millis(1)))
            .await
            .unwrap();
        let id = inserted.local_id.unwrap();

        let updated = store
            .upsert(inserted.with_pending_action(PendingAction::Delete))
            .await
            .unwrap();

        assert_eq!(updated.local_id, Some(id));
        assert_eq!(
            store.all_with_pending_action(PendingAction::Delete).await.unwrap(),
            vec![updated]
        );
        assert!(store.all_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_plan_writes_all_changes() {
        let store = SqliteFollowedShowsStore::new(setup().await);
        let keep = store
            .upsert(FollowedShowEntry::new(1, "Keep", Timestamp::from_millis(1)))
            .await
            .unwrap();
        let drop = store
            .upsert(FollowedShowEntry::new(2, "Drop", Timestamp::from_millis(2)))
            .await
            .unwrap();

        let plan = SyncPlan {
            inserts: vec![FollowedShowEntry::new(3, "New", Timestamp::from_millis(3))],
            updates: vec![FollowedShowEntry {
                title: "Kept".to_string(),
                ..keep.clone()
            }],
            deletes: vec![drop.local_id.unwrap()],
            ..SyncPlan::default()
        };
        store.apply_plan(&plan).await.unwrap();

        let titles: Vec<String> = store
            .all_active()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["Kept".to_string(), "New".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_plan_leaves_store_untouched() {
        let store = SqliteFollowedShowsStore::new(setup().await);
        let existing = store
            .upsert(FollowedShowEntry::new(1, "Existing", Timestamp::from_millis(1)))
            .await
            .unwrap();

        let plan = SyncPlan {
            deletes: vec![existing.local_id.unwrap()],
            updates: vec![FollowedShowEntry::new(9, "Never stored", Timestamp::from_millis(9))
                .with_local_id(Some(LocalId::new(404)))],
            ..SyncPlan::default()
        };

        assert!(store.apply_plan(&plan).await.is_err());
        assert_eq!(store.all_active().await.unwrap(), vec![existing]);
    }

    #[tokio::test]
    async fn test_expected_action_skips_rows_changed_since_read() {
        let store = SqliteFollowedShowsStore::new(setup().await);
        let active = store
            .upsert(FollowedShowEntry::new(1, "Active", Timestamp::from_millis(1)))
            .await
            .unwrap();
        let leaving = store
            .upsert(FollowedShowEntry::new(2, "Leaving", Timestamp::from_millis(2)))
            .await
            .unwrap();

        // Reconcile plan built while both rows were active
        let mut plan = SyncPlan::expecting(PendingAction::Nothing);
        plan.updates.push(FollowedShowEntry {
            title: "Renamed".to_string(),
            ..leaving.clone()
        });
        plan.deletes.push(active.local_id.unwrap());
        plan.inserts
            .push(FollowedShowEntry::new(2, "Pulled", Timestamp::from_millis(3)));

        let id = leaving.local_id.unwrap();
        store
            .set_pending_action(&[id], PendingAction::Delete)
            .await
            .unwrap();

        let skipped = store.apply_plan(&plan).await.unwrap();

        assert_eq!(skipped, vec![id]);
        assert!(store.all_active().await.unwrap().is_empty());
        let queued = store.all_with_pending_action(PendingAction::Delete).await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].title, "Leaving");
    }

    #[tokio::test]
    async fn test_watch_store_is_scoped_to_show() {
        let pool = setup().await;
        let show_a = SqliteEpisodeWatchStore::new(pool.clone(), 1);
        let show_b = SqliteEpisodeWatchStore::new(pool, 2);

        let watch = show_a
            .upsert(EpisodeWatchEntry::new(1, 10, Timestamp::from_millis(1)))
            .await
            .unwrap();

        assert_eq!(show_a.all_active().await.unwrap().len(), 1);
        assert!(show_b.all_active().await.unwrap().is_empty());
        assert!(show_b
            .watch_with_id(watch.local_id.unwrap())
            .await
            .unwrap()
            .is_none());
        assert_eq!(show_a.watches_for_episode(10).await.unwrap(), vec![watch]);
        assert_eq!(show_b.group(), SyncGroup::episode_watches(2));
    }

    #[tokio::test]
    async fn test_set_pending_action() {
        let store = SqliteEpisodeWatchStore::new(setup().await, 1);
        let watch = store
            .upsert(
                EpisodeWatchEntry::new(1, 10, Timestamp::from_millis(1))
                    .with_pending_action(PendingAction::Upload),
            )
            .await
            .unwrap();

        let changed = store
            .set_pending_action(&[watch.local_id.unwrap()], PendingAction::Nothing)
            .await
            .unwrap();

        assert_eq!(changed, 1);
        assert_eq!(store.all_active().await.unwrap().len(), 1);
    }
}
