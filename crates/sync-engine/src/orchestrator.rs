// crates/sync-engine/src/orchestrator.rs
//! Per-group sync sequencing
//!
//! A run resolves the remote endpoint, drains pending uploads, drains pending
//! deletes, pulls and reconciles, then records the attempt. Pending mutations
//! go first so that a pull can neither resurrect a record the user removed nor
//! miss one the user added.

use crate::error::{PushStage, Result, SyncError};
use crate::last_request::LastRequestStore;
use crate::pending::{confirm_delete, confirm_upload, Transition};
use crate::remote::RemoteDataSource;
use crate::result::SyncResult;
use crate::store::LocalStore;
use crate::syncer::{EntitySyncer, SyncPlan};
use showsync_core::{AppError, LocalId, PendingAction, SyncGroup, SyncedEntity, Timestamp};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

fn store_error(group: SyncGroup) -> impl FnOnce(AppError) -> SyncError {
    move |source| SyncError::Store {
        group: group.to_string(),
        source,
    }
}

/// Drives sync for one group
///
/// The resolved endpoint is cached for the lifetime of the orchestrator. Its
/// lock is held for the whole of [`SyncOrchestrator::sync`], so concurrent
/// calls on one orchestrator run one after the other.
pub struct SyncOrchestrator<S, R>
where
    S: LocalStore,
    R: RemoteDataSource<Entity = S::Entity>,
{
    store: S,
    remote: R,
    syncer: EntitySyncer<S::Entity, R::Item>,
    last_requests: LastRequestStore,
    endpoint: Mutex<Option<R::Endpoint>>,
}

impl<S, R> SyncOrchestrator<S, R>
where
    S: LocalStore,
    R: RemoteDataSource<Entity = S::Entity>,
{
    pub fn new(
        store: S,
        remote: R,
        syncer: EntitySyncer<S::Entity, R::Item>,
        last_requests: LastRequestStore,
    ) -> Self {
        Self {
            store,
            remote,
            syncer,
            last_requests,
            endpoint: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn group(&self) -> SyncGroup {
        self.store.group()
    }

    /// Runs one full sync of the group
    ///
    /// If the endpoint cannot be resolved the run continues offline: pending
    /// uploads become active, pending deletes are dropped and no pull happens.
    /// Push and pull failures abort the run; steps already committed stay
    /// committed. Records the user changes while a run is in flight keep
    /// their local state.
    pub async fn sync(&self) -> Result<SyncResult> {
        let group = self.store.group();
        let mut cached = self.endpoint.lock().await;
        log::debug!("Starting sync of {}", group);

        let endpoint = match cached.as_ref() {
            Some(endpoint) => Some(endpoint.clone()),
            None => match self.resolve_endpoint(group).await {
                Ok(endpoint) => {
                    log::debug!("Resolved endpoint {:?} for {}", endpoint, group);
                    *cached = Some(endpoint.clone());
                    Some(endpoint)
                }
                Err(err) => {
                    log::warn!("{}; syncing offline", err);
                    None
                }
            },
        };

        let uploaded = self.push_uploads(group, endpoint.as_ref()).await?;
        let purged = self.push_deletes(group, endpoint.as_ref()).await?;

        let mut result = match endpoint.as_ref() {
            Some(endpoint) => self.pull(group, endpoint).await?,
            None => SyncResult::empty(),
        };
        result.uploaded = uploaded;
        result.purged = purged;
        result.degraded = endpoint.is_none();

        self.last_requests
            .record_success(group)
            .await
            .map_err(store_error(group))?;

        log::info!("Synced {}: {}", group, result);
        Ok(result)
    }

    async fn resolve_endpoint(&self, group: SyncGroup) -> Result<R::Endpoint> {
        self.remote
            .resolve_endpoint()
            .await
            .map_err(|source| SyncError::EndpointUnavailable {
                group: group.to_string(),
                source,
            })
    }

    async fn push_uploads(
        &self,
        group: SyncGroup,
        endpoint: Option<&R::Endpoint>,
    ) -> Result<usize> {
        let pending = self
            .store
            .all_with_pending_action(PendingAction::Upload)
            .await
            .map_err(store_error(group))?;

        if pending.is_empty() {
            return Ok(0);
        }

        let mut assigned: HashMap<LocalId, <S::Entity as SyncedEntity>::Key> = HashMap::new();
        match endpoint {
            Some(endpoint) => {
                log::debug!("Pushing {} additions for {}", pending.len(), group);
                let keys = self
                    .remote
                    .push_additions(endpoint, &pending)
                    .await
                    .map_err(|source| SyncError::Push {
                        group: group.to_string(),
                        stage: PushStage::Additions,
                        source,
                    })?;
                assigned.extend(keys.into_iter().map(|k| (k.local_id, k.remote_key)));
            }
            None => log::warn!(
                "Confirming {} additions for {} without the remote service",
                pending.len(),
                group
            ),
        }

        let mut plan = SyncPlan::expecting(PendingAction::Upload);
        for entity in pending {
            let key = entity.local_id().and_then(|id| assigned.remove(&id));
            if let Transition::Upsert(confirmed) = confirm_upload(entity, key) {
                plan.updates.push(confirmed);
            }
        }

        let skipped = self
            .store
            .apply_plan(&plan)
            .await
            .map_err(store_error(group))?;

        if endpoint.is_some() && !skipped.is_empty() {
            self.requeue_removals(group, &plan.updates, &skipped).await?;
        }
        Ok(plan.updates.len() - skipped.len())
    }

    /// Queues the removal of records the user dropped while they were being pushed
    ///
    /// The remote service already holds them, so each comes back as a pending
    /// delete for the removal push that follows. A record the user has since
    /// re-added keeps its local state.
    async fn requeue_removals(
        &self,
        group: SyncGroup,
        pushed: &[S::Entity],
        skipped: &[LocalId],
    ) -> Result<()> {
        let mut plan = SyncPlan::expecting(PendingAction::Delete);
        plan.inserts = pushed
            .iter()
            .filter(|entity| entity.local_id().is_some_and(|id| skipped.contains(&id)))
            .filter(|entity| entity.remote_key().is_some())
            .map(|entity| {
                entity
                    .clone()
                    .with_local_id(None)
                    .with_pending_action(PendingAction::Delete)
            })
            .collect();

        if plan.inserts.is_empty() {
            return Ok(());
        }

        log::info!(
            "{} records of {} changed while being pushed; queueing their removal",
            plan.inserts.len(),
            group
        );
        self.store
            .apply_plan(&plan)
            .await
            .map_err(store_error(group))?;
        Ok(())
    }

    async fn push_deletes(
        &self,
        group: SyncGroup,
        endpoint: Option<&R::Endpoint>,
    ) -> Result<usize> {
        let pending = self
            .store
            .all_with_pending_action(PendingAction::Delete)
            .await
            .map_err(store_error(group))?;

        if pending.is_empty() {
            return Ok(0);
        }

        // Records the remote service never saw can only be dropped locally
        let (keyed, local_only): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|entity| entity.remote_key().is_some());

        match endpoint {
            Some(endpoint) if !keyed.is_empty() => {
                log::debug!("Pushing {} removals for {}", keyed.len(), group);
                self.remote
                    .push_removals(endpoint, &keyed)
                    .await
                    .map_err(|source| SyncError::Push {
                        group: group.to_string(),
                        stage: PushStage::Removals,
                        source,
                    })?;
            }
            Some(_) => {}
            None => log::warn!(
                "Dropping {} removals for {} without the remote service",
                keyed.len() + local_only.len(),
                group
            ),
        }

        let mut plan = SyncPlan::expecting(PendingAction::Delete);
        for entity in keyed.iter().chain(local_only.iter()) {
            if let Transition::Delete(id) = confirm_delete(entity) {
                plan.deletes.push(id);
            }
        }

        // A record re-added meanwhile stays queued for upload
        let skipped = self
            .store
            .apply_plan(&plan)
            .await
            .map_err(store_error(group))?;
        Ok(plan.deletes.len() - skipped.len())
    }

    async fn pull(&self, group: SyncGroup, endpoint: &R::Endpoint) -> Result<SyncResult> {
        let snapshot = self
            .remote
            .fetch_snapshot(endpoint)
            .await
            .map_err(|source| SyncError::Pull {
                group: group.to_string(),
                source,
            })?;
        log::debug!("Fetched {} remote items for {}", snapshot.len(), group);

        let local = self
            .store
            .all_active()
            .await
            .map_err(store_error(group))?;

        let result = self
            .syncer
            .sync(&self.store, &local, &snapshot)
            .await
            .map_err(store_error(group))?;

        if result.duplicate_keys > 0 {
            log::warn!(
                "Remote snapshot for {} repeats {} keys",
                group,
                result.duplicate_keys
            );
        }

        Ok(result)
    }

    /// Writes a local state transition
    pub async fn apply(&self, transition: Transition<S::Entity>) -> Result<Option<S::Entity>> {
        Ok(transition.apply(&self.store).await?)
    }

    /// Whether the last sync attempt is older than `expiry`
    pub async fn needs_sync(&self, expiry: Duration) -> Result<bool> {
        Ok(self.last_requests.is_stale(self.group(), expiry).await?)
    }

    /// When the group last finished a sync attempt
    pub async fn last_synced(&self) -> Result<Option<Timestamp>> {
        Ok(self.last_requests.last_request(self.group()).await?)
    }

    /// Active records, for display
    pub async fn current_items(&self) -> Result<Vec<S::Entity>> {
        Ok(self.store.all_active().await?)
    }

    /// Records still waiting for upload or deletion
    pub async fn pending_items(&self) -> Result<Vec<S::Entity>> {
        let mut pending = self
            .store
            .all_with_pending_action(PendingAction::Upload)
            .await?;
        pending.extend(
            self.store
                .all_with_pending_action(PendingAction::Delete)
                .await?,
        );
        Ok(pending)
    }

    /// Drops the cached endpoint so the next sync resolves it again
    pub async fn invalidate_endpoint(&self) {
        self.endpoint.lock().await.take();
    }
}
