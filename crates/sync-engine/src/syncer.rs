// crates/sync-engine/src/syncer.rs
//! Reconciliation of a local collection against a remote snapshot
//!
//! Matching happens on the remote key. Planning is pure; the resulting
//! [`SyncPlan`] is handed to the store, which applies it in one transaction.

use crate::result::SyncResult;
use crate::store::LocalStore;
use showsync_core::{LocalId, PendingAction, SyncedEntity};
use std::collections::{HashMap, HashSet};

type KeyFn<E, R> = Box<dyn Fn(&R) -> <E as SyncedEntity>::Key + Send + Sync>;
type MergeFn<E, R> = Box<dyn Fn(&R, Option<&E>) -> E + Send + Sync>;

/// Local writes that bring a collection in line with a remote snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SyncPlan<E: SyncedEntity> {
    /// New records, without local ids
    pub inserts: Vec<E>,
    /// Existing records carrying their original local ids
    pub updates: Vec<E>,
    pub deletes: Vec<LocalId>,
    /// Pending action the planned rows were read with
    ///
    /// When set, updates and deletes only touch rows still carrying it and
    /// inserts only overwrite such rows. Rows the user changed in the
    /// meantime are skipped. `None` writes unconditionally.
    pub expected_action: Option<PendingAction>,
    pub unchanged: usize,
    /// Keys seen more than once in the snapshot, in first-seen order
    pub duplicate_keys: Vec<E::Key>,
}

impl<E: SyncedEntity> Default for SyncPlan<E> {
    fn default() -> Self {
        Self {
            inserts: Vec::new(),
            updates: Vec::new(),
            deletes: Vec::new(),
            expected_action: None,
            unchanged: 0,
            duplicate_keys: Vec::new(),
        }
    }
}

impl<E: SyncedEntity> SyncPlan<E> {
    /// Empty plan for rows read with the given pending action
    pub fn expecting(action: PendingAction) -> Self {
        Self {
            expected_action: Some(action),
            ..Self::default()
        }
    }

    /// True when applying the plan would not write anything
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    /// Counts for reporting
    pub fn summary(&self) -> SyncResult {
        SyncResult {
            added: self.inserts.len(),
            updated: self.updates.len(),
            removed: self.deletes.len(),
            unchanged: self.unchanged,
            duplicate_keys: self.duplicate_keys.len(),
            ..SyncResult::default()
        }
    }
}

enum Slot<'a, E> {
    Matched(&'a E, E),
    New(E),
}

/// Diff/merge strategy for one sync group
///
/// `key` extracts the remote key of a snapshot item. `merge` turns a snapshot
/// item into a local record, given the record it matched (if any). Whatever
/// the merge returns, the syncer keeps the matched record's local id and
/// clears the pending action.
pub struct EntitySyncer<E: SyncedEntity, R> {
    key: KeyFn<E, R>,
    merge: MergeFn<E, R>,
    remove_not_matched: bool,
}

impl<E, R> EntitySyncer<E, R>
where
    E: SyncedEntity,
    R: Send + Sync,
{
    pub fn new<K, M>(key: K, merge: M) -> Self
    where
        K: Fn(&R) -> E::Key + Send + Sync + 'static,
        M: Fn(&R, Option<&E>) -> E + Send + Sync + 'static,
    {
        Self {
            key: Box::new(key),
            merge: Box::new(merge),
            remove_not_matched: true,
        }
    }

    /// Whether local records missing from the snapshot are deleted
    pub fn with_remove_not_matched(mut self, remove: bool) -> Self {
        self.remove_not_matched = remove;
        self
    }

    /// Computes the writes that reconcile `local` with `remote`
    ///
    /// `local` must only hold records without a pending action. A key that
    /// repeats in `remote` merges its last occurrence into a matched record;
    /// for an unmatched key only the first occurrence is inserted.
    pub fn plan(&self, local: &[E], remote: &[R]) -> SyncPlan<E> {
        let mut by_key: HashMap<E::Key, &E> = HashMap::with_capacity(local.len());
        for entity in local {
            if let Some(key) = entity.remote_key() {
                by_key.entry(key).or_insert(entity);
            }
        }

        let mut plan = SyncPlan::expecting(PendingAction::Nothing);
        let mut slots: Vec<Slot<'_, E>> = Vec::with_capacity(remote.len());
        let mut slot_for_key: HashMap<E::Key, usize> = HashMap::with_capacity(remote.len());

        for item in remote {
            let key = (self.key)(item);

            if let Some(&index) = slot_for_key.get(&key) {
                if !plan.duplicate_keys.contains(&key) {
                    plan.duplicate_keys.push(key.clone());
                }
                if let Slot::Matched(current, merged) = &mut slots[index] {
                    *merged = (self.merge)(item, Some(*current));
                }
                continue;
            }

            let slot = match by_key.get(&key) {
                Some(current) => Slot::Matched(*current, (self.merge)(item, Some(*current))),
                None => Slot::New((self.merge)(item, None)),
            };
            slot_for_key.insert(key, slots.len());
            slots.push(slot);
        }

        let mut visited: HashSet<LocalId> = HashSet::with_capacity(slots.len());
        for slot in slots {
            match slot {
                Slot::Matched(current, merged) => {
                    let merged = merged
                        .with_local_id(current.local_id())
                        .with_pending_action(PendingAction::Nothing);
                    if let Some(id) = current.local_id() {
                        visited.insert(id);
                    }
                    if merged == *current {
                        plan.unchanged += 1;
                    } else {
                        log::trace!("Updating {:?} from remote", current.remote_key());
                        plan.updates.push(merged);
                    }
                }
                Slot::New(entity) => {
                    log::trace!("Inserting {:?} from remote", entity.remote_key());
                    plan.inserts.push(
                        entity
                            .with_local_id(None)
                            .with_pending_action(PendingAction::Nothing),
                    );
                }
            }
        }

        if self.remove_not_matched {
            plan.deletes = local
                .iter()
                .filter_map(|entity| entity.local_id())
                .filter(|id| !visited.contains(id))
                .collect();
            if !plan.deletes.is_empty() {
                log::trace!("Removing {} records missing from remote", plan.deletes.len());
            }
        }

        plan
    }

    /// Reconciles `local` with `remote` and writes the result to `store`
    ///
    /// All writes land in one transaction; an empty plan writes nothing.
    /// Records the user changed since `local` was read are left as they are
    /// and not counted.
    pub async fn sync<S>(
        &self,
        store: &S,
        local: &[E],
        remote: &[R],
    ) -> showsync_core::Result<SyncResult>
    where
        S: LocalStore<Entity = E> + ?Sized,
    {
        let plan = self.plan(local, remote);
        let mut result = plan.summary();

        if !plan.is_empty() {
            let skipped = store.apply_plan(&plan).await?;
            if !skipped.is_empty() {
                let skipped_deletes = plan
                    .deletes
                    .iter()
                    .filter(|id| skipped.contains(id))
                    .count();
                result.removed -= skipped_deletes;
                result.updated -= skipped.len() - skipped_deletes;
                log::debug!(
                    "Left {} records of {} changed locally during reconciliation",
                    skipped.len(),
                    store.group()
                );
            }
        }

        log::debug!("Reconciled {}: {}", store.group(), result);
        Ok(result)
    }
}
