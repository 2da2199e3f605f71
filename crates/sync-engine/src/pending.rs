// crates/sync-engine/src/pending.rs
//! Pending-action state machine
//!
//! | from \ event | add      | remove   | confirm_upload | confirm_delete |
//! |---------------|----------|----------|----------------|----------------|
//! | absent        | UPLOAD   | -        | -              | -              |
//! | ACTIVE        | UPLOAD   | DELETE   | -              | -              |
//! | UPLOAD        | -        | removed  | ACTIVE         | -              |
//! | DELETE        | UPLOAD   | -        | -              | removed        |
//!
//! Every transition is a pure function from the current record to a
//! [`Transition`]; nothing here touches the store.

use crate::store::LocalStore;
use showsync_core::{LocalId, PendingAction, SyncedEntity};

/// The write a state transition asks for
#[derive(Debug, Clone, PartialEq)]
pub enum Transition<E> {
    /// Insert or rewrite the record
    Upsert(E),
    /// Remove the record physically
    Delete(LocalId),
    /// Nothing to write
    Unchanged,
}

impl<E: SyncedEntity> Transition<E> {
    /// Writes the transition to `store`, returning the record if it still exists
    pub async fn apply<S>(self, store: &S) -> showsync_core::Result<Option<E>>
    where
        S: LocalStore<Entity = E> + ?Sized,
    {
        match self {
            Self::Upsert(entity) => store.upsert(entity).await.map(Some),
            Self::Delete(id) => {
                store.delete_by_ids(&[id]).await?;
                Ok(None)
            }
            Self::Unchanged => Ok(None),
        }
    }
}

/// User asked for the record to exist
///
/// A missing record is created from `draft` in UPLOAD. An ACTIVE record, or
/// one queued for deletion, is queued for upload again with its stored
/// payload.
pub fn add_locally<E: SyncedEntity>(existing: Option<E>, draft: E) -> Transition<E> {
    match existing {
        None => Transition::Upsert(
            draft
                .with_local_id(None)
                .with_pending_action(PendingAction::Upload),
        ),
        Some(entity) => match entity.pending_action() {
            PendingAction::Upload => Transition::Unchanged,
            PendingAction::Nothing | PendingAction::Delete => {
                Transition::Upsert(entity.with_pending_action(PendingAction::Upload))
            }
        },
    }
}

/// User asked for the record to go away
///
/// An ACTIVE record is queued for deletion. A record still waiting for upload
/// never reached the remote service and is dropped immediately.
pub fn remove_locally<E: SyncedEntity>(existing: Option<E>) -> Transition<E> {
    let Some(entity) = existing else {
        return Transition::Unchanged;
    };

    match (entity.pending_action(), entity.local_id()) {
        (PendingAction::Nothing, _) => {
            Transition::Upsert(entity.with_pending_action(PendingAction::Delete))
        }
        (PendingAction::Upload, Some(id)) => Transition::Delete(id),
        (PendingAction::Upload, None) | (PendingAction::Delete, _) => Transition::Unchanged,
    }
}

/// The remote service accepted an upload
///
/// `assigned` replaces the remote key when the service reported one.
pub fn confirm_upload<E: SyncedEntity>(entity: E, assigned: Option<E::Key>) -> Transition<E> {
    if entity.pending_action() != PendingAction::Upload {
        return Transition::Unchanged;
    }

    let key = assigned.or_else(|| entity.remote_key());
    Transition::Upsert(
        entity
            .with_remote_key(key)
            .with_pending_action(PendingAction::Nothing),
    )
}

/// The remote service accepted a deletion
pub fn confirm_delete<E: SyncedEntity>(entity: &E) -> Transition<E> {
    match (entity.pending_action(), entity.local_id()) {
        (PendingAction::Delete, Some(id)) => Transition::Delete(id),
        _ => Transition::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use showsync_core::{EpisodeWatchEntry, FollowedShowEntry, Timestamp};

    fn show(local_id: Option<i64>, action: PendingAction) -> FollowedShowEntry {
        FollowedShowEntry {
            local_id: local_id.map(LocalId::new),
            pending_action: action,
            ..FollowedShowEntry::new(5, "Show", Timestamp::from_millis(100))
        }
    }

    #[test]
    fn test_add_absent_creates_pending_upload() {
        let transition = add_locally(None, show(Some(99), PendingAction::Nothing));
        assert_eq!(
            transition,
            Transition::Upsert(show(None, PendingAction::Upload))
        );
    }

    #[test]
    fn test_add_existing_requeues_upload() {
        for action in [PendingAction::Nothing, PendingAction::Delete] {
            let existing = show(Some(1), action);
            let draft = FollowedShowEntry::new(5, "Renamed", Timestamp::from_millis(999));

            assert_eq!(
                add_locally(Some(existing), draft),
                Transition::Upsert(show(Some(1), PendingAction::Upload))
            );
        }
    }

    #[test]
    fn test_add_pending_upload_is_unchanged() {
        let existing = show(Some(1), PendingAction::Upload);
        assert_eq!(
            add_locally(Some(existing.clone()), existing),
            Transition::Unchanged
        );
    }

    #[test]
    fn test_remove_active_queues_delete() {
        assert_eq!(
            remove_locally(Some(show(Some(1), PendingAction::Nothing))),
            Transition::Upsert(show(Some(1), PendingAction::Delete))
        );
    }

    #[test]
    fn test_remove_pending_upload_deletes_outright() {
        assert_eq!(
            remove_locally(Some(show(Some(1), PendingAction::Upload))),
            Transition::Delete(LocalId::new(1))
        );
    }

    #[test]
    fn test_remove_is_idempotent() {
        assert_eq!(
            remove_locally::<FollowedShowEntry>(None),
            Transition::Unchanged
        );
        assert_eq!(
            remove_locally(Some(show(Some(1), PendingAction::Delete))),
            Transition::Unchanged
        );
    }

    #[test]
    fn test_confirm_upload_attaches_assigned_key() {
        let watch = EpisodeWatchEntry {
            local_id: Some(LocalId::new(3)),
            pending_action: PendingAction::Upload,
            ..EpisodeWatchEntry::new(1, 10, Timestamp::from_millis(1))
        };

        match confirm_upload(watch, Some(777)) {
            Transition::Upsert(confirmed) => {
                assert_eq!(confirmed.remote_id, Some(777));
                assert_eq!(confirmed.local_id, Some(LocalId::new(3)));
                assert_eq!(confirmed.pending_action, PendingAction::Nothing);
            }
            other => panic!("unexpected transition {:?}", other),
        }
    }

    #[test]
    fn test_confirm_upload_without_key_keeps_existing_key() {
        let watch = EpisodeWatchEntry {
            local_id: Some(LocalId::new(3)),
            remote_id: Some(50),
            pending_action: PendingAction::Upload,
            ..EpisodeWatchEntry::new(1, 10, Timestamp::from_millis(1))
        };

        match confirm_upload(watch, None) {
            Transition::Upsert(confirmed) => assert_eq!(confirmed.remote_id, Some(50)),
            other => panic!("unexpected transition {:?}", other),
        }
    }

    #[test]
    fn test_confirm_ignores_records_in_other_states() {
        assert_eq!(
            confirm_upload(show(Some(1), PendingAction::Nothing), None),
            Transition::Unchanged
        );
        assert_eq!(
            confirm_delete(&show(Some(1), PendingAction::Upload)),
            Transition::Unchanged
        );
        assert_eq!(
            confirm_delete(&show(Some(1), PendingAction::Delete)),
            Transition::Delete(LocalId::new(1))
        );
    }
}
