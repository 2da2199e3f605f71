//! Followed show records

use super::{LocalId, PendingAction, SyncedEntity, Timestamp};
use serde::{Deserialize, Serialize};

/// A show the user follows
///
/// The remote key is the show's catalog id, so a show followed offline can be
/// matched against the remote list as soon as it has been pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowedShowEntry {
    pub local_id: Option<LocalId>,
    /// Remote catalog id of the show
    pub show_id: i64,
    pub title: String,
    pub followed_at: Timestamp,
    pub pending_action: PendingAction,
}

impl FollowedShowEntry {
    /// Creates a draft entry that has not been stored yet
    pub fn new(show_id: i64, title: impl Into<String>, followed_at: Timestamp) -> Self {
        Self {
            local_id: None,
            show_id,
            title: title.into(),
            followed_at,
            pending_action: PendingAction::Nothing,
        }
    }
}

impl SyncedEntity for FollowedShowEntry {
    type Key = i64;

    fn local_id(&self) -> Option<LocalId> {
        self.local_id
    }

    fn remote_key(&self) -> Option<i64> {
        Some(self.show_id)
    }

    fn pending_action(&self) -> PendingAction {
        self.pending_action
    }

    fn with_local_id(self, id: Option<LocalId>) -> Self {
        Self {
            local_id: id,
            ..self
        }
    }

    /// The catalog id is known up front; only a concrete key replaces it.
    fn with_remote_key(self, key: Option<i64>) -> Self {
        match key {
            Some(show_id) => Self { show_id, ..self },
            None => self,
        }
    }

    fn with_pending_action(self, action: PendingAction) -> Self {
        Self {
            pending_action: action,
            ..self
        }
    }
}
