//! Episode watch records

use super::{LocalId, PendingAction, SyncedEntity, Timestamp};
use serde::{Deserialize, Serialize};

/// One viewing of an episode
///
/// The remote key is the history entry id assigned by the remote service, so
/// a watch recorded offline has none until it is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeWatchEntry {
    pub local_id: Option<LocalId>,
    pub remote_id: Option<i64>,
    pub show_id: i64,
    pub episode_id: i64,
    pub watched_at: Timestamp,
    pub pending_action: PendingAction,
}

impl EpisodeWatchEntry {
    /// Creates a draft watch that has not been stored or pushed yet
    pub fn new(show_id: i64, episode_id: i64, watched_at: Timestamp) -> Self {
        Self {
            local_id: None,
            remote_id: None,
            show_id,
            episode_id,
            watched_at,
            pending_action: PendingAction::Nothing,
        }
    }
}

impl SyncedEntity for EpisodeWatchEntry {
    type Key = i64;

    fn local_id(&self) -> Option<LocalId> {
        self.local_id
    }

    fn remote_key(&self) -> Option<i64> {
        self.remote_id
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

    fn with_remote_key(self, key: Option<i64>) -> Self {
        Self {
            remote_id: key,
            ..self
        }
    }

    fn with_pending_action(self, action: PendingAction) -> Self {
        Self {
            pending_action: action,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_watch_has_no_remote_key() {
        let watch = EpisodeWatchEntry::new(1, 10, Timestamp::from_millis(100));
        assert_eq!(watch.remote_key(), None);
        assert_eq!(watch.local_id(), None);
    }

    #[test]
    fn test_attach_remote_key() {
        let watch = EpisodeWatchEntry::new(1, 10, Timestamp::from_millis(100))
            .with_remote_key(Some(555));
        assert_eq!(watch.remote_id, Some(555));
    }
}
