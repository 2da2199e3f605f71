//! Domain types for showsync
//!
//! - `common`: timestamps
//! - `entity`: local ids, pending actions and the `SyncedEntity` contract
//! - `group`: named sync groups
//! - `followed_show`, `episode_watch`: the synced records

mod common;
mod entity;
mod episode_watch;
mod followed_show;
mod group;

pub use common::Timestamp;
pub use entity::{LocalId, PendingAction, SyncedEntity};
pub use episode_watch::EpisodeWatchEntry;
pub use followed_show::FollowedShowEntry;
pub use group::SyncGroup;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_are_exported() {
        let _: LocalId = LocalId::new(1);
        let _: PendingAction = PendingAction::default();
        let _: SyncGroup = SyncGroup::followed_shows();
        let _: FollowedShowEntry = FollowedShowEntry::new(1, "Show", Timestamp::now());
        let _: EpisodeWatchEntry = EpisodeWatchEntry::new(1, 2, Timestamp::now());
    }
}
