// crates/sync-engine/src/lib.rs
//! Offline-first synchronization engine
//!
//! Each synced collection (a *sync group*) keeps a local replica that the
//! user may change while offline. Local changes are tagged with a pending
//! action and pushed on the next sync, after which the remote snapshot is
//! pulled and reconciled against the local records:
//! - [`EntitySyncer`] plans and applies the diff/merge
//! - the [`pending`] transitions move records between pending states
//! - [`SyncOrchestrator`] sequences push, pull and staleness bookkeeping
//! - [`FollowedShowsRepository`] and [`EpisodeWatchesRepository`] wire it
//!   up for the two concrete groups
//!
//! # Example
//!
//! ```rust,no_run
//! use showsync_sync_engine::{FollowedShowsRepository, FOLLOWED_SHOWS_EXPIRY};
//! # use showsync_sync_engine::{AssignedKey, FollowedShowItem, RemoteDataSource};
//! # use showsync_core::FollowedShowEntry;
//! # struct Remote;
//! # #[async_trait::async_trait]
//! # impl RemoteDataSource for Remote {
//! #     type Endpoint = i64;
//! #     type Item = FollowedShowItem;
//! #     type Entity = FollowedShowEntry;
//! #     async fn resolve_endpoint(&self) -> showsync_core::Result<i64> { Ok(1) }
//! #     async fn fetch_snapshot(&self, _: &i64) -> showsync_core::Result<Vec<FollowedShowItem>> { Ok(vec![]) }
//! #     async fn push_additions(&self, _: &i64, _: &[FollowedShowEntry]) -> showsync_core::Result<Vec<AssignedKey<i64>>> { Ok(vec![]) }
//! #     async fn push_removals(&self, _: &i64, _: &[FollowedShowEntry]) -> showsync_core::Result<()> { Ok(()) }
//! # }
//! # async fn run(pool: showsync_database::DbPool) -> showsync_sync_engine::Result<()> {
//! let shows = FollowedShowsRepository::new(pool, Remote);
//!
//! shows.mark_added(1390, "Show A").await?;
//! if shows.needs_sync(FOLLOWED_SHOWS_EXPIRY).await? {
//!     let result = shows.sync().await?;
//!     println!("{}", result);
//! }
//! # Ok(())
//! # }
//! ```

mod episode_watches;
mod error;
mod followed_shows;
mod last_request;
mod orchestrator;
pub mod pending;
mod remote;
mod result;
mod store;
mod syncer;

pub use episode_watches::{
    episode_watches_syncer, EpisodeWatchItem, EpisodeWatchesRepository, EPISODE_WATCHES_EXPIRY,
};
pub use error::{PushStage, Result, SyncError};
pub use followed_shows::{
    followed_shows_syncer, FollowedShowItem, FollowedShowsRepository, FOLLOWED_SHOWS_EXPIRY,
};
pub use last_request::LastRequestStore;
pub use orchestrator::SyncOrchestrator;
pub use pending::Transition;
pub use remote::{AssignedKey, RemoteDataSource};
pub use result::SyncResult;
pub use store::{LocalStore, SqliteEpisodeWatchStore, SqliteFollowedShowsStore};
pub use syncer::{EntitySyncer, SyncPlan};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let _: SyncResult = SyncResult::empty();
        let _: EntitySyncer<_, FollowedShowItem> = followed_shows_syncer();
        let _: EntitySyncer<_, EpisodeWatchItem> = episode_watches_syncer(1);
        assert!(FOLLOWED_SHOWS_EXPIRY < EPISODE_WATCHES_EXPIRY);
    }
}
