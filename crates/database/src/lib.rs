//! showsync local store
//!
//! SQLite persistence for the synced collections, built on sqlx. Tables carry
//! a `pending_action` column so that the sync engine can find queued uploads
//! and deletions with a plain query.

pub mod connection;
pub mod migrations;
pub mod queries;
pub mod transaction;

pub use connection::{connect, connect_in_memory, DatabaseConfig, DbPool};
pub use migrations::{current_version, run_migrations, verify_integrity};
pub use transaction::TransactionRunner;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{episode_watches, followed_shows, last_requests};
    use showsync_core::{
        AppError, EpisodeWatchEntry, FollowedShowEntry, PendingAction, SyncGroup, Timestamp,
    };

    #[tokio::test]
    async fn test_database_migrations() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;
        run_migrations(&pool).await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&pool)
            .await
            .map_err(|e| AppError::database("Failed to count migrations", e))?;

        assert_eq!(count, current_version());
        Ok(())
    }

    #[tokio::test]
    async fn test_full_database_workflow() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;
        run_migrations(&pool).await?;
        let runner = TransactionRunner::new(pool.clone());

        let show = FollowedShowEntry::new(42, "Show A", Timestamp::from_millis(1));
        let watch = EpisodeWatchEntry {
            pending_action: PendingAction::Upload,
            ..EpisodeWatchEntry::new(42, 4201, Timestamp::from_millis(2))
        };
        let group = SyncGroup::episode_watches(42);

        let mut tx = runner.begin().await?;
        let show_id = followed_shows::insert_entry(&mut *tx, &show).await?;
        episode_watches::insert_watch(&mut *tx, &watch).await?;
        last_requests::upsert_last_request(
            &mut *tx,
            group.name,
            group.entity_id,
            Timestamp::from_millis(3),
        )
        .await?;
        TransactionRunner::commit(tx).await?;

        let stored = followed_shows::entry_with_id(&pool, show_id).await?;
        assert_eq!(stored.map(|s| s.title), Some("Show A".to_string()));

        let uploads =
            episode_watches::watches_with_pending_action(&pool, 42, PendingAction::Upload).await?;
        assert_eq!(uploads.len(), 1);

        let last = last_requests::last_request(&pool, group.name, group.entity_id).await?;
        assert_eq!(last, Some(Timestamp::from_millis(3)));

        verify_integrity(&pool).await?;
        Ok(())
    }
}
