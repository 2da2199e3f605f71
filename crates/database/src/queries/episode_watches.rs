//! Episode watch database operations

use super::{parse_pending_action, push_id_list};
use showsync_core::{AppError, EpisodeWatchEntry, LocalId, PendingAction, Timestamp};
use sqlx::{Executor, QueryBuilder, Sqlite};

/// Gets a show's watches carrying the given pending action
pub async fn watches_with_pending_action<'e, E>(
    executor: E,
    show_id: i64,
    action: PendingAction,
) -> Result<Vec<EpisodeWatchEntry>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        r#"
        SELECT id, remote_id, show_id, episode_id, watched_at, pending_action
        FROM episode_watches
        WHERE show_id = ? AND pending_action = ?
        ORDER BY watched_at, id
        "#,
    )
    .bind(show_id)
    .bind(action.as_str())
    .fetch_all(executor)
    .await
    .map_err(|e| AppError::database("Failed to list episode watches", e))?;

    rows.into_iter().map(row_to_watch).collect()
}

/// Gets every watch recorded for a show
pub async fn watches_for_show<'e, E>(
    executor: E,
    show_id: i64,
) -> Result<Vec<EpisodeWatchEntry>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        r#"
        SELECT id, remote_id, show_id, episode_id, watched_at, pending_action
        FROM episode_watches
        WHERE show_id = ?
        ORDER BY watched_at, id
        "#,
    )
    .bind(show_id)
    .fetch_all(executor)
    .await
    .map_err(|e| AppError::database("Failed to list episode watches", e))?;

    rows.into_iter().map(row_to_watch).collect()
}

/// Gets every watch of one episode
pub async fn watches_for_episode<'e, E>(
    executor: E,
    episode_id: i64,
) -> Result<Vec<EpisodeWatchEntry>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        r#"
        SELECT id, remote_id, show_id, episode_id, watched_at, pending_action
        FROM episode_watches
        WHERE episode_id = ?
        ORDER BY watched_at, id
        "#,
    )
    .bind(episode_id)
    .fetch_all(executor)
    .await
    .map_err(|e| AppError::database("Failed to list episode watches", e))?;

    rows.into_iter().map(row_to_watch).collect()
}

/// Gets a watch by local id
pub async fn watch_with_id<'e, E>(
    executor: E,
    id: LocalId,
) -> Result<Option<EpisodeWatchEntry>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        "SELECT id, remote_id, show_id, episode_id, watched_at, pending_action FROM episode_watches WHERE id = ?",
    )
    .bind(id.get())
    .fetch_optional(executor)
    .await
    .map_err(|e| AppError::database("Failed to fetch episode watch", e))?;

    row.map(row_to_watch).transpose()
}

/// Lists the shows that have at least one stored watch
pub async fn shows_with_watches<'e, E>(executor: E) -> Result<Vec<i64>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar("SELECT DISTINCT show_id FROM episode_watches ORDER BY show_id")
        .fetch_all(executor)
        .await
        .map_err(|e| AppError::database("Failed to list watched shows", e))
}

/// Inserts a new watch and returns its local id
///
/// A watch whose remote id is already stored overwrites that row and keeps
/// its local id. Watches without a remote id always insert.
pub async fn insert_watch<'e, E>(executor: E, watch: &EpisodeWatchEntry) -> Result<LocalId, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO episode_watches (remote_id, show_id, episode_id, watched_at, pending_action)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (remote_id) WHERE remote_id IS NOT NULL DO UPDATE SET
            show_id = excluded.show_id,
            episode_id = excluded.episode_id,
            watched_at = excluded.watched_at,
            pending_action = excluded.pending_action
        RETURNING id
        "#,
    )
    .bind(watch.remote_id)
    .bind(watch.show_id)
    .bind(watch.episode_id)
    .bind(watch.watched_at.as_millis())
    .bind(watch.pending_action.as_str())
    .fetch_one(executor)
    .await
    .map_err(|e| AppError::database("Failed to insert episode watch", e))?;

    Ok(LocalId::new(id))
}

/// Inserts a watch unless its remote id is held by a row in another pending state
///
/// Returns `None` when the existing row was left alone.
pub async fn insert_watch_if_pending<'e, E>(
    executor: E,
    watch: &EpisodeWatchEntry,
    expected: PendingAction,
) -> Result<Option<LocalId>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id: Option<i64> = sqlx::query_scalar(
        r#"
        INSERT INTO episode_watches (remote_id, show_id, episode_id, watched_at, pending_action)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (remote_id) WHERE remote_id IS NOT NULL DO UPDATE SET
            show_id = excluded.show_id,
            episode_id = excluded.episode_id,
            watched_at = excluded.watched_at,
            pending_action = excluded.pending_action
        WHERE episode_watches.pending_action = ?
        RETURNING id
        "#,
    )
    .bind(watch.remote_id)
    .bind(watch.show_id)
    .bind(watch.episode_id)
    .bind(watch.watched_at.as_millis())
    .bind(watch.pending_action.as_str())
    .bind(expected.as_str())
    .fetch_optional(executor)
    .await
    .map_err(|e| AppError::database("Failed to insert episode watch", e))?;

    Ok(id.map(LocalId::new))
}

/// Updates an existing watch in place
pub async fn update_watch<'e, E>(executor: E, watch: &EpisodeWatchEntry) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = watch.local_id.ok_or_else(|| AppError::InvalidArgument {
        argument: "local_id".to_string(),
        reason: format!(
            "watch of episode {} has not been stored yet",
            watch.episode_id
        ),
    })?;

    let result = sqlx::query(
        r#"
        UPDATE episode_watches
        SET remote_id = ?, show_id = ?, episode_id = ?, watched_at = ?, pending_action = ?
        WHERE id = ?
        "#,
    )
    .bind(watch.remote_id)
    .bind(watch.show_id)
    .bind(watch.episode_id)
    .bind(watch.watched_at.as_millis())
    .bind(watch.pending_action.as_str())
    .bind(id.get())
    .execute(executor)
    .await
    .map_err(|e| AppError::database("Failed to update episode watch", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::RecordNotFound {
            entity: "EpisodeWatch".to_string(),
            identifier: id.to_string(),
        });
    }

    Ok(())
}

/// Updates a watch only while its row still carries `expected`
pub async fn update_watch_if_pending<'e, E>(
    executor: E,
    watch: &EpisodeWatchEntry,
    expected: PendingAction,
) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = watch.local_id.ok_or_else(|| AppError::InvalidArgument {
        argument: "local_id".to_string(),
        reason: format!(
            "watch of episode {} has not been stored yet",
            watch.episode_id
        ),
    })?;

    let result = sqlx::query(
        r#"
        UPDATE episode_watches
        SET remote_id = ?, show_id = ?, episode_id = ?, watched_at = ?, pending_action = ?
        WHERE id = ? AND pending_action = ?
        "#,
    )
    .bind(watch.remote_id)
    .bind(watch.show_id)
    .bind(watch.episode_id)
    .bind(watch.watched_at.as_millis())
    .bind(watch.pending_action.as_str())
    .bind(id.get())
    .bind(expected.as_str())
    .execute(executor)
    .await
    .map_err(|e| AppError::database("Failed to update episode watch", e))?;

    Ok(result.rows_affected() > 0)
}

/// Deletes the given rows, returning how many were removed
pub async fn delete_with_ids<'e, E>(executor: E, ids: &[LocalId]) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    if ids.is_empty() {
        return Ok(0);
    }

    let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM episode_watches WHERE id IN ");
    push_id_list(&mut builder, ids);

    let result = builder
        .build()
        .execute(executor)
        .await
        .map_err(|e| AppError::database("Failed to delete episode watches", e))?;

    Ok(result.rows_affected())
}

/// Deletes those of the given rows that still carry `expected`, returning their ids
pub async fn delete_with_ids_if_pending<'e, E>(
    executor: E,
    ids: &[LocalId],
    expected: PendingAction,
) -> Result<Vec<LocalId>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder =
        QueryBuilder::<Sqlite>::new("DELETE FROM episode_watches WHERE pending_action = ");
    builder.push_bind(expected.as_str());
    builder.push(" AND id IN ");
    push_id_list(&mut builder, ids);
    builder.push(" RETURNING id");

    let deleted: Vec<i64> = builder
        .build_query_scalar()
        .fetch_all(executor)
        .await
        .map_err(|e| AppError::database("Failed to delete episode watches", e))?;

    Ok(deleted.into_iter().map(LocalId::new).collect())
}

/// Sets the pending action of the given rows
pub async fn update_pending_action<'e, E>(
    executor: E,
    ids: &[LocalId],
    action: PendingAction,
) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    if ids.is_empty() {
        return Ok(0);
    }

    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE episode_watches SET pending_action = ");
    builder.push_bind(action.as_str());
    builder.push(" WHERE id IN ");
    push_id_list(&mut builder, ids);

    let result = builder
        .build()
        .execute(executor)
        .await
        .map_err(|e| AppError::database("Failed to update pending action", e))?;

    Ok(result.rows_affected())
}

pub(crate) fn row_to_watch(row: sqlx::sqlite::SqliteRow) -> Result<EpisodeWatchEntry, AppError> {
    use sqlx::Row;

    let id: i64 = row
        .try_get("id")
        .map_err(|e| AppError::database("Missing episode watch ID", e))?;
    let remote_id: Option<i64> = row
        .try_get("remote_id")
        .map_err(|e| AppError::database("Missing remote ID", e))?;
    let show_id: i64 = row
        .try_get("show_id")
        .map_err(|e| AppError::database("Missing show ID", e))?;
    let episode_id: i64 = row
        .try_get("episode_id")
        .map_err(|e| AppError::database("Missing episode ID", e))?;
    let watched_at: i64 = row
        .try_get("watched_at")
        .map_err(|e| AppError::database("Missing watched_at", e))?;
    let pending_action: String = row
        .try_get("pending_action")
        .map_err(|e| AppError::database("Missing pending action", e))?;

    Ok(EpisodeWatchEntry {
        local_id: Some(LocalId::new(id)),
        remote_id,
        show_id,
        episode_id,
        watched_at: Timestamp::from_millis(watched_at),
        pending_action: parse_pending_action(&pending_action)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_in_memory;
    use crate::migrations::run_migrations;
    use crate::DbPool;

    async fn setup() -> DbPool {
        let pool = connect_in_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    fn watch(show_id: i64, episode_id: i64, remote_id: Option<i64>) -> EpisodeWatchEntry {
        EpisodeWatchEntry {
            remote_id,
            ..EpisodeWatchEntry::new(show_id, episode_id, Timestamp::from_millis(episode_id))
        }
    }

    #[tokio::test]
    async fn test_insert_without_remote_id_never_conflicts() {
        let pool = setup().await;

        let a = insert_watch(&pool, &watch(1, 10, None)).await.unwrap();
        let b = insert_watch(&pool, &watch(1, 10, None)).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(watches_for_episode(&pool, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_conditional_writes_respect_pending_state() {
        let pool = setup().await;
        let queued = insert_watch(
            &pool,
            &EpisodeWatchEntry {
                pending_action: PendingAction::Delete,
                ..watch(1, 10, Some(500))
            },
        )
        .await
        .unwrap();

        let pulled =
            insert_watch_if_pending(&pool, &watch(1, 10, Some(500)), PendingAction::Nothing)
                .await
                .unwrap();
        assert_eq!(pulled, None);

        let stored = watch_with_id(&pool, queued).await.unwrap().unwrap();
        assert_eq!(stored.pending_action, PendingAction::Delete);
        assert!(!update_watch_if_pending(
            &pool,
            &EpisodeWatchEntry {
                pending_action: PendingAction::Nothing,
                ..stored.clone()
            },
            PendingAction::Nothing,
        )
        .await
        .unwrap());

        let deleted = delete_with_ids_if_pending(&pool, &[queued], PendingAction::Nothing)
            .await
            .unwrap();
        assert!(deleted.is_empty());
        let deleted = delete_with_ids_if_pending(&pool, &[queued], PendingAction::Delete)
            .await
            .unwrap();
        assert_eq!(deleted, vec![queued]);
    }

    #[tokio::test]
    async fn test_insert_with_known_remote_id_replaces_row() {
        let pool = setup().await;

        let a = insert_watch(&pool, &watch(1, 10, Some(500))).await.unwrap();
        let mut replacement = watch(1, 11, Some(500));
        replacement.watched_at = Timestamp::from_millis(99);
        let b = insert_watch(&pool, &replacement).await.unwrap();

        assert_eq!(a, b);
        let stored = watch_with_id(&pool, a).await.unwrap().unwrap();
        assert_eq!(stored.episode_id, 11);
        assert_eq!(stored.watched_at, Timestamp::from_millis(99));
    }

    #[tokio::test]
    async fn test_queries_are_scoped_by_show() {
        let pool = setup().await;
        insert_watch(&pool, &watch(1, 10, Some(1))).await.unwrap();
        insert_watch(&pool, &watch(2, 20, Some(2))).await.unwrap();

        let mut pending = watch(1, 11, None);
        pending.pending_action = PendingAction::Upload;
        insert_watch(&pool, &pending).await.unwrap();

        let active = watches_with_pending_action(&pool, 1, PendingAction::Nothing)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].episode_id, 10);

        let uploads = watches_with_pending_action(&pool, 1, PendingAction::Upload)
            .await
            .unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].remote_id, None);

        assert_eq!(watches_for_show(&pool, 1).await.unwrap().len(), 2);
        assert_eq!(shows_with_watches(&pool).await.unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_update_attaches_remote_id() {
        let pool = setup().await;
        let mut pending = watch(1, 10, None);
        pending.pending_action = PendingAction::Upload;
        let id = insert_watch(&pool, &pending).await.unwrap();

        let mut stored = watch_with_id(&pool, id).await.unwrap().unwrap();
        stored.remote_id = Some(777);
        stored.pending_action = PendingAction::Nothing;
        update_watch(&pool, &stored).await.unwrap();

        let reloaded = watch_with_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(reloaded.remote_id, Some(777));
        assert_eq!(reloaded.pending_action, PendingAction::Nothing);
    }

    #[tokio::test]
    async fn test_update_pending_action_and_delete() {
        let pool = setup().await;
        let a = insert_watch(&pool, &watch(1, 10, Some(1))).await.unwrap();
        let b = insert_watch(&pool, &watch(1, 11, Some(2))).await.unwrap();

        update_pending_action(&pool, &[a], PendingAction::Delete)
            .await
            .unwrap();
        let deletes = watches_with_pending_action(&pool, 1, PendingAction::Delete)
            .await
            .unwrap();
        assert_eq!(deletes.len(), 1);
        assert_eq!(deletes[0].local_id, Some(a));

        assert_eq!(delete_with_ids(&pool, &[a, b]).await.unwrap(), 2);
        assert!(watches_for_show(&pool, 1).await.unwrap().is_empty());
    }
}
