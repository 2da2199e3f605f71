//! Followed show database operations

use super::{parse_pending_action, push_id_list};
use showsync_core::{AppError, FollowedShowEntry, LocalId, PendingAction, Timestamp};
use sqlx::{Executor, QueryBuilder, Sqlite};

/// Gets all entries carrying the given pending action, oldest follow first
pub async fn entries_with_pending_action<'e, E>(
    executor: E,
    action: PendingAction,
) -> Result<Vec<FollowedShowEntry>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        "SELECT id, show_id, title, followed_at, pending_action FROM followed_shows WHERE pending_action = ? ORDER BY followed_at, id",
    )
    .bind(action.as_str())
    .fetch_all(executor)
    .await
    .map_err(|e| AppError::database("Failed to list followed shows", e))?;

    rows.into_iter().map(row_to_entry).collect()
}

/// Gets every entry regardless of pending state
pub async fn all_entries<'e, E>(executor: E) -> Result<Vec<FollowedShowEntry>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        "SELECT id, show_id, title, followed_at, pending_action FROM followed_shows ORDER BY followed_at, id",
    )
    .fetch_all(executor)
    .await
    .map_err(|e| AppError::database("Failed to list followed shows", e))?;

    rows.into_iter().map(row_to_entry).collect()
}

/// Gets the entry for a catalog show id
pub async fn entry_with_show_id<'e, E>(
    executor: E,
    show_id: i64,
) -> Result<Option<FollowedShowEntry>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        "SELECT id, show_id, title, followed_at, pending_action FROM followed_shows WHERE show_id = ?",
    )
    .bind(show_id)
    .fetch_optional(executor)
    .await
    .map_err(|e| AppError::database("Failed to fetch followed show", e))?;

    row.map(row_to_entry).transpose()
}

/// Gets an entry by local id
pub async fn entry_with_id<'e, E>(
    executor: E,
    id: LocalId,
) -> Result<Option<FollowedShowEntry>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        "SELECT id, show_id, title, followed_at, pending_action FROM followed_shows WHERE id = ?",
    )
    .bind(id.get())
    .fetch_optional(executor)
    .await
    .map_err(|e| AppError::database("Failed to fetch followed show", e))?;

    row.map(row_to_entry).transpose()
}

/// Inserts a new entry and returns its local id
///
/// A row that already holds the same show id is overwritten in place and
/// keeps its local id.
pub async fn insert_entry<'e, E>(executor: E, entry: &FollowedShowEntry) -> Result<LocalId, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO followed_shows (show_id, title, followed_at, pending_action)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (show_id) DO UPDATE SET
            title = excluded.title,
            followed_at = excluded.followed_at,
            pending_action = excluded.pending_action
        RETURNING id
        "#,
    )
    .bind(entry.show_id)
    .bind(&entry.title)
    .bind(entry.followed_at.as_millis())
    .bind(entry.pending_action.as_str())
    .fetch_one(executor)
    .await
    .map_err(|e| AppError::database("Failed to insert followed show", e))?;

    Ok(LocalId::new(id))
}

/// Inserts an entry unless its show id is held by a row in another pending state
///
/// A row for the same show that still carries `expected` is overwritten and
/// keeps its local id. Returns `None` when the existing row was left alone.
pub async fn insert_entry_if_pending<'e, E>(
    executor: E,
    entry: &FollowedShowEntry,
    expected: PendingAction,
) -> Result<Option<LocalId>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id: Option<i64> = sqlx::query_scalar(
        r#"
        INSERT INTO followed_shows (show_id, title, followed_at, pending_action)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (show_id) DO UPDATE SET
            title = excluded.title,
            followed_at = excluded.followed_at,
            pending_action = excluded.pending_action
        WHERE followed_shows.pending_action = ?
        RETURNING id
        "#,
    )
    .bind(entry.show_id)
    .bind(&entry.title)
    .bind(entry.followed_at.as_millis())
    .bind(entry.pending_action.as_str())
    .bind(expected.as_str())
    .fetch_optional(executor)
    .await
    .map_err(|e| AppError::database("Failed to insert followed show", e))?;

    Ok(id.map(LocalId::new))
}

/// Updates an existing entry in place
pub async fn update_entry<'e, E>(executor: E, entry: &FollowedShowEntry) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = entry.local_id.ok_or_else(|| AppError::InvalidArgument {
        argument: "local_id".to_string(),
        reason: format!("followed show {} has not been stored yet", entry.show_id),
    })?;

    let result = sqlx::query(
        r#"
        UPDATE followed_shows
        SET show_id = ?, title = ?, followed_at = ?, pending_action = ?
        WHERE id = ?
        "#,
    )
    .bind(entry.show_id)
    .bind(&entry.title)
    .bind(entry.followed_at.as_millis())
    .bind(entry.pending_action.as_str())
    .bind(id.get())
    .execute(executor)
    .await
    .map_err(|e| AppError::database("Failed to update followed show", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::RecordNotFound {
            entity: "FollowedShow".to_string(),
            identifier: id.to_string(),
        });
    }

    Ok(())
}

/// Updates an entry only while its row still carries `expected`
///
/// Returns false if the row is gone or its pending action changed.
pub async fn update_entry_if_pending<'e, E>(
    executor: E,
    entry: &FollowedShowEntry,
    expected: PendingAction,
) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = entry.local_id.ok_or_else(|| AppError::InvalidArgument {
        argument: "local_id".to_string(),
        reason: format!("followed show {} has not been stored yet", entry.show_id),
    })?;

    let result = sqlx::query(
        r#"
        UPDATE followed_shows
        SET show_id = ?, title = ?, followed_at = ?, pending_action = ?
        WHERE id = ? AND pending_action = ?
        "#,
    )
    .bind(entry.show_id)
    .bind(&entry.title)
    .bind(entry.followed_at.as_millis())
    .bind(entry.pending_action.as_str())
    .bind(id.get())
    .bind(expected.as_str())
    .execute(executor)
    .await
    .map_err(|e| AppError::database("Failed to update followed show", e))?;

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

    let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM followed_shows WHERE id IN ");
    push_id_list(&mut builder, ids);

    let result = builder
        .build()
        .execute(executor)
        .await
        .map_err(|e| AppError::database("Failed to delete followed shows", e))?;

    Ok(result.rows_affected())
}

/// Deletes those of the given rows that still carry `expected`
///
/// Returns the ids actually deleted.
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
        QueryBuilder::<Sqlite>::new("DELETE FROM followed_shows WHERE pending_action = ");
    builder.push_bind(expected.as_str());
    builder.push(" AND id IN ");
    push_id_list(&mut builder, ids);
    builder.push(" RETURNING id");

    let deleted: Vec<i64> = builder
        .build_query_scalar()
        .fetch_all(executor)
        .await
        .map_err(|e| AppError::database("Failed to delete followed shows", e))?;

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

    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE followed_shows SET pending_action = ");
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

pub(crate) fn row_to_entry(row: sqlx::sqlite::SqliteRow) -> Result<FollowedShowEntry, AppError> {
    use sqlx::Row;

    let id: i64 = row
        .try_get("id")
        .map_err(|e| AppError::database("Missing followed show ID", e))?;
    let show_id: i64 = row
        .try_get("show_id")
        .map_err(|e| AppError::database("Missing show ID", e))?;
    let title: String = row
        .try_get("title")
        .map_err(|e| AppError::database("Missing title", e))?;
    let followed_at: i64 = row
        .try_get("followed_at")
        .map_err(|e| AppError::database("Missing followed_at", e))?;
    let pending_action: String = row
        .try_get("pending_action")
        .map_err(|e| AppError::database("Missing pending action", e))?;

    Ok(FollowedShowEntry {
        local_id: Some(LocalId::new(id)),
        show_id,
        title,
        followed_at: Timestamp::from_millis(followed_at),
        pending_action: parse_pending_action(&pending_action)?,
    })
}
