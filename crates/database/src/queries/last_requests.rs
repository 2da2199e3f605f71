//! Last request bookkeeping
//!
//! One row per `(request, entity_id)` holding the time of the last completed
//! sync attempt for that group.

use showsync_core::{AppError, Timestamp};
use sqlx::{Executor, Sqlite};

/// Gets the recorded timestamp, if any
pub async fn last_request<'e, E>(
    executor: E,
    request: &str,
    entity_id: i64,
) -> Result<Option<Timestamp>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let millis: Option<i64> = sqlx::query_scalar(
        "SELECT timestamp FROM last_requests WHERE request = ? AND entity_id = ?",
    )
    .bind(request)
    .bind(entity_id)
    .fetch_optional(executor)
    .await
    .map_err(|e| AppError::database("Failed to fetch last request", e))?;

    Ok(millis.map(Timestamp::from_millis))
}

/// Records `timestamp` as the last request, replacing any previous value
pub async fn upsert_last_request<'e, E>(
    executor: E,
    request: &str,
    entity_id: i64,
    timestamp: Timestamp,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO last_requests (request, entity_id, timestamp)
        VALUES (?, ?, ?)
        ON CONFLICT (request, entity_id) DO UPDATE SET timestamp = excluded.timestamp
        "#,
    )
    .bind(request)
    .bind(entity_id)
    .bind(timestamp.as_millis())
    .execute(executor)
    .await
    .map_err(|e| AppError::database("Failed to record last request", e))?;

    Ok(())
}

/// Forgets the recorded timestamp so the group reads as never synced
pub async fn delete_last_request<'e, E>(
    executor: E,
    request: &str,
    entity_id: i64,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("DELETE FROM last_requests WHERE request = ? AND entity_id = ?")
        .bind(request)
        .bind(entity_id)
        .execute(executor)
        .await
        .map_err(|e| AppError::database("Failed to clear last request", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_in_memory;
    use crate::migrations::run_migrations;

    #[tokio::test]
    async fn test_last_request_lifecycle() {
        let pool = connect_in_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();

        assert_eq!(last_request(&pool, "followed-shows", 0).await.unwrap(), None);

        upsert_last_request(&pool, "followed-shows", 0, Timestamp::from_millis(10))
            .await
            .unwrap();
        upsert_last_request(&pool, "followed-shows", 0, Timestamp::from_millis(20))
            .await
            .unwrap();

        assert_eq!(
            last_request(&pool, "followed-shows", 0).await.unwrap(),
            Some(Timestamp::from_millis(20))
        );

        delete_last_request(&pool, "followed-shows", 0).await.unwrap();
        assert_eq!(last_request(&pool, "followed-shows", 0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entity_ids_are_independent() {
        let pool = connect_in_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();

        upsert_last_request(&pool, "episode-watches", 1, Timestamp::from_millis(100))
            .await
            .unwrap();

        assert_eq!(
            last_request(&pool, "episode-watches", 1).await.unwrap(),
            Some(Timestamp::from_millis(100))
        );
        assert_eq!(last_request(&pool, "episode-watches", 2).await.unwrap(), None);
    }
}
