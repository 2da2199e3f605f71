//! Database query operations organized by table
//!
//! Every function is generic over the executor, so the same query runs on the
//! pool or inside a transaction opened by [`crate::TransactionRunner`].

pub mod episode_watches;
pub mod followed_shows;
pub mod last_requests;

use showsync_core::{AppError, LocalId, PendingAction};
use sqlx::{QueryBuilder, Sqlite};

/// Appends `(?, ?, ...)` for the given ids
pub(crate) fn push_id_list(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[LocalId]) {
    builder.push("(");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id.get());
    }
    separated.push_unseparated(")");
}

pub(crate) fn parse_pending_action(value: &str) -> Result<PendingAction, AppError> {
    value
        .parse::<PendingAction>()
        .map_err(|reason| AppError::DatabaseError {
            message: format!("Invalid pending action column: {}", reason),
            source: None,
        })
}
