//! Atomic write scopes

use crate::DbPool;
use showsync_core::AppError;
use sqlx::{Sqlite, Transaction};

/// Hands out transactions on the shared pool
///
/// A transaction that is dropped without [`TransactionRunner::commit`] rolls
/// back, so a batch that fails half way leaves no trace.
#[derive(Debug, Clone)]
pub struct TransactionRunner {
    pool: DbPool,
}

impl TransactionRunner {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// The pool transactions are opened on
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Opens a new transaction
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, AppError> {
        self.pool
            .begin()
            .await
            .map_err(|e| AppError::database("Failed to begin transaction", e))
    }

    /// Commits a transaction opened by [`TransactionRunner::begin`]
    pub async fn commit(tx: Transaction<'static, Sqlite>) -> Result<(), AppError> {
        tx.commit()
            .await
            .map_err(|e| AppError::database("Failed to commit transaction", e))
    }
}
