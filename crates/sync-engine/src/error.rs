// crates/sync-engine/src/error.rs
//! Error types for sync operations

use showsync_core::AppError;
use std::fmt;
use thiserror::Error;

/// Result type for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Which half of the pending-mutation push failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStage {
    Additions,
    Removals,
}

impl fmt::Display for PushStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Additions => write!(f, "additions"),
            Self::Removals => write!(f, "removals"),
        }
    }
}

/// Errors that can occur during synchronization
#[derive(Debug, Error)]
pub enum SyncError {
    /// Failure outside a sync run (local mutations, lookups)
    #[error(transparent)]
    App(#[from] AppError),

    /// The remote collection could not be resolved
    ///
    /// Never returned from `sync()`; the orchestrator degrades instead.
    #[error("Remote endpoint for {group} unavailable: {source}")]
    EndpointUnavailable {
        group: String,
        #[source]
        source: AppError,
    },

    /// Pushing pending uploads or deletes failed; pending state is untouched
    #[error("Failed to push {stage} for {group}: {source}")]
    Push {
        group: String,
        stage: PushStage,
        #[source]
        source: AppError,
    },

    /// Fetching the remote snapshot failed; no reconciliation happened
    #[error("Failed to pull {group}: {source}")]
    Pull {
        group: String,
        #[source]
        source: AppError,
    },

    /// The local store rejected a write during sync
    #[error("Local store failed while syncing {group}: {source}")]
    Store {
        group: String,
        #[source]
        source: AppError,
    },
}

impl SyncError {
    /// The underlying application error
    pub fn app_error(&self) -> &AppError {
        match self {
            Self::App(source)
            | Self::EndpointUnavailable { source, .. }
            | Self::Push { source, .. }
            | Self::Pull { source, .. }
            | Self::Store { source, .. } => source,
        }
    }

    /// Whether calling `sync()` again may succeed
    pub fn is_retryable(&self) -> bool {
        self.app_error().is_retryable()
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        self.app_error().user_message()
    }
}
