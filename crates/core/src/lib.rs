//! Shared domain types and the error taxonomy for showsync
//!
//! Everything the database, sync engine and CLI crates agree on lives here:
//! timestamps, local identifiers, the pending-action tag carried by every
//! synced record, and the records themselves.

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, ErrorSeverity, RecoveryAction, Result};
pub use types::{
    EpisodeWatchEntry, FollowedShowEntry, LocalId, PendingAction, SyncGroup, SyncedEntity,
    Timestamp,
};
