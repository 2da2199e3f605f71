//! Error types and recovery strategies for showsync
//!
//! Errors are classified into three severity tiers:
//! - **Recoverable**: can be retried (network failures and timeouts)
//! - **Degraded**: the remote side is unusable but local work continues
//!   (no signed-in account, remote rejected a request)
//! - **Fatal**: requires user intervention (migration failure, broken config)
//!
//! Each error maps to a recovery action. The sync engine itself never retries;
//! remote data source implementations use [`AppError::is_retryable`] to drive
//! their own backoff.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Recovery actions that can be taken when an error occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Retry the operation immediately (e.g., transient network glitch)
    RetryImmediate,
    /// Retry with exponential backoff (e.g., server temporarily unavailable)
    RetryWithBackoff,
    /// Keep working against the local replica only
    WorkOffline,
    /// Restore the database from a known-good state
    RepairDatabase,
    /// No automatic recovery - user intervention required
    UserIntervention,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetryImmediate => write!(f, "Retrying immediately"),
            Self::RetryWithBackoff => write!(f, "Retrying with backoff"),
            Self::WorkOffline => write!(f, "Working offline"),
            Self::RepairDatabase => write!(f, "Repairing database"),
            Self::UserIntervention => write!(f, "User intervention required"),
        }
    }
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Error can be automatically recovered from
    Recoverable,
    /// Remote features degraded but local work continues
    Degraded,
    /// Critical error requiring user action
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Main error type for showsync
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Remote Errors =====
    /// Network request failed
    #[error("Network error: {message}")]
    NetworkError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Network timeout
    #[error("Network timeout after {seconds}s: {operation}")]
    NetworkTimeout { operation: String, seconds: u64 },

    /// No authenticated account is available for the remote service
    #[error("Remote authentication unavailable: {reason}")]
    AuthUnavailable { reason: String },

    /// The remote service answered but refused the request
    #[error("Remote rejected {operation}: {reason}")]
    RemoteRejected { operation: String, reason: String },

    // ===== Database Errors =====
    /// Database operation failed
    #[error("Database error: {message}")]
    DatabaseError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database migration failed
    #[error("Migration failed: {version} - {reason}")]
    MigrationFailed { version: String, reason: String },

    /// Record not found in database
    #[error("Record not found: {entity} with {identifier}")]
    RecordNotFound { entity: String, identifier: String },

    // ===== File System Errors =====
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// General I/O error
    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: io::Error,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration
    #[error("Invalid configuration: {setting} = '{value}' ({reason})")]
    InvalidConfiguration {
        setting: String,
        value: String,
        reason: String,
    },

    // ===== Generic Errors =====
    /// Generic internal error
    #[error("Internal error: {message}")]
    InternalError { message: String },

    /// Invalid argument provided
    #[error("Invalid argument: {argument} - {reason}")]
    InvalidArgument { argument: String, reason: String },
}

impl AppError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NetworkError { .. } | Self::NetworkTimeout { .. } => ErrorSeverity::Recoverable,

            Self::AuthUnavailable { .. }
            | Self::RemoteRejected { .. }
            | Self::RecordNotFound { .. } => ErrorSeverity::Degraded,

            Self::MigrationFailed { .. } | Self::InvalidConfiguration { .. } => {
                ErrorSeverity::Fatal
            }

            _ => ErrorSeverity::Degraded,
        }
    }

    /// Returns the recommended recovery action for this error
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::NetworkTimeout { .. } => RecoveryAction::RetryImmediate,

            Self::NetworkError { .. } => RecoveryAction::RetryWithBackoff,

            Self::AuthUnavailable { .. } | Self::RemoteRejected { .. } => {
                RecoveryAction::WorkOffline
            }

            Self::MigrationFailed { .. } => RecoveryAction::RepairDatabase,

            _ => RecoveryAction::UserIntervention,
        }
    }

    /// Returns a user-friendly error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            Self::NetworkError { .. } | Self::NetworkTimeout { .. } => {
                "Cannot reach the tracking service. Changes are kept locally.".to_string()
            }
            Self::AuthUnavailable { .. } => {
                "Not signed in. Changes are kept on this device only.".to_string()
            }
            Self::RemoteRejected { .. } => {
                "The tracking service refused the update. Try syncing again later.".to_string()
            }
            Self::DatabaseError { .. } => {
                "Local storage is temporarily unavailable. Please try again.".to_string()
            }
            Self::MigrationFailed { .. } => {
                "Failed to upgrade local storage.".to_string()
            }
            Self::RecordNotFound { .. } => "The requested item was not found.".to_string(),
            Self::FileNotFound { .. } | Self::IoError { .. } => {
                "A file operation failed. Please try again.".to_string()
            }
            Self::InvalidConfiguration { setting, .. } => {
                format!("Invalid setting: {}. Please check your configuration.", setting)
            }
            Self::InternalError { .. } => {
                "An unexpected error occurred. Please try again.".to_string()
            }
            Self::InvalidArgument { .. } => "Invalid input provided.".to_string(),
        }
    }

    /// Returns true if this error can be automatically retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.recovery_action(),
            RecoveryAction::RetryImmediate | RecoveryAction::RetryWithBackoff
        )
    }

    /// Helper to create a network error from any error type
    pub fn network<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper to create a database error from any error type
    pub fn database<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::DatabaseError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper for a missing signed-in account
    pub fn auth_unavailable(reason: impl Into<String>) -> Self {
        Self::AuthUnavailable {
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound {
                path: PathBuf::from("unknown"),
            },
            _ => Self::IoError {
                message: err.to_string(),
                source: err,
            },
        }
    }
}
