//! Error types for the configuration system

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write config file at {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Config contains invalid values; the message joins every field error
    #[error("Config validation failed: {0}")]
    ValidationError(String),

    /// An environment override could not be parsed
    #[error("Invalid value {value:?} in {variable}")]
    InvalidOverride { variable: String, value: String },

    #[error("Failed to create config directory at {path}: {source}")]
    DirectoryCreationError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not determine config directory path: {reason}")]
    PathResolutionError { reason: String },

    #[error("Failed to backup config file: {source}")]
    BackupError { source: std::io::Error },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Validation error for a specific config field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Path to the field (e.g., "sync.followed_shows_expiry_hours")
    pub field: String,

    /// Human-readable error message
    pub message: String,

    /// The invalid value, if available
    pub value: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Creates a validation error with the invalid value
    pub fn with_value(
        field: impl Into<String>,
        message: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: Some(value.to_string()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Field '{}': {}", self.field, self.message)?;
        if let Some(ref value) = self.value {
            write!(f, " (got: {})", value)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("remote.max_attempts", "must be between 1 and 10");
        assert_eq!(
            err.to_string(),
            "Field 'remote.max_attempts': must be between 1 and 10"
        );
    }

    #[test]
    fn test_validation_error_with_value() {
        let err = ValidationError::with_value("remote.max_attempts", "must be between 1 and 10", 0);
        assert_eq!(
            err.to_string(),
            "Field 'remote.max_attempts': must be between 1 and 10 (got: 0)"
        );
    }

    #[test]
    fn test_invalid_override_display() {
        let err = ConfigError::InvalidOverride {
            variable: "SHOWSYNC_REMOTE_MAX_ATTEMPTS".to_string(),
            value: "many".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value \"many\" in SHOWSYNC_REMOTE_MAX_ATTEMPTS"
        );
    }
}
