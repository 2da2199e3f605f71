// crates/resilience/src/error.rs
//! Error types for resilience operations

use thiserror::Error;

/// Result type for resilience operations
pub type ResilienceResult<T> = Result<T, ResilienceError>;

/// Errors that can occur in resilience operations
#[derive(Debug, Error)]
pub enum ResilienceError {
    /// Operation timed out
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: String,
        after: std::time::Duration,
    },
}

impl ResilienceError {
    /// Duration the operation was allowed before it was abandoned
    pub fn elapsed_limit(&self) -> std::time::Duration {
        match self {
            Self::Timeout { after, .. } => *after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_error() {
        let err = ResilienceError::Timeout {
            operation: "fetch snapshot".to_string(),
            after: std::time::Duration::from_secs(5),
        };
        assert!(err.to_string().contains("timed out"));
        assert!(err.to_string().contains("5s"));
        assert!(err.to_string().contains("fetch snapshot"));
        assert_eq!(err.elapsed_limit(), std::time::Duration::from_secs(5));
    }
}
