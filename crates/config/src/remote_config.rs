//! Remote service request policy

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry and timeout settings applied to every remote request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
    /// Attempts per request, including the first
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each further attempt
    pub initial_backoff_ms: u64,

    /// Upper bound on a single request
    pub request_timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
            request_timeout_secs: 30,
        }
    }
}

impl RemoteConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ConfigSection for RemoteConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(self.max_attempts, 1, 10, "remote.max_attempts"),
            Validator::in_range(
                self.initial_backoff_ms,
                10,
                60_000,
                "remote.initial_backoff_ms",
            ),
            Validator::in_range(
                self.request_timeout_secs,
                1,
                300,
                "remote.request_timeout_secs",
            ),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.max_attempts = other.max_attempts;
        self.initial_backoff_ms = other.initial_backoff_ms;
        self.request_timeout_secs = other.request_timeout_secs;
    }

    fn section_name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RemoteConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_backoff(), Duration::from_millis(200));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_multiple_validation_errors() {
        let config = RemoteConfig {
            max_attempts: 0,
            initial_backoff_ms: 1,
            request_timeout_secs: 0,
        };

        assert_eq!(config.validate().unwrap_err().len(), 3);
    }

    #[test]
    fn test_merge() {
        let mut base = RemoteConfig::default();
        base.merge(RemoteConfig {
            max_attempts: 5,
            ..Default::default()
        });
        assert_eq!(base.max_attempts, 5);
    }
}
