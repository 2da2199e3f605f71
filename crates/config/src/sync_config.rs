//! Sync scheduling configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Longest staleness window accepted for any group, one week
const MAX_EXPIRY_HOURS: u64 = 7 * 24;

/// When each sync group is considered stale, and where the remote lives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Hours before the followed shows list is synced again
    pub followed_shows_expiry_hours: u64,

    /// Hours before a show's watch history is synced again
    pub episode_watches_expiry_hours: u64,

    /// File standing in for the remote service; unset means offline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_path: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            followed_shows_expiry_hours: 3,
            episode_watches_expiry_hours: 24,
            remote_path: None,
        }
    }
}

impl SyncConfig {
    pub fn followed_shows_expiry(&self) -> Duration {
        hours(self.followed_shows_expiry_hours)
    }

    pub fn episode_watches_expiry(&self) -> Duration {
        hours(self.episode_watches_expiry_hours)
    }
}

fn hours(count: u64) -> Duration {
    Duration::from_secs(count * 60 * 60)
}

impl ConfigSection for SyncConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![
            Validator::in_range(
                self.followed_shows_expiry_hours,
                1,
                MAX_EXPIRY_HOURS,
                "sync.followed_shows_expiry_hours",
            ),
            Validator::in_range(
                self.episode_watches_expiry_hours,
                1,
                MAX_EXPIRY_HOURS,
                "sync.episode_watches_expiry_hours",
            ),
        ];

        if let Some(path) = &self.remote_path {
            results.push(Validator::not_empty(
                &path.to_string_lossy(),
                "sync.remote_path",
            ));
        }

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.followed_shows_expiry_hours = other.followed_shows_expiry_hours;
        self.episode_watches_expiry_hours = other.episode_watches_expiry_hours;
        if other.remote_path.is_some() {
            self.remote_path = other.remote_path;
        }
    }

    fn section_name(&self) -> &'static str {
        "sync"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SyncConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.followed_shows_expiry(), Duration::from_secs(3 * 3600));
        assert_eq!(config.episode_watches_expiry(), Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_expiry_out_of_range() {
        let config = SyncConfig {
            followed_shows_expiry_hours: 0,
            episode_watches_expiry_hours: MAX_EXPIRY_HOURS + 1,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().len(), 2);
    }

    #[test]
    fn test_empty_remote_path() {
        let config = SyncConfig {
            remote_path: Some(PathBuf::new()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_keeps_remote_path_when_unset() {
        let mut base = SyncConfig {
            remote_path: Some(PathBuf::from("remote.json")),
            ..Default::default()
        };
        let other = SyncConfig {
            followed_shows_expiry_hours: 6,
            ..Default::default()
        };

        base.merge(other);
        assert_eq!(base.followed_shows_expiry_hours, 6);
        assert_eq!(base.remote_path, Some(PathBuf::from("remote.json")));
    }
}
