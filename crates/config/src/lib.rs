//! showsync configuration
//!
//! One TOML file with a section per concern. Each section implements
//! [`ConfigSection`], so adding settings means adding a section type.
//!
//! ```toml
//! [app]
//! database_path = "showsync.db"
//! log_level = "info"
//!
//! [sync]
//! followed_shows_expiry_hours = 3
//! episode_watches_expiry_hours = 24
//!
//! [remote]
//! max_attempts = 3
//! initial_backoff_ms = 200
//! request_timeout_secs = 30
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use showsync_config::{Config, ConfigManager};
//!
//! let manager = ConfigManager::new().expect("Failed to initialize config");
//! let config = manager.load().unwrap_or_else(|e| {
//!     eprintln!("Config error: {}, using defaults", e);
//!     Config::default()
//! });
//!
//! println!("Followed shows expire after {:?}", config.sync.followed_shows_expiry());
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

pub mod app_config;
mod remote_config;
mod sync_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::{apply_overrides, ConfigManager, ENV_PREFIX};
pub use persistence::ConfigPersistence;
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use remote_config::RemoteConfig;
pub use sync_config::SyncConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    pub app: AppConfig,

    /// Staleness windows and remote location
    pub sync: SyncConfig,

    /// Retry and timeout policy for remote requests
    pub remote: RemoteConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates every section, returning all errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.app.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.sync.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.remote.validate() {
            errors.append(&mut e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Like [`Config::validate`], with the errors joined into one message
    pub fn validation_message(&self) -> Result<(), String> {
        self.validate().map_err(|errors| {
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        })
    }

    /// Merges this config with another, preferring values from `other`
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.sync.merge(other.sync);
        self.remote.merge(other.remote);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            sync: SyncConfig::default(),
            remote: RemoteConfig::default(),
        }
    }
}
