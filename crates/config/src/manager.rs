//! Configuration manager - main API for config operations

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult, LogLevel};
use directories::ProjectDirs;
use std::path::PathBuf;
use std::str::FromStr;

/// Prefix of the environment variables that override file values
pub const ENV_PREFIX: &str = "SHOWSYNC";

/// Main configuration manager
///
/// Owns the config directory: the config file lives there, and relative
/// paths in the config resolve against it.
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a config manager using the platform config directory
    ///
    /// - Linux: `~/.config/showsync/`
    /// - macOS: `~/Library/Application Support/showsync/`
    /// - Windows: `%APPDATA%\showsync\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::default_config_dir()?;
        Self::with_directory(config_dir)
    }

    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        let persistence = ConfigPersistence::new(config_dir.join("config.toml"));

        Ok(Self {
            persistence,
            config_dir,
        })
    }

    fn default_config_dir() -> ConfigResult<PathBuf> {
        ProjectDirs::from("", "", "showsync")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .ok_or_else(|| ConfigError::PathResolutionError {
                reason: "Could not determine user config directory".to_string(),
            })
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Database file for `config`, resolved against the config directory
    pub fn database_path(&self, config: &Config) -> PathBuf {
        config.app.resolved_database_path(&self.config_dir)
    }

    /// Loads the configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file is corrupted, returns an error.
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Loads the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    /// Validates and atomically saves the configuration
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Loads, applies `update_fn` and saves
    ///
    /// ```rust,no_run
    /// # use showsync_config::ConfigManager;
    /// # let manager = ConfigManager::new().unwrap();
    /// manager.update(|config| {
    ///     config.sync.followed_shows_expiry_hours = 6;
    /// }).expect("Failed to update config");
    /// ```
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes the default config if no file exists yet
    ///
    /// Returns `Ok(true)` if a new file was created.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.save(&Config::default())?;
        log::info!("Generated default config at {}", self.config_path().display());
        Ok(true)
    }

    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Returns a message for every invalid field of the config file
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;

        match config.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(errors) => Ok(errors.iter().map(|e| e.to_string()).collect()),
        }
    }

    /// Loads the config file, then applies `SHOWSYNC_<SECTION>_<FIELD>`
    /// environment overrides
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_overrides(&mut config, |name| std::env::var(name).ok())?;

        if let Err(errors) = config.validate() {
            log::warn!(
                "Config validation warnings after env overrides: {:?}",
                errors
            );
        }

        Ok(config)
    }
}

fn parse_override<T: FromStr>(variable: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidOverride {
            variable: variable.to_string(),
            value: value.to_string(),
        })
}

/// Applies every override `lookup` knows about
pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| {
        let variable = format!("{}_{}", ENV_PREFIX, name);
        lookup(&variable).map(|value| (variable, value))
    };

    if let Some((_, value)) = var("APP_DATABASE_PATH") {
        config.app.database_path = PathBuf::from(value);
    }
    if let Some((variable, value)) = var("APP_LOG_LEVEL") {
        config.app.log_level = parse_override::<LogLevel>(&variable, &value)?;
    }
    if let Some((variable, value)) = var("SYNC_FOLLOWED_SHOWS_EXPIRY_HOURS") {
        config.sync.followed_shows_expiry_hours = parse_override(&variable, &value)?;
    }
    if let Some((variable, value)) = var("SYNC_EPISODE_WATCHES_EXPIRY_HOURS") {
        config.sync.episode_watches_expiry_hours = parse_override(&variable, &value)?;
    }
    if let Some((_, value)) = var("SYNC_REMOTE_PATH") {
        config.sync.remote_path = Some(PathBuf::from(value));
    }
    if let Some((variable, value)) = var("REMOTE_MAX_ATTEMPTS") {
        config.remote.max_attempts = parse_override(&variable, &value)?;
    }
    if let Some((variable, value)) = var("REMOTE_INITIAL_BACKOFF_MS") {
        config.remote.initial_backoff_ms = parse_override(&variable, &value)?;
    }
    if let Some((variable, value)) = var("REMOTE_REQUEST_TIMEOUT_SECS") {
        config.remote.request_timeout_secs = parse_override(&variable, &value)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn setup_test_manager() -> (TempDir, ConfigManager) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())
            .expect("Failed to create manager");
        (temp_dir, manager)
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let (_temp_dir, manager) = setup_test_manager();
        assert_eq!(manager.load_or_default(), Config::default());
    }

    #[test]
    fn test_load_or_default_with_broken_file() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(manager.config_path(), "[app").unwrap();

        assert!(manager.load().is_err());
        assert_eq!(manager.load_or_default(), Config::default());
    }

    #[test]
    fn test_update() {
        let (_temp_dir, manager) = setup_test_manager();

        manager
            .update(|config| config.remote.max_attempts = 5)
            .expect("Should update");

        assert_eq!(manager.load().unwrap().remote.max_attempts, 5);
    }

    #[test]
    fn test_initialize_only_once() {
        let (_temp_dir, manager) = setup_test_manager();

        assert!(manager.initialize().expect("Should initialize"));
        assert!(manager.config_path().exists());
        assert!(!manager.initialize().expect("Should initialize"));
    }

    #[test]
    fn test_reset() {
        let (_temp_dir, manager) = setup_test_manager();
        manager
            .update(|config| config.sync.episode_watches_expiry_hours = 2)
            .unwrap();

        manager.reset().expect("Should reset");

        assert_eq!(manager.load().unwrap(), Config::default());
    }

    #[test]
    fn test_validate_reports_invalid_file() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(manager.config_path(), "[remote]\nrequest_timeout_secs = 0\n").unwrap();

        let errors = manager.validate().expect("Should validate");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("remote.request_timeout_secs"));
    }

    #[test]
    fn test_database_path_is_relative_to_config_dir() {
        let (temp_dir, manager) = setup_test_manager();
        let config = Config::default();

        assert_eq!(
            manager.database_path(&config),
            temp_dir.path().join("showsync.db")
        );
    }

    #[test]
    fn test_apply_overrides() {
        let vars = env(&[
            ("SHOWSYNC_APP_LOG_LEVEL", "debug"),
            ("SHOWSYNC_SYNC_REMOTE_PATH", "/tmp/remote.json"),
            ("SHOWSYNC_REMOTE_MAX_ATTEMPTS", "7"),
        ]);
        let mut config = Config::default();

        apply_overrides(&mut config, |name| vars.get(name).cloned()).unwrap();

        assert_eq!(config.app.log_level, LogLevel::Debug);
        assert_eq!(
            config.sync.remote_path,
            Some(PathBuf::from("/tmp/remote.json"))
        );
        assert_eq!(config.remote.max_attempts, 7);
        assert_eq!(config.sync.followed_shows_expiry_hours, 3);
    }

    #[test]
    fn test_unparsable_override_is_an_error() {
        let vars = env(&[("SHOWSYNC_SYNC_FOLLOWED_SHOWS_EXPIRY_HOURS", "soon")]);
        let mut config = Config::default();

        let err = apply_overrides(&mut config, |name| vars.get(name).cloned()).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidOverride { ref variable, .. }
                if variable == "SHOWSYNC_SYNC_FOLLOWED_SHOWS_EXPIRY_HOURS"
        ));
    }
}
