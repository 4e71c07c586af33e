//! JSON Configuration Management
//!
//! Handles reading and writing the application configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_dir};

/// Configuration service for managing app settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: AppConfig,
}

impl ConfigService {
    /// Load the config from `~/.gem-eye/config.json`, or defaults when absent
    pub fn new() -> AppResult<Self> {
        Self::open(config_path()?)
    }

    /// Load the config at `path`. A missing file yields defaults and is not created.
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = path.into();
        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            debug!(path = %config_path.display(), "config file absent, using defaults");
            AppConfig::default()
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Write a default config file at `path`.
    ///
    /// Refuses to overwrite an existing file unless `force` is set.
    pub fn init(path: impl Into<PathBuf>, force: bool) -> AppResult<Self> {
        let config_path = path.into();
        if config_path.exists() && !force {
            return Err(AppError::config(format!(
                "{} already exists (use --force to overwrite)",
                config_path.display()
            )));
        }

        let service = Self {
            config_path,
            config: AppConfig::default(),
        };
        service.save()?;
        Ok(service)
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<AppConfig> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &Path, config: &AppConfig) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply a partial update in memory only.
    ///
    /// Used for environment and command-line overrides, which must never be persisted.
    pub fn overlay(&mut self, update: SettingsUpdate) -> AppResult<&AppConfig> {
        self.config.apply_update(update);
        self.config.validate().map_err(AppError::validation)?;
        Ok(&self.config)
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &self.config)
    }
}
