//! Application configuration loaded from a TOML file

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::AiConfig;
use crate::encryption::{EncryptionService, UnlockCache};
use crate::notes::FileNoteStore;

pub const CONFIG_FILENAME: &str = "config.toml";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding note records; the platform data dir when unset
    pub data_dir: Option<PathBuf>,
}

/// Session behavior of encrypted notes. The key derivation work factor is
/// fixed by the payload format and is not configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptionConfig {
    /// Seconds an unlocked note stays readable without access
    pub auto_lock_secs: u64,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self { auto_lock_secs: 3600 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub encryption: EncryptionConfig,
    pub ai: AiConfig,
}

impl AppConfig {
    /// `~/.config/notevault/config.toml` on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("notevault").join(CONFIG_FILENAME))
    }

    /// Load the config at `path`, or the default location when `None`.
    ///
    /// A missing file yields the defaults. The API key environment variable
    /// takes precedence over the file.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path(),
        };

        let mut config = match path {
            Some(path) if path.exists() => {
                log::debug!("Loading config from {}", path.display());
                let raw = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Io { path: path.clone(), source })?;
                Self::from_toml(&raw)?
            }
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_api_key_override(std::env::var(API_KEY_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// A non-blank key from the environment replaces the configured one
    fn apply_api_key_override(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.ai.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.encryption.auto_lock_secs == 0 {
            return Err(ConfigError::Invalid(
                "encryption.auto_lock_secs must be greater than zero".into(),
            ));
        }
        if self.ai.model.trim().is_empty() {
            return Err(ConfigError::Invalid("ai.model must not be empty".into()));
        }
        Ok(())
    }

    pub fn data_dir(&self) -> Option<PathBuf> {
        self.storage
            .data_dir
            .clone()
            .or_else(|| FileNoteStore::default_data_dir().ok())
    }

    pub fn encryption_service(&self) -> EncryptionService {
        EncryptionService::new()
    }

    pub fn unlock_cache(&self) -> UnlockCache {
        UnlockCache::with_timeout(Duration::from_secs(self.encryption.auto_lock_secs))
    }
}
