//! Configuration service implementation.
//!
//! Loads the root configuration from `~/.config/sous-chef/config.toml`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use sous_core::SousError;
use sous_core::config::RootConfig;
use sous_core::error::Result;

use crate::paths::SousPaths;

/// Environment variable overriding `backend.base_url`.
pub const BACKEND_URL_ENV: &str = "SOUS_CHEF_BACKEND_URL";

/// Loads and caches the root configuration.
///
/// A missing file yields the defaults; a malformed one is reported by
/// [`ConfigService::load`] and replaced with defaults by
/// [`ConfigService::get_config`].
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: Option<PathBuf>,
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    /// Uses the platform config location.
    pub fn new() -> Self {
        Self {
            path: SousPaths::config_file().ok(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Uses an explicit config file (tests, `--config`).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Gets the root configuration, loading it on first access.
    pub fn get_config(&self) -> RootConfig {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = self.load().unwrap_or_else(|err| {
            tracing::warn!("[Config] {}; using defaults", err);
            Self::apply_env(RootConfig::default())
        });

        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = Some(loaded.clone());
        loaded
    }

    /// Reads the config file without touching the cache.
    ///
    /// # Errors
    ///
    /// Returns an IO error for an unreadable file and a serialization or
    /// config error for invalid contents.
    pub fn load(&self) -> Result<RootConfig> {
        let config = match &self.path {
            Some(path) if path.exists() => {
                tracing::debug!("[Config] Loading {}", path.display());
                let content = std::fs::read_to_string(path)?;
                RootConfig::from_toml_str(&content)?
            }
            Some(path) => {
                tracing::debug!("[Config] {} not found; using defaults", path.display());
                RootConfig::default()
            }
            None => RootConfig::default(),
        };
        let config = Self::apply_env(config);
        config.validate()?;
        Ok(config)
    }

    /// Writes `config` to the config file, creating parent directories.
    pub fn save(&self, config: &RootConfig) -> Result<()> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| SousError::config("no config file location is available"))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, config.to_toml_string()?)?;
        self.invalidate_cache();
        Ok(())
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = None;
    }

    fn apply_env(mut config: RootConfig) -> RootConfig {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                config.backend.base_url = url.trim().to_string();
            }
        }
        config
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
