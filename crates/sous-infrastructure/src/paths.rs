//! Path management for sous-chef configuration files.

use std::path::PathBuf;

const APP_DIR: &str = "sous-chef";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// The platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find the config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolves sous-chef locations under the platform config directory.
///
/// ```text
/// ~/.config/sous-chef/
/// └── config.toml
/// ```
pub struct SousPaths;

impl SousPaths {
    /// Returns the sous-chef config directory (e.g. `~/.config/sous-chef/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}
