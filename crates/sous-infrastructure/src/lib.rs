//! Infrastructure layer for Sous Chef.
//!
//! - `paths`: platform config locations (`SousPaths`)
//! - `config_service`: cached loading of `config.toml` (`ConfigService`)

pub mod config_service;
pub mod paths;

pub use config_service::{BACKEND_URL_ENV, ConfigService};
pub use paths::{PathError, SousPaths};
