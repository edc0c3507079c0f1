use serde::{Deserialize, Serialize};

use crate::error::{Result, SousError};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RootConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RootConfig {
    /// Parses a TOML document; missing tables fall back to defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.backend.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SousError::config(format!(
                "backend.base_url must start with http:// or https:// (got '{}')",
                self.backend.base_url
            )));
        }
        Ok(())
    }
}

/// Backend location and endpoint paths.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub generate_options_path: String,
    pub recipe_detail_path: String,
    pub explain_step_path: String,
    pub chat_path: String,
    pub profile_data_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            generate_options_path: "/api/generate-options".to_string(),
            recipe_detail_path: "/api/get-recipe-detail".to_string(),
            explain_step_path: "/api/explain-step".to_string(),
            chat_path: "/api/chat".to_string(),
            profile_data_path: "/api/get-all-data".to_string(),
        }
    }
}

impl BackendConfig {
    /// Joins `base_url` and an endpoint path with exactly one slash.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}
