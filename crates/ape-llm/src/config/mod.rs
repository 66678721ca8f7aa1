//! Model configuration loading.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::llm::{ModelConfig, ModelRegistry};

mod builtin;
pub mod env;

pub use builtin::{DEFAULT_MODEL_KEY, builtin_models};

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "builtin::default_model_key", alias = "defaultModel")]
    pub default_model: String,
    #[serde(default)]
    pub models: BTreeMap<String, ModelConfig>,
}

impl Config {
    /// Configuration used when no file is present.
    pub fn builtin() -> Self {
        Self {
            default_model: builtin::default_model_key(),
            models: builtin_models(),
        }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "Config file not found, using built-in models");
                return Ok(Self::builtin());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let config = Self::from_yaml(&contents)?;
        info!(path = %path.display(), models = config.models.len(), "Config loaded");
        Ok(config)
    }

    /// Parse YAML and expand `${NAME[:default]}` references in the default
    /// model key and in each model's endpoint and API key.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_saphyr::from_str(contents)?;
        config.default_model = env::expand(&config.default_model);
        for model in config.models.values_mut() {
            model.endpoint = env::expand(&model.endpoint);
            model.api_key = env::expand(&model.api_key);
        }
        Ok(config)
    }

    pub fn into_registry(self) -> ModelRegistry {
        ModelRegistry::new(self.models, self.default_model)
    }
}

// ============================================================================
// ConfigError
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),
}

// ============================================================================
// Tests
// ============================================================================
