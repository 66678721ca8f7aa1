//! Model registry: static key → model configuration mapping.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::provider::Provider;
use super::template::RequestTemplate;

/// Configuration for one selectable model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelConfig {
    /// Registry key; filled in from the map key when the registry is built.
    #[serde(skip)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    /// Provider-side model identifier.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default, alias = "apiKey")]
    pub api_key: String,
    #[serde(default = "default_max_tokens", alias = "maxTokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Authorization scheme; anything but `bearer` rewrites the `Authorization` header.
    #[serde(default = "default_auth_type")]
    pub auth_type: String,
    #[serde(default)]
    pub verify_ssl: bool,
    #[serde(default = "default_timeout", alias = "timeout")]
    pub timeout_seconds: u64,
    #[serde(default, alias = "requestTemplate")]
    pub request_template: RequestTemplate,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            name: String::new(),
            id: String::new(),
            description: String::new(),
            provider: Provider::default(),
            endpoint: String::new(),
            api_key: String::new(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            auth_type: default_auth_type(),
            verify_ssl: false,
            timeout_seconds: default_timeout(),
            request_template: RequestTemplate::default(),
        }
    }
}

impl ModelConfig {
    /// Human-readable name, falling back to the registry key.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.key
        } else {
            &self.name
        }
    }
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

fn default_auth_type() -> String {
    "bearer".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Listing entry for one registered model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub key: String,
    pub name: String,
    pub provider: String,
    pub description: String,
    pub id: String,
}

/// Registry of model configurations, keyed by model key.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, ModelConfig>,
    default_key: String,
}

impl ModelRegistry {
    pub fn new(models: BTreeMap<String, ModelConfig>, default_key: impl Into<String>) -> Self {
        let models = models
            .into_iter()
            .map(|(key, mut model)| {
                model.key = key.clone();
                (key, model)
            })
            .collect();

        Self {
            models,
            default_key: default_key.into(),
        }
    }

    /// Resolve a model key, falling back to the default model and then to an
    /// empty configuration. Never fails.
    pub fn resolve(&self, key: &str) -> ModelConfig {
        if let Some(model) = self.models.get(key) {
            return model.clone();
        }

        warn!(
            model = %key,
            default = %self.default_key,
            "Unknown model key, using default model"
        );
        match self.models.get(&self.default_key) {
            Some(model) => model.clone(),
            None => {
                warn!(default = %self.default_key, "Default model is not registered either");
                ModelConfig::default()
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&ModelConfig> {
        self.models.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.models.contains_key(key)
    }

    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn list(&self) -> Vec<ModelInfo> {
        self.models
            .values()
            .map(|model| ModelInfo {
                key: model.key.clone(),
                name: model.display_name().to_string(),
                provider: model.provider.as_str().to_string(),
                description: model.description.clone(),
                id: if model.id.is_empty() {
                    model.key.clone()
                } else {
                    model.id.clone()
                },
            })
            .collect()
    }

    /// Distinct provider names across all registered models.
    pub fn providers(&self) -> Vec<String> {
        self.models
            .values()
            .map(|model| model.provider.as_str())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
