//! Provider variants and the backend trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::LLMError;
use super::registry::ModelConfig;
use super::types::{ChatStream, GenerateOptions, Message};

/// Trait for chat backends (network or canned).
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Make a chat completion request and return the full text.
    async fn complete(
        &self,
        model: &ModelConfig,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<String, LLMError>;

    /// Make a streaming chat completion request.
    async fn stream(
        &self,
        model: &ModelConfig,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<ChatStream, LLMError>;
}

/// The LLM backend variant a model is served by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provider {
    /// OpenRouter-hosted model; selected by `payload.model`.
    OpenRouter,
    /// Internal OpenAI-compatible service, keeping its configured name (e.g. `primary`).
    Standard(String),
}

impl Default for Provider {
    fn default() -> Self {
        Provider::Standard(String::new())
    }
}

impl From<String> for Provider {
    fn from(name: String) -> Self {
        if name.eq_ignore_ascii_case("openrouter") {
            Provider::OpenRouter
        } else {
            Provider::Standard(name)
        }
    }
}

impl From<Provider> for String {
    fn from(provider: Provider) -> Self {
        provider.as_str().to_string()
    }
}

impl Provider {
    pub const OPENROUTER_API_KEY_ENV: &'static str = "OPENROUTER_API_KEY";

    pub fn as_str(&self) -> &str {
        match self {
            Provider::OpenRouter => "openrouter",
            Provider::Standard(name) => name,
        }
    }

    /// Resolve the API key used for a network call.
    ///
    /// OpenRouter falls back to `fallback` (the `OPENROUTER_API_KEY` value) and
    /// fails when both are empty; standard services take the configured key as-is.
    pub fn resolve_api_key(
        &self,
        configured: &str,
        fallback: Option<&str>,
    ) -> Result<String, LLMError> {
        match self {
            Provider::OpenRouter => {
                if !configured.is_empty() {
                    return Ok(configured.to_string());
                }
                match fallback {
                    Some(key) if !key.is_empty() => Ok(key.to_string()),
                    _ => Err(LLMError::Configuration(
                        "OpenRouter API key is not set".to_string(),
                    )),
                }
            }
            Provider::Standard(_) => Ok(configured.to_string()),
        }
    }

    /// Value for `payload.model`.
    pub fn payload_model(&self, model: &ModelConfig) -> Option<String> {
        match self {
            Provider::OpenRouter => Some(model.id.clone()),
            Provider::Standard(_) => model.request_template.payload.model.clone(),
        }
    }

    /// Authorization scheme for the request; OpenRouter always uses bearer.
    pub fn auth_scheme<'a>(&self, model: &'a ModelConfig) -> &'a str {
        match self {
            Provider::OpenRouter => "bearer",
            Provider::Standard(_) => &model.auth_type,
        }
    }

    /// Whether the TLS certificate of the endpoint is verified.
    pub fn verify_tls(&self, model: &ModelConfig) -> bool {
        match self {
            Provider::OpenRouter => true,
            Provider::Standard(_) => model.verify_ssl,
        }
    }
}
