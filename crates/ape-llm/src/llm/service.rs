//! Caller-facing LLM service: model selection and generation.

use std::fmt;

use futures::StreamExt;
use serde::Serialize;
use tracing::{error, info, warn};

use super::error::LLMError;
use super::http::HttpBackend;
use super::mock::{MockBackend, is_mock_api_key};
use super::provider::ChatBackend;
use super::registry::{ModelConfig, ModelInfo, ModelRegistry};
use super::stream::error_text;
use super::types::{ChatStream, GenerateOptions, Message, Role, StreamEvent};
use crate::config::Config;

/// Result shape of a failed non-streaming generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResult {
    pub error: String,
}

impl fmt::Display for ErrorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.error)
    }
}

impl std::error::Error for ErrorResult {}

/// Output of [`LlmService::generate`].
pub enum Generation {
    Complete(Result<String, ErrorResult>),
    Stream(ChatStream),
}

/// Dispatches generations to the currently selected model.
pub struct LlmService {
    registry: ModelRegistry,
    current: ModelConfig,
    http: HttpBackend,
    mock: MockBackend,
}

impl LlmService {
    pub fn new(registry: ModelRegistry) -> Result<Self, LLMError> {
        Ok(Self::with_backends(
            registry,
            HttpBackend::new()?,
            MockBackend::default(),
        ))
    }

    pub fn from_config(config: Config) -> Result<Self, LLMError> {
        Self::new(config.into_registry())
    }

    pub fn with_backends(registry: ModelRegistry, http: HttpBackend, mock: MockBackend) -> Self {
        let current = registry.resolve(registry.default_key());
        info!(
            model = %registry.default_key(),
            models = registry.len(),
            "LLM service initialized"
        );

        Self {
            registry,
            current,
            http,
            mock,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Key of the model used for generation.
    pub fn current_model(&self) -> &str {
        &self.current.key
    }

    pub fn current_config(&self) -> &ModelConfig {
        &self.current
    }

    pub fn available_providers(&self) -> Vec<String> {
        self.registry.providers()
    }

    pub fn list_available_models(&self) -> Vec<ModelInfo> {
        self.registry.list()
    }

    /// Switch to another registered model. Unknown keys leave the selection unchanged.
    pub fn change_model(&mut self, key: &str) -> bool {
        let Some(model) = self.registry.get(key) else {
            error!(model = %key, "Model is not available");
            return false;
        };

        self.current = model.clone();
        info!(model = %key, name = %self.current.display_name(), "Model changed");
        true
    }

    pub fn format_message(role: Role, content: impl Into<String>) -> Message {
        Message::new(role, content)
    }

    pub fn format_system_message(content: impl Into<String>) -> Message {
        Message::system(content)
    }

    pub fn format_user_message(content: impl Into<String>) -> Message {
        Message::user(content)
    }

    pub fn format_assistant_message(content: impl Into<String>) -> Message {
        Message::assistant(content)
    }

    fn backend(&self) -> &dyn ChatBackend {
        if is_mock_api_key(&self.current.api_key) {
            info!(
                model = %self.current.key,
                provider = %self.current.provider.as_str(),
                "No API key configured, answering in mock mode"
            );
            &self.mock
        } else {
            &self.http
        }
    }

    /// Generate with the model's default sampling parameters.
    pub async fn generate(&self, messages: &[Message], stream: bool) -> Generation {
        let options = GenerateOptions::default();
        if stream {
            Generation::Stream(self.stream(messages, &options).await)
        } else {
            Generation::Complete(self.complete(messages, &options).await)
        }
    }

    /// Non-streaming generation. Every failure is returned as an [`ErrorResult`].
    pub async fn complete(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<String, ErrorResult> {
        let model = &self.current;
        self.backend()
            .complete(model, messages, options)
            .await
            .map_err(|e| {
                let error = format!("{} model call failed: {e}", model.display_name());
                warn!(model = %model.key, error = %e, "Chat completion failed");
                ErrorResult { error }
            })
    }

    /// Streaming generation. A failure surfaces as a single [`StreamEvent::Error`].
    pub async fn stream(&self, messages: &[Message], options: &GenerateOptions) -> ChatStream {
        let model = &self.current;
        match self.backend().stream(model, messages, options).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(model = %model.key, error = %e, "Streaming chat completion failed");
                let event = StreamEvent::Error(error_text(model.display_name(), e));
                futures::stream::iter([event]).boxed()
            }
        }
    }
}
