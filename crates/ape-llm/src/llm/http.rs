//! Network backend: sends templated chat completion requests over HTTP.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use super::error::{DecodeError, LLMError};
use super::provider::{ChatBackend, Provider};
use super::registry::ModelConfig;
use super::request::build_request;
use super::stream::ChunkStream;
use super::types::{ChatStream, CompletionResponse, GenerateOptions, Message};

/// OpenAI-compatible HTTP backend shared by every provider variant.
pub struct HttpBackend {
    verified: Client,
    unverified: Client,
    /// `OPENROUTER_API_KEY` captured at construction.
    openrouter_key: Option<String>,
}

impl HttpBackend {
    /// Build the backend, reading the OpenRouter key fallback from the environment.
    pub fn new() -> Result<Self, LLMError> {
        Self::with_openrouter_key(std::env::var(Provider::OPENROUTER_API_KEY_ENV).ok())
    }

    pub fn with_openrouter_key(openrouter_key: Option<String>) -> Result<Self, LLMError> {
        Ok(Self {
            verified: Client::builder().build()?,
            unverified: Client::builder()
                .danger_accept_invalid_certs(true)
                .build()?,
            openrouter_key,
        })
    }

    fn client_for(&self, model: &ModelConfig) -> &Client {
        if model.provider.verify_tls(model) {
            &self.verified
        } else {
            &self.unverified
        }
    }

    /// Build and send the request, returning the successful response.
    async fn send(
        &self,
        model: &ModelConfig,
        messages: &[Message],
        options: &GenerateOptions,
        stream: bool,
    ) -> Result<reqwest::Response, LLMError> {
        let api_key = model
            .provider
            .resolve_api_key(&model.api_key, self.openrouter_key.as_deref())?;
        let built = build_request(model, messages, options, stream, &api_key)?;
        let headers = header_map(&built.headers)?;
        let timeout = Duration::from_secs(model.timeout_seconds);

        debug!(
            model = %model.key,
            provider = %model.provider.as_str(),
            request_id = %built.request_id,
            url = %built.url,
            stream,
            "Sending chat completion request"
        );

        let request = self
            .client_for(model)
            .post(&built.url)
            .headers(headers)
            .json(&built.payload);

        let response = if stream {
            // Only the wait for response headers is bounded; the body may stream indefinitely.
            tokio::time::timeout(timeout, request.send())
                .await
                .map_err(|_| LLMError::Timeout(model.timeout_seconds))??
        } else {
            request.timeout(timeout).send().await?
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(LLMError::Api { status, message });
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn complete(
        &self,
        model: &ModelConfig,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<String, LLMError> {
        let response = self.send(model, messages, options, false).await?;
        let body = response.bytes().await?;
        let parsed: CompletionResponse =
            serde_json::from_slice(&body).map_err(DecodeError::from)?;
        Ok(parsed.into_content())
    }

    async fn stream(
        &self,
        model: &ModelConfig,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<ChatStream, LLMError> {
        let response = self.send(model, messages, options, true).await?;
        let byte_stream = Box::pin(response.bytes_stream());
        let event_stream = ChunkStream::new(byte_stream, model.display_name());

        Ok(Box::pin(event_stream))
    }
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, LLMError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            LLMError::Configuration(format!("invalid header name '{name}': {e}"))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            LLMError::Configuration(format!("invalid value for header '{name}': {e}"))
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}
