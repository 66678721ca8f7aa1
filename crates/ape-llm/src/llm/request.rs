//! Request building: template + messages → URL, headers, JSON payload.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use super::error::LLMError;
use super::registry::ModelConfig;
use super::template::Substitutions;
use super::types::{GenerateOptions, Message};

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// A fully rendered chat completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub payload: ChatPayload,
    /// Identifier generated for this call; substituted for `${REQUEST_ID}`.
    pub request_id: String,
}

/// JSON body of a chat completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Build the request for one call.
///
/// `api_key` is the already-resolved key (see [`super::Provider::resolve_api_key`]).
pub fn build_request(
    model: &ModelConfig,
    messages: &[Message],
    options: &GenerateOptions,
    stream: bool,
    api_key: &str,
) -> Result<BuiltRequest, LLMError> {
    if model.endpoint.is_empty() {
        return Err(LLMError::Configuration(format!(
            "no endpoint configured for model '{}'",
            model.display_name()
        )));
    }

    let request_id = ulid::Ulid::new().to_string();
    let subs = Substitutions {
        api_key,
        request_id: &request_id,
    };

    let template = &model.request_template;
    let mut headers = template.render_headers(&subs);
    apply_auth_scheme(&mut headers, model.provider.auth_scheme(model), api_key);

    let payload = ChatPayload {
        model: model.provider.payload_model(model),
        messages: messages.to_vec(),
        temperature: options.temperature.unwrap_or(model.temperature),
        max_tokens: options.max_tokens.unwrap_or(model.max_tokens),
        stream,
        extra: template.payload.static_fields(),
    };

    Ok(BuiltRequest {
        url: normalize_endpoint(&model.endpoint),
        headers,
        payload,
        request_id,
    })
}

/// Append the chat-completions path unless the endpoint already ends with it.
pub fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.ends_with(CHAT_COMPLETIONS_PATH) {
        endpoint.to_string()
    } else {
        format!("{}{}", endpoint.trim_end_matches('/'), CHAT_COMPLETIONS_PATH)
    }
}

/// Rewrite an existing `Authorization` header for non-bearer schemes.
fn apply_auth_scheme(headers: &mut BTreeMap<String, String>, auth_type: &str, api_key: &str) {
    if auth_type.eq_ignore_ascii_case("bearer") {
        return;
    }
    if let Some(value) = headers
        .iter_mut()
        .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
        .map(|(_, value)| value)
    {
        *value = format!("{} {}", capitalize(auth_type), api_key);
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
