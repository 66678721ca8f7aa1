//! Common types for LLM chat completions.

use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};

/// A message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Per-call overrides for sampling parameters.
///
/// Unset fields fall back to the model configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerateOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// One step of a streaming generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental text fragment.
    Delta(String),
    /// The call failed; carries a descriptive text prefixed with [`super::ERROR_PREFIX`].
    /// No further events follow.
    Error(String),
    /// The server signalled completion or the body ended.
    Done,
}

impl StreamEvent {
    /// Text a caller would display for this step.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(text) | StreamEvent::Error(text) => Some(text),
            StreamEvent::Done => None,
        }
    }
}

/// A lazy stream of generation steps. Dropping it closes the connection.
pub type ChatStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Non-streaming completion response (OpenAI-compatible format).
///
/// Every level is optional so a missing `choices[0].message.content` path
/// yields an empty string instead of a decode failure.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<CompletionMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionResponse {
    pub(crate) fn into_content(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_string(&Message::system("You are a helpful assistant.")).unwrap();
        assert_eq!(
            json,
            r#"{"role":"system","content":"You are a helpful assistant."}"#
        );
    }

    #[test]
    fn test_message_roles() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
        assert_eq!(
            serde_json::from_str::<Role>("\"assistant\"").unwrap(),
            Role::Assistant
        );
    }

    #[test]
    fn test_completion_response_content() {
        let json = r#"{
            "id": "chatcmpl-123",
            "choices": [
                {
                    "index": 0,
                    "message": {"role": "assistant", "content": "Hello!"},
                    "finish_reason": "stop"
                }
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}
        }"#;

        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_content(), "Hello!");
    }

    #[test]
    fn test_completion_response_missing_paths() {
        for json in [
            r#"{}"#,
            r#"{"choices": []}"#,
            r#"{"choices": [{}]}"#,
            r#"{"choices": [{"message": {}}]}"#,
            r#"{"choices": [{"message": {"content": null}}]}"#,
        ] {
            let response: CompletionResponse = serde_json::from_str(json).unwrap();
            assert_eq!(response.into_content(), "", "input: {json}");
        }
    }

    #[test]
    fn test_stream_event_text() {
        assert_eq!(StreamEvent::Delta("Hi".into()).text(), Some("Hi"));
        assert_eq!(StreamEvent::Error("오류: x".into()).text(), Some("오류: x"));
        assert_eq!(StreamEvent::Done.text(), None);
    }
}
