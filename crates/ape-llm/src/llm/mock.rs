//! Canned responses used when a model has no usable API key.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use super::error::LLMError;
use super::provider::ChatBackend;
use super::registry::ModelConfig;
use super::types::{ChatStream, GenerateOptions, Message, Role, StreamEvent};

const MOCK_KEY_PREFIX: &str = "mock_";
const PLACEHOLDER_KEY: &str = "your-api-key";
const PRODUCT_KEYWORDS: [&str; 2] = ["APE", "에이전트"];

const PRODUCT_DESCRIPTION: &str = "APE(Agentic Pipeline Engine)는 다양한 LLM 모델과 \
RAG(Retrieval-Augmented Generation) 및 LangGraph 기능을 제공하는 백엔드 서버입니다. \n\n\
주요 기능:\n\
1. 다양한 LLM 모델 연결 (자동 대체 기능 포함)\n\
2. RAG를 통한 문서 검색 및 지식 기반 응답\n\
3. 에이전트 시스템을 통한 다양한 태스크 처리\n\
4. LangGraph를 통한 워크플로우 자동화\n\n\
자세한 내용은 문서를 참조하세요.";

/// Streamed form of [`PRODUCT_DESCRIPTION`].
const PRODUCT_CHUNKS: [&str; 11] = [
    "APE(Agentic Pipeline Engine)는 ",
    "다양한 LLM 모델과 ",
    "RAG(Retrieval-Augmented Generation) 및 ",
    "LangGraph 기능을 제공하는 ",
    "백엔드 서버입니다.\n\n",
    "주요 기능:\n",
    "1. 다양한 LLM 모델 연결 (자동 대체 기능 포함)\n",
    "2. RAG를 통한 문서 검색 및 지식 기반 응답\n",
    "3. 에이전트 시스템을 통한 다양한 태스크 처리\n",
    "4. LangGraph를 통한 워크플로우 자동화\n\n",
    "자세한 내용은 문서를 참조하세요.",
];

/// Whether `api_key` means "no key configured".
pub fn is_mock_api_key(api_key: &str) -> bool {
    api_key.is_empty() || api_key.starts_with(MOCK_KEY_PREFIX) || api_key == PLACEHOLDER_KEY
}

/// Backend answering from canned text without touching the network.
#[derive(Debug, Clone)]
pub struct MockBackend {
    chunk_delay: Duration,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            chunk_delay: Self::DEFAULT_CHUNK_DELAY,
        }
    }
}

impl MockBackend {
    /// Pacing between streamed chunks.
    pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(100);

    pub fn new(chunk_delay: Duration) -> Self {
        Self { chunk_delay }
    }

    /// Full canned response for the conversation.
    pub fn response(messages: &[Message]) -> String {
        if is_product_question(last_user_message(messages)) {
            PRODUCT_DESCRIPTION.to_string()
        } else {
            Self::chunks(messages).concat()
        }
    }

    /// Canned response split into the word groups streamed one by one.
    pub fn chunks(messages: &[Message]) -> Vec<String> {
        let question = last_user_message(messages);
        if is_product_question(question) {
            PRODUCT_CHUNKS.iter().map(|c| c.to_string()).collect()
        } else {
            vec![
                "죄송합니다만, ".to_string(),
                format!("'{question}'에 대한 "),
                "정보를 찾을 수 없습니다. ".to_string(),
                "다른 질문을 해주시겠어요?".to_string(),
            ]
        }
    }
}

fn is_product_question(question: &str) -> bool {
    PRODUCT_KEYWORDS.iter().any(|kw| question.contains(kw))
}

fn last_user_message(messages: &[Message]) -> &str {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn complete(
        &self,
        _model: &ModelConfig,
        messages: &[Message],
        _options: &GenerateOptions,
    ) -> Result<String, LLMError> {
        Ok(Self::response(messages))
    }

    async fn stream(
        &self,
        _model: &ModelConfig,
        messages: &[Message],
        _options: &GenerateOptions,
    ) -> Result<ChatStream, LLMError> {
        let delay = self.chunk_delay;
        let deltas = futures::stream::iter(Self::chunks(messages)).then(move |chunk| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            StreamEvent::Delta(chunk)
        });
        let done = futures::stream::once(async { StreamEvent::Done });

        Ok(Box::pin(deltas.chain(done)))
    }
}
