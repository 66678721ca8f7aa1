//! LLM client: model registry, request templating, dispatch and stream decoding.

mod error;
mod http;
mod mock;
mod provider;
mod registry;
mod request;
mod service;
mod stream;
mod template;
mod types;

pub use error::{DecodeError, LLMError};
pub use http::HttpBackend;
pub use mock::{MockBackend, is_mock_api_key};
pub use provider::{ChatBackend, Provider};
pub use registry::{ModelConfig, ModelInfo, ModelRegistry};
pub use request::{BuiltRequest, ChatPayload, build_request, normalize_endpoint};
pub use service::{ErrorResult, Generation, LlmService};
pub use stream::{ChunkStream, ERROR_PREFIX, LineEvent, decode_line};
pub use template::{PayloadTemplate, Placeholder, RequestTemplate};
pub use types::{ChatStream, GenerateOptions, Message, Role, StreamEvent};
