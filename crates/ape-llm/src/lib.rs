//! ape-llm - Template-driven chat completion client for standard and OpenRouter LLM backends.

pub mod config;
pub mod llm;

pub use config::{Config, ConfigError};
pub use llm::{
    ErrorResult, GenerateOptions, Generation, LLMError, LlmService, Message, ModelConfig,
    ModelInfo, ModelRegistry, Provider, Role, StreamEvent,
};
