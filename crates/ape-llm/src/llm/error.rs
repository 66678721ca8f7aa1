//! LLM error types.

use thiserror::Error;

/// Errors that can occur when making LLM API calls.
#[derive(Debug, Error)]
pub enum LLMError {
    /// Model configuration is unusable for a network call (no endpoint, no key)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// HTTP request failed
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned an error response
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// No response headers within the model's timeout
    #[error("no response within {0}s")]
    Timeout(u64),

    /// Response body could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// A single response body or stream chunk that could not be decoded.
///
/// Inside a stream this is recovered locally: the chunk is logged and skipped.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("chunk is not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("chunk is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}
