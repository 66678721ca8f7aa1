//! Built-in model registry, used when no configuration file exists.
//!
//! Internal services read their endpoint, key and limits from `LLM_*` /
//! `LLM_KO_*` variables; OpenRouter models share `OPENROUTER_API_KEY`.

use std::collections::BTreeMap;

use super::env::{env_bool, env_float, env_int, env_parse, env_string};
use crate::llm::{ModelConfig, PayloadTemplate, Provider, RequestTemplate};

pub const DEFAULT_MODEL_KEY: &str = "primary";

const OPENROUTER_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
const OPENROUTER_REFERER: &str = "APE-Core-API";
const OPENROUTER_TITLE: &str = "APE (Agentic Pipeline Engine)";

pub fn default_model_key() -> String {
    env_string("DEFAULT_MODEL", DEFAULT_MODEL_KEY)
}

pub fn builtin_models() -> BTreeMap<String, ModelConfig> {
    BTreeMap::from([
        (
            "primary".to_string(),
            standard(
                "LLM",
                "기본 LLM 모델",
                "primary-model-v1",
                "기본 LLM 서비스 모델",
                "http://llm-service/api",
            ),
        ),
        (
            "korean".to_string(),
            standard(
                "LLM_KO",
                "한국어 LLM 모델",
                "korean-model-v1",
                "한국어 특화 LLM 서비스 모델",
                "http://llm-ko-service/api",
            ),
        ),
        (
            "openrouter-llama".to_string(),
            openrouter(
                "OpenRouter Llama3",
                "meta/llama-3-70b-instruct",
                "Llama3 70B 모델",
            ),
        ),
        (
            "openrouter-claude".to_string(),
            openrouter(
                "OpenRouter Claude 3",
                "anthropic/claude-3-opus-20240229",
                "OpenRouter를 통한 Claude 3 Opus 모델",
            ),
        ),
        (
            "openrouter-mixtral".to_string(),
            openrouter(
                "OpenRouter Mixtral",
                "mistralai/mixtral-8x7b-instruct",
                "OpenRouter를 통한 Mixtral 8x7B 모델",
            ),
        ),
        (
            "openrouter-qwen".to_string(),
            openrouter(
                "OpenRouter Qwen",
                "qwen/qwen1.5-72b-chat",
                "OpenRouter를 통한 Qwen 1.5 72B 모델",
            ),
        ),
    ])
}

/// Internal service configured from `<prefix>_ENDPOINT`, `<prefix>_API_KEY`, ...
fn standard(
    env_prefix: &str,
    name: &str,
    id: &str,
    description: &str,
    endpoint: &str,
) -> ModelConfig {
    let var = |suffix: &str| format!("{env_prefix}_{suffix}");

    ModelConfig {
        name: name.to_string(),
        id: id.to_string(),
        description: description.to_string(),
        provider: Provider::Standard("primary".to_string()),
        endpoint: env_string(&var("ENDPOINT"), endpoint),
        api_key: env_string(&var("API_KEY"), ""),
        max_tokens: env_int(&var("MAX_TOKENS"), 4096),
        temperature: env_float(&var("TEMPERATURE"), 0.7),
        auth_type: env_string(&var("AUTH_TYPE"), "bearer"),
        verify_ssl: env_bool(&var("VERIFY_SSL"), false),
        timeout_seconds: env_parse(&var("TIMEOUT"), 30),
        request_template: template(id, &[]),
        ..ModelConfig::default()
    }
}

fn openrouter(name: &str, id: &str, description: &str) -> ModelConfig {
    ModelConfig {
        name: name.to_string(),
        id: id.to_string(),
        description: description.to_string(),
        provider: Provider::OpenRouter,
        endpoint: OPENROUTER_ENDPOINT.to_string(),
        api_key: env_string(Provider::OPENROUTER_API_KEY_ENV, ""),
        request_template: template(
            id,
            &[
                ("HTTP-Referer", OPENROUTER_REFERER),
                ("X-Title", OPENROUTER_TITLE),
            ],
        ),
        ..ModelConfig::default()
    }
}

fn template(model_id: &str, extra_headers: &[(&str, &str)]) -> RequestTemplate {
    let mut headers = BTreeMap::from([
        ("Authorization".to_string(), "Bearer ${API_KEY}".to_string()),
        ("Content-Type".to_string(), "application/json".to_string()),
    ]);
    headers.extend(
        extra_headers
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string())),
    );

    RequestTemplate {
        headers,
        payload: PayloadTemplate {
            model: Some(model_id.to_string()),
            ..PayloadTemplate::default()
        },
    }
}
