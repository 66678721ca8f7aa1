//! Typed environment variable readers.
//!
//! Every reader falls back to its default when the variable is absent or does
//! not parse.

use std::str::FromStr;

pub fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub fn env_int(key: &str, default: u32) -> u32 {
    env_parse(key, default)
}

pub fn env_float(key: &str, default: f32) -> f32 {
    env_parse(key, default)
}

pub fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| parse_bool(&v))
        .unwrap_or(default)
}

/// Comma-separated list; an unset or empty variable yields `default`.
pub fn env_list(key: &str, default: Vec<String>) -> Vec<String> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => parse_list(&value),
        _ => default,
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value.split(',').map(|item| item.trim().to_string()).collect()
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "y" | "t"
    )
}

/// Expand a whole-string `${NAME}` or `${NAME:default}` reference from the environment.
pub fn expand(value: &str) -> String {
    expand_with(value, |key| std::env::var(key).ok())
}

/// Like [`expand`], resolving names through `lookup`.
///
/// Values that are not a single reference are returned unchanged.
pub fn expand_with(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let Some(reference) = value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    else {
        return value.to_string();
    };

    let (name, default) = match reference.split_once(':') {
        Some((name, default)) => (name, default),
        None => (reference, ""),
    };
    lookup(name).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNSET: &str = "APE_LLM_TEST_SURELY_UNSET_VARIABLE";

    fn lookup(key: &str) -> Option<String> {
        match key {
            "LLM_ENDPOINT" => Some("http://from-env/api".to_string()),
            _ => None,
        }
    }

    #[test]
    fn expand_reference_with_value() {
        assert_eq!(
            expand_with("${LLM_ENDPOINT}", lookup),
            "http://from-env/api"
        );
        assert_eq!(
            expand_with("${LLM_ENDPOINT:http://default/api}", lookup),
            "http://from-env/api"
        );
    }

    #[test]
    fn expand_reference_with_default() {
        assert_eq!(
            expand_with("${LLM_KO_ENDPOINT:http://llm-ko-service/api}", lookup),
            "http://llm-ko-service/api"
        );
        assert_eq!(expand_with("${LLM_API_KEY}", lookup), "");
    }

    #[test]
    fn expand_leaves_plain_and_embedded_values() {
        assert_eq!(expand_with("http://plain/api", lookup), "http://plain/api");
        assert_eq!(
            expand_with("Bearer ${API_KEY}", lookup),
            "Bearer ${API_KEY}"
        );
    }

    #[test]
    fn bool_values() {
        for v in ["true", "1", "yes", "y", "t", "TRUE", " Yes "] {
            assert!(parse_bool(v), "{v}");
        }
        for v in ["false", "0", "no", "", "maybe"] {
            assert!(!parse_bool(v), "{v}");
        }
    }

    #[test]
    fn unset_variables_use_defaults() {
        assert_eq!(env_string(UNSET, "fallback"), "fallback");
        assert_eq!(env_int(UNSET, 4096), 4096);
        assert_eq!(env_float(UNSET, 0.7), 0.7);
        assert!(env_bool(UNSET, true));
        assert_eq!(expand(&format!("${{{UNSET}:dflt}}")), "dflt");
        assert_eq!(
            env_list(UNSET, vec!["primary".to_string()]),
            vec!["primary".to_string()]
        );
    }

    #[test]
    fn list_values_are_split_and_trimmed() {
        assert_eq!(
            parse_list("primary, korean ,openrouter-llama"),
            vec!["primary", "korean", "openrouter-llama"]
        );
        assert_eq!(parse_list("single"), vec!["single"]);
    }
}
