//! Declarative request templates.
//!
//! A template carries the provider's static headers and payload fields. Header
//! values may reference a fixed set of placeholders which are substituted at
//! request-build time; the stored template itself is never modified.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Payload fields that are always overwritten with per-call values.
const CALL_FIELDS: [&str; 4] = ["messages", "temperature", "max_tokens", "stream"];

/// Headers and payload skeleton for one model.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RequestTemplate {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub payload: PayloadTemplate,
}

/// Static payload fields.
///
/// `model` is typed because providers differ in how they treat it; everything
/// else is forwarded as-is, except the per-call fields which are dropped.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PayloadTemplate {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PayloadTemplate {
    /// Pass-through fields, excluding the ones rebuilt on every call.
    pub(crate) fn static_fields(&self) -> Map<String, Value> {
        self.extra
            .iter()
            .filter(|(name, _)| !CALL_FIELDS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Runtime variables a header value may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `${API_KEY}`
    ApiKey,
    /// `${REQUEST_ID}`
    RequestId,
}

impl Placeholder {
    pub const ALL: [Placeholder; 2] = [Placeholder::ApiKey, Placeholder::RequestId];

    pub fn token(self) -> &'static str {
        match self {
            Placeholder::ApiKey => "${API_KEY}",
            Placeholder::RequestId => "${REQUEST_ID}",
        }
    }
}

/// Resolved values for every [`Placeholder`].
pub(crate) struct Substitutions<'a> {
    pub api_key: &'a str,
    pub request_id: &'a str,
}

impl Substitutions<'_> {
    fn value(&self, placeholder: Placeholder) -> &str {
        match placeholder {
            Placeholder::ApiKey => self.api_key,
            Placeholder::RequestId => self.request_id,
        }
    }

    pub(crate) fn apply(&self, input: &str) -> String {
        Placeholder::ALL
            .iter()
            .fold(input.to_string(), |acc, placeholder| {
                acc.replace(placeholder.token(), self.value(*placeholder))
            })
    }
}

impl RequestTemplate {
    /// Copy of the template headers with placeholders substituted.
    pub(crate) fn render_headers(&self, subs: &Substitutions<'_>) -> BTreeMap<String, String> {
        self.headers
            .iter()
            .map(|(name, value)| (name.clone(), subs.apply(value)))
            .collect()
    }
}
