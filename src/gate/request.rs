//! Request descriptor supplied by the caller, and its normalization.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::GateResult;
use crate::security::threat::ScanInput;

/// Request payload as the caller received it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RequestBody {
    Text(String),
    Json(serde_json::Value),
    /// Raw bytes; must be valid UTF-8 to be scanned.
    Bytes(Vec<u8>),
}

impl RequestBody {
    /// Body as text. Structured bodies are serialized to compact JSON.
    pub fn as_text(&self) -> GateResult<Cow<'_, str>> {
        Ok(match self {
            RequestBody::Text(text) => Cow::Borrowed(text.as_str()),
            RequestBody::Json(value) => Cow::Owned(value.to_string()),
            RequestBody::Bytes(bytes) => Cow::Borrowed(std::str::from_utf8(bytes)?),
        })
    }
}

/// Everything the gate looks at for one inbound request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RequestDescriptor {
    /// Caller identity, e.g. the client address.
    pub identity: String,

    /// Raw path and query.
    pub url: String,

    /// Header name/value pairs in arrival order.
    #[serde(default)]
    pub headers: Vec<(String, String)>,

    #[serde(default)]
    pub body: Option<RequestBody>,

    /// Limiter class; the configured default applies when `None`.
    #[serde(default)]
    pub limiter_class: Option<String>,
}

impl RequestDescriptor {
    pub fn new(identity: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_limiter_class(mut self, class: impl Into<String>) -> Self {
        self.limiter_class = Some(class.into());
        self
    }

    /// First `user-agent` header value, matched case-insensitively.
    pub fn user_agent(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("user-agent"))
            .map(|(_, value)| value.as_str())
    }

    /// Lowercased view of the request for threat scanning.
    ///
    /// Fails when the body is raw bytes that are not UTF-8.
    pub fn normalize(&self) -> GateResult<ScanInput> {
        let url = self.url.to_lowercase();
        let decoded_url = percent_decode(&url).filter(|decoded| *decoded != url);

        let headers = self
            .headers
            .iter()
            .map(|(name, value)| (name.to_lowercase(), value.to_lowercase()))
            .collect();

        let body = match &self.body {
            Some(body) => Some(body.as_text()?.to_lowercase()),
            None => None,
        };
        let decoded_body = body
            .as_deref()
            .and_then(|body| percent_decode(body).filter(|decoded| decoded != body));

        Ok(ScanInput {
            url,
            decoded_url,
            headers,
            user_agent: self.user_agent().map(str::to_lowercase),
            body,
            decoded_body,
        })
    }
}

/// Percent- and plus-decode a URL or form body, keeping `&` and `=` separators.
fn percent_decode(url: &str) -> Option<String> {
    if !url.contains('%') && !url.contains('+') {
        return None;
    }

    let decoded = form_urlencoded::parse(url.as_bytes())
        .map(|(key, value)| {
            if value.is_empty() {
                key.into_owned()
            } else {
                format!("{}={}", key, value)
            }
        })
        .collect::<Vec<_>>()
        .join("&");

    Some(decoded.to_lowercase())
}
