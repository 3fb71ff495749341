//! Remote responder: turns a user utterance into a reply
//!
//! The responder is a black box behind a single request/response exchange.
//! Implementations report every failure as an `Err`; the session manager
//! decides what the user sees.

pub mod http;

pub use http::HttpResponder;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound exchange body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user's utterance
    pub message: String,
    pub session_id: String,
    /// Client-side send time
    pub timestamp: DateTime<Utc>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: session_id.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Parsed responder body: `{ response?, message? }`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub response: Option<String>,
    pub message: Option<String>,
}

impl ChatReply {
    /// Build a reply from a decoded JSON body
    ///
    /// Only objects are accepted. Non-string or empty fields count as absent.
    pub fn from_value(value: &Value) -> crate::Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            crate::Error::Responder(format!("expected a JSON object, got {}", kind_of(value)))
        })?;

        let text_field = |name: &str| {
            object
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Ok(Self {
            response: text_field("response"),
            message: text_field("message"),
        })
    }

    /// The textual reply, `response` taking precedence over `message`
    pub fn text(&self) -> Option<&str> {
        self.response.as_deref().or(self.message.as_deref())
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A remote service that answers chat messages
#[async_trait]
pub trait Responder: Send + Sync {
    /// Perform exactly one exchange; no retries
    async fn exchange(&self, request: &ChatRequest) -> crate::Result<ChatReply>;
}
