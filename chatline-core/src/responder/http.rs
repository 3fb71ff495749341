//! HTTP responder: JSON POST to a configured endpoint

use super::{ChatReply, ChatRequest, Responder};
use crate::config::ResponderConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Posts `ChatRequest`s to a webhook-style endpoint
pub struct HttpResponder {
    client: Client,
    endpoint: String,
}

impl HttpResponder {
    /// Create a responder with default transport settings
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Create a responder from configuration
    pub fn from_config(config: &ResponderConfig) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| crate::Error::Config(format!("header {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| crate::Error::Config(format!("header {}: {}", name, e)))?;
            headers.insert(name, value);
        }

        let mut builder = Client::builder().default_headers(headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Responder for HttpResponder {
    async fn exchange(&self, request: &ChatRequest) -> crate::Result<ChatReply> {
        debug!("POST {} for session {}", self.endpoint, request.session_id);

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(crate::Error::Responder(format!(
                "responder returned {}",
                status
            )));
        }

        let body: serde_json::Value = response.json().await?;
        ChatReply::from_value(&body)
    }
}
