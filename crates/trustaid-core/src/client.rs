use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, ChatResult};
use crate::payload::Payload;
use crate::pipeline::Pipeline;

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    force_kind: Option<&'static str>,
}

/// Backend liveness as reported by `GET /health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Health {
    pub ok: bool,
    #[serde(default)]
    pub demo: bool,
}

/// HTTP client for the chat backend.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one query. Any non-2xx status or non-object body is a failure.
    pub async fn query(&self, query: &str, pipeline: Pipeline) -> ChatResult<Payload> {
        let url = format!("{}/chat/query", self.base_url);

        let request = QueryRequest {
            query,
            force_kind: pipeline.force_kind(),
        };

        tracing::debug!(%url, force_kind = ?request.force_kind, "sending chat query");
        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let payload = Payload::from_json(&body)?;
        tracing::info!(kind = payload.kind(), audit_id = ?payload.audit_id(), "chat query answered");
        Ok(payload)
    }

    pub async fn health(&self) -> ChatResult<Health> {
        let url = format!("{}/health", self.base_url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ChatError::MalformedBody(e.to_string()))
    }
}
