//! OpenAI-compatible `/chat/completions` client (Groq by default)

use crate::types::{ChatModel, ChatRequest, LlmError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

const PREVIEW_CHARS: usize = 300;

pub struct OpenAiCompatClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::Other(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

pub(crate) fn build_body(request: &ChatRequest) -> Value {
    let mut body = json!({
        "model": request.model,
        "messages": request.messages,
    });
    if let Some(t) = request.temperature {
        body["temperature"] = json!(t);
    }
    if let Some(m) = request.max_tokens {
        body["max_tokens"] = json!(m);
    }
    if request.json_mode {
        body["response_format"] = json!({"type": "json_object"});
    }
    body
}

fn preview(body: &str) -> String {
    body.trim().chars().take(PREVIEW_CHARS).collect()
}

/// Pull `choices[0].message.content` out of a raw response body
pub(crate) fn parse_reply(endpoint: &str, status: u16, body: &str) -> Result<String, LlmError> {
    if !(200..300).contains(&status) {
        return Err(LlmError::Status {
            endpoint: endpoint.to_string(),
            status,
            preview: preview(body),
        });
    }

    // Gateways sometimes answer 200 with an HTML error page
    let trimmed = body.trim_start();
    if trimmed.starts_with('<') {
        return Err(LlmError::NotJson {
            endpoint: endpoint.to_string(),
            preview: preview(body),
        });
    }

    let value: Value = serde_json::from_str(trimmed).map_err(|_| LlmError::NotJson {
        endpoint: endpoint.to_string(),
        preview: preview(body),
    })?;

    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|s| !s.trim().is_empty())
        .ok_or(LlmError::EmptyReply)
}

#[async_trait]
impl ChatModel for OpenAiCompatClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        let endpoint = self.endpoint();
        let body = build_body(&request);

        tracing::debug!(model = %request.model, turns = request.messages.len(), "chat completion");

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| LlmError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|source| LlmError::Http {
            endpoint: endpoint.clone(),
            source,
        })?;

        parse_reply(&endpoint, status, &text)
    }
}
