//! Reference image lookup

use crate::error::NoteError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

/// Finds one image URL for a query
#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// `Ok(None)` when the search ran but found nothing
    async fn search(&self, query: &str) -> Result<Option<String>, NoteError>;
}

/// Serper.dev image search
pub struct SerperImageSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl SerperImageSearch {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self, NoteError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NoteError::ImageSearch(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

/// `images[0].imageUrl` of a Serper response
pub fn first_image_url(body: &Value) -> Option<String> {
    body.pointer("/images/0/imageUrl")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl ImageSearch for SerperImageSearch {
    async fn search(&self, query: &str) -> Result<Option<String>, NoteError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&json!({ "q": query, "num": 1 }))
            .send()
            .await
            .map_err(|e| NoteError::ImageSearch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NoteError::ImageSearch(format!("HTTP {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| NoteError::ImageSearch(e.to_string()))?;
        Ok(first_image_url(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_image_url() {
        let body = json!({
            "searchParameters": {"q": "gut health"},
            "images": [
                {"title": "Gut", "imageUrl": "https://img.example/gut.jpg"},
                {"title": "Other", "imageUrl": "https://img.example/other.jpg"}
            ]
        });
        assert_eq!(first_image_url(&body).as_deref(), Some("https://img.example/gut.jpg"));
    }

    #[test]
    fn test_first_image_url_missing() {
        assert_eq!(first_image_url(&json!({"images": []})), None);
        assert_eq!(first_image_url(&json!({"message": "Unauthorized"})), None);
        assert_eq!(first_image_url(&json!({"images": [{"imageUrl": ""}]})), None);
    }
}
