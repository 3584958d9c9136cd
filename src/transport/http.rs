//! reqwest-backed remote API client.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::ApiConfig;

use super::{HttpMethod, RemoteApi, RemoteRequest, SendError};

/// Remote API client over HTTP.
pub struct HttpRemoteApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteApi {
    /// Build a client from API settings.
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_seconds))
                .build()
                .expect("Failed to build reqwest client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl RemoteApi for HttpRemoteApi {
    async fn execute(&self, request: RemoteRequest) -> Result<(), SendError> {
        let url = self.endpoint(&request.path);

        let builder = match request.method {
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
        };

        let response = builder
            .json(&request.body)
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(method = %request.method, url = %url, status = status.as_u16(), "Remote call succeeded");
            return Ok(());
        }

        // Prefer the server's own failure reason when the body carries one
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| {
                body.get("message")
                    .and_then(|message| message.as_str())
                    .map(String::from)
            })
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        Err(SendError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}
