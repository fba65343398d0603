// HTTP agent runtime client (direct, no SDK)

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use crate::streaming::{parse_fragment_stream, FragmentStream};
use crate::types::{AgentRuntime, CompletionRequest};

/// Chat-completions client against an OpenAI-style endpoint
pub struct AssistantClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl AssistantClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    fn build_payload(&self, request: &CompletionRequest, stream: bool) -> Result<Value> {
        let mut payload = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "stream": stream,
        });

        if let Some(temperature) = request.temperature {
            payload
                .as_object_mut()
                .context("payload is not an object")?
                .insert("temperature".to_string(), serde_json::json!(temperature));
        }

        Ok(payload)
    }
}

#[async_trait]
impl AgentRuntime for AssistantClient {
    async fn ping(&self) -> Result<()> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .context("Agent runtime unreachable")?;

        if !response.status().is_success() {
            anyhow::bail!("Agent runtime rejected credentials: {}", response.status());
        }

        Ok(())
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = self.build_payload(&request, false)?;

        let response = self
            .http_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Completion request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Completion failed with {}: {}", status, body);
        }

        let body: Value = response.json().await.context("Invalid completion response")?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .context("Completion response missing content")?
            .to_string();

        Ok(content)
    }

    async fn complete_stream(&self, request: CompletionRequest) -> Result<FragmentStream> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = self.build_payload(&request, true)?;

        let response = self
            .http_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Streaming request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Streaming completion failed with {}: {}", status, body);
        }

        Ok(parse_fragment_stream(response))
    }
}
