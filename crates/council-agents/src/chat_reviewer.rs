//! Chat-completions reviewer.
//!
//! Implements [`ReviewClient`] over any OpenAI-compatible
//! `/chat/completions` endpoint. The persona's directive becomes the system
//! prompt; the engine's round prompt becomes the user message.

use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use council::{Persona, ReviewClient, ReviewError, ReviewVerdict};
use tracing::debug;

use crate::config::EndpointConfig;
use crate::prompts;

/// HTTP reviewer shared by every persona of a council.
pub struct ChatReviewer {
    endpoint: EndpointConfig,
    client: reqwest::Client,
}

impl ChatReviewer {
    pub fn new(endpoint: EndpointConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(endpoint.timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// Request body for one persona review.
    pub fn request_body(&self, persona: &Persona, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.endpoint.model,
            "messages": [
                {"role": "system", "content": prompts::system_prompt(persona)},
                {"role": "user", "content": prompt}
            ],
            "max_tokens": 1024,
            "temperature": self.endpoint.temperature
        })
    }

    /// Parse the assistant text into a verdict, honouring strict mode.
    pub fn parse_content(&self, content: &str) -> Result<ReviewVerdict, ReviewError> {
        if self.endpoint.strict_parse {
            ReviewVerdict::parse_strict(content)
        } else {
            Ok(ReviewVerdict::parse(content))
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> ReviewError {
        if e.is_timeout() {
            ReviewError::Timeout(self.endpoint.timeout)
        } else {
            ReviewError::RequestFailed(e.to_string())
        }
    }
}

/// Assistant text from a chat completions response.
pub fn extract_content(resp_json: &serde_json::Value) -> Result<String, ReviewError> {
    resp_json["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| {
            ReviewError::MalformedResponse("missing choices[0].message.content".to_string())
        })
}

#[async_trait]
impl ReviewClient for ChatReviewer {
    async fn review(&self, persona: &Persona, prompt: &str) -> Result<ReviewVerdict, ReviewError> {
        let start = Instant::now();
        let url = format!("{}/chat/completions", self.endpoint.url.trim_end_matches('/'));

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&self.request_body(persona, prompt));
        if let Some(ref key) = self.endpoint.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ReviewError::RequestFailed(format!(
                "chat completions error ({}): {}",
                status, body
            )));
        }

        let resp_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ReviewError::MalformedResponse(e.to_string()))?;

        let content = extract_content(&resp_json)?;
        debug!(
            persona = %persona.slug,
            model = %self.endpoint.model,
            response_time_ms = start.elapsed().as_millis() as u64,
            "Review response received"
        );

        self.parse_content(&content)
    }
}
