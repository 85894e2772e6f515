//! HTTP AI responder.
//!
//! Talks to the external text-completion service over plain
//! request/response JSON. The coordinator wraps every call in its own
//! timeout; the client timeout here is a second line of defense.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use huddle_core::channel::AiContext;
use huddle_core::error::{HuddleError, Result};
use huddle_core::notify::AiResponder;

pub struct HttpAiResponder {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    text: String,
}

impl HttpAiResponder {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| HuddleError::external_sink("ai", e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn post(&self, path: &str, body: Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .map_err(|e| HuddleError::external_sink("ai", e.to_string()))?;
        if !response.status().is_success() {
            return Err(HuddleError::external_sink(
                "ai",
                format!("{} returned {}", path, response.status()),
            ));
        }
        Ok(response)
    }
}

#[async_trait]
impl AiResponder for HttpAiResponder {
    async fn complete(&self, prompt: &str, context: Option<&AiContext>) -> Result<String> {
        let body = json!({
            "prompt": prompt,
            "context": context,
        });
        let response = self.post("/complete", body).await?;
        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| HuddleError::external_sink("ai", e.to_string()))?;
        Ok(completion.text)
    }

    async fn structured_plan(&self, event_details: &Value) -> Result<Value> {
        let response = self.post("/plan", event_details.clone()).await?;
        response
            .json()
            .await
            .map_err(|e| HuddleError::external_sink("ai", e.to_string()))
    }
}
