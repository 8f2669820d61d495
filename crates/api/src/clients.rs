//! HTTP-backed collaborators used when the matching base URL is configured.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use companion_agents::{hotels_from_value, HotelCatalog, LlmClient, PaymentGateway};
use companion_core::{Hotel, PaymentOrder};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::LlmConfig;

const STUDY_SYSTEM_PROMPT: &str = "You are a friendly companion for students. Give short, practical answers about studying, careers, wellbeing and travel.";

#[derive(Clone)]
pub struct HttpHotelCatalog {
    client: Client,
    base_url: String,
}

impl HttpHotelCatalog {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl HotelCatalog for HttpHotelCatalog {
    async fn hotels_in(&self, city: &str) -> Result<Vec<Hotel>> {
        let response = self
            .client
            .get(format!("{}/hotels", self.base_url))
            .query(&[("city", city)])
            .send()
            .await
            .context("hotel listing request failed")?;

        if !response.status().is_success() {
            bail!("hotel listing returned {}", response.status());
        }

        // a body that is not JSON at all counts as an empty listing too
        let payload = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok(hotels_from_value(&payload))
    }
}

#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
}

impl HttpPaymentGateway {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_order(&self, amount: u64) -> Result<PaymentOrder> {
        let response = self
            .client
            .post(format!("{}/payment/create-order", self.base_url))
            .json(&json!({ "amount": amount }))
            .send()
            .await
            .context("payment order request failed")?;

        if !response.status().is_success() {
            bail!("Failed to create order ({})", response.status());
        }

        response
            .json::<PaymentOrder>()
            .await
            .context("payment order response was malformed")
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Chat-completions client for any OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct ChatCompletionsLlm {
    client: Client,
    config: LlmConfig,
}

impl ChatCompletionsLlm {
    pub fn new(client: Client, config: LlmConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "model": self.config.model,
                "messages": [
                    { "role": "system", "content": STUDY_SYSTEM_PROMPT },
                    { "role": "user", "content": prompt }
                ]
            }))
            .send()
            .await
            .context("llm request failed")?;

        if !response.status().is_success() {
            bail!("llm returned {}", response.status());
        }

        let payload = response
            .json::<CompletionResponse>()
            .await
            .context("llm response was malformed")?;

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| anyhow!("llm returned no content"))
    }
}
