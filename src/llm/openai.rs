use async_trait::async_trait;
use log::{error, info};
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};

use super::{ChatGateway, GatewayError, GatewayMessage};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 800;

/// Client for an OpenAI-compatible chat-completions endpoint. One request
/// per completion, no retries, no streaming.
pub struct OpenAiGateway {
    http: HttpClient,
    api_key: String,
    model: String,
    url: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [GatewayMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl OpenAiGateway {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Self {
        Self {
            http: HttpClient::new(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

fn classify_status(status: StatusCode) -> GatewayError {
    match status.as_u16() {
        429 => GatewayError::RateLimited,
        402 => GatewayError::CreditsExhausted,
        401 => GatewayError::Unauthorized,
        code => GatewayError::Upstream(code),
    }
}

#[async_trait]
impl ChatGateway for OpenAiGateway {
    async fn complete(&self, messages: &[GatewayMessage]) -> Result<String, GatewayError> {
        let req = CompletionRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let resp = self.http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            // Raw upstream bodies never reach the caller.
            let body = resp.text().await.unwrap_or_default();
            error!("Upstream gateway returned {}: {}", status, body);
            return Err(classify_status(status));
        }

        let completion = resp.json::<CompletionResponse>().await?;
        let content = completion
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or(GatewayError::EmptyCompletion)?;

        info!("Upstream completion of {} chars from model {}", content.len(), self.model);
        Ok(content)
    }
}
