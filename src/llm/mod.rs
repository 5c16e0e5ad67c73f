pub mod openai;

use async_trait::async_trait;
use serde::{ Serialize, Deserialize };
use std::sync::Arc;
use thiserror::Error;

use crate::cli::Args;
use self::openai::OpenAiGateway;

/// One turn in the upstream message list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GatewayMessage {
    pub role: String,
    pub content: String,
}

impl GatewayMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// Upstream failure classes. The relay maps these onto its fixed user-safe
/// envelope strings; raw upstream detail stays in the server logs.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("upstream rate limited (429)")]
    RateLimited,
    #[error("upstream credits exhausted (402)")]
    CreditsExhausted,
    #[error("upstream rejected credentials (401)")]
    Unauthorized,
    #[error("upstream returned status {0}")]
    Upstream(u16),
    #[error("request to upstream failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned an empty completion")]
    EmptyCompletion,
}

#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn complete(&self, messages: &[GatewayMessage]) -> Result<String, GatewayError>;
}

/// Builds the configured gateway. `None` means the upstream credential is
/// absent, which the relay reports as its single configuration-fatal path.
pub fn new_gateway(args: &Args) -> Option<Arc<dyn ChatGateway>> {
    let api_key = args.gateway_api_key.clone().filter(|k| !k.trim().is_empty())?;
    Some(Arc::new(OpenAiGateway::new(
        api_key,
        args.gateway_model.clone(),
        args.gateway_base_url.clone(),
    )))
}
