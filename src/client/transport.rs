use async_trait::async_trait;
use reqwest::Client as HttpClient;
use thiserror::Error;

use crate::models::wire::{ChatRequest, Envelope, HistoryEntry};

/// Failures that never came back as a relay envelope: the request did not
/// complete, or the body was not a valid envelope.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("relay returned an unreadable body: {0}")]
    MalformedEnvelope(#[from] serde_json::Error),
}

#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn relay(
        &self,
        message: &str,
        history: &[HistoryEntry],
    ) -> Result<Envelope, TransportError>;
}

/// Talks to the deployed relay endpoint over HTTP.
pub struct HttpRelay {
    http: HttpClient,
    url: String,
}

impl HttpRelay {
    pub fn new(url: impl Into<String>) -> Self {
        Self { http: HttpClient::new(), url: url.into() }
    }
}

#[async_trait]
impl RelayTransport for HttpRelay {
    async fn relay(
        &self,
        message: &str,
        history: &[HistoryEntry],
    ) -> Result<Envelope, TransportError> {
        let request = ChatRequest {
            message: message.to_string(),
            conversation_history: history.to_vec(),
        };

        // The relay answers 200 (or 400 for the unconfigured case) with an
        // envelope either way, so the body is parsed without branching on
        // the status code.
        let body = self.http
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .text()
            .await?;

        Ok(serde_json::from_str(&body)?)
    }
}
