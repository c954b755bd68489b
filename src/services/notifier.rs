use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::models::NotificationEvent;

/// Errors that can occur when forwarding notification events
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),
}

/// Downstream sink for match and quota events.
///
/// Delivery mechanics (push, toast, polling feeds) live behind this trait;
/// the engine emits and moves on. Emission is always best-effort for the
/// caller: a lost event never fails the swipe that produced it.
#[async_trait]
pub trait NotificationEmitter: Send + Sync {
    async fn emit(&self, event: &NotificationEvent) -> Result<(), EmitError>;
}

/// HTTP client posting events to the notification service
pub struct WebhookNotifier {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(endpoint: String, api_key: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint,
            api_key,
            client,
        }
    }
}

#[async_trait]
impl NotificationEmitter for WebhookNotifier {
    async fn emit(&self, event: &NotificationEvent) -> Result<(), EmitError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Api-Key", &self.api_key)
            .json(event)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EmitError::ApiError(format!(
                "Failed to deliver event: {}",
                response.status()
            )));
        }

        tracing::debug!("Delivered notification event: {:?}", event);

        Ok(())
    }
}

/// Log-only emitter for tests and local runs
#[derive(Debug, Clone, Default)]
pub struct LogEmitter;

#[async_trait]
impl NotificationEmitter for LogEmitter {
    async fn emit(&self, event: &NotificationEvent) -> Result<(), EmitError> {
        tracing::info!("Notification event: {:?}", event);
        Ok(())
    }
}
