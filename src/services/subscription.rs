use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when resolving a subscription tier
#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Source of the per-seeker daily swipe limit.
///
/// The subscription service owns tiers and billing; this engine only asks one
/// question of it. `None` means the seeker has no subscription record and the
/// caller applies the baseline free-tier limit.
#[async_trait]
pub trait SubscriptionLookup: Send + Sync {
    async fn daily_limit(&self, seeker_id: &str) -> Result<Option<i64>, SubscriptionError>;
}

/// HTTP client for the subscription service
pub struct HttpSubscriptionClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl HttpSubscriptionClient {
    pub fn new(base_url: String, api_key: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            client,
        }
    }
}

#[async_trait]
impl SubscriptionLookup for HttpSubscriptionClient {
    async fn daily_limit(&self, seeker_id: &str) -> Result<Option<i64>, SubscriptionError> {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(seeker_id)
        );

        tracing::debug!("Fetching subscription tier from: {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        // No subscription record is a normal outcome, not an error.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(SubscriptionError::ApiError(format!(
                "Failed to fetch subscription: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;

        let limit = json
            .get("dailySwipeLimit")
            .and_then(|l| l.as_i64())
            .ok_or_else(|| {
                SubscriptionError::InvalidResponse("Missing dailySwipeLimit field".into())
            })?;

        Ok(Some(limit))
    }
}

/// Fixed tier table for tests and local runs
#[derive(Debug, Clone, Default)]
pub struct StaticTiers {
    limits: HashMap<String, i64>,
}

impl StaticTiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, seeker_id: &str, limit: i64) -> Self {
        self.limits.insert(seeker_id.to_string(), limit);
        self
    }
}

#[async_trait]
impl SubscriptionLookup for StaticTiers {
    async fn daily_limit(&self, seeker_id: &str) -> Result<Option<i64>, SubscriptionError> {
        Ok(self.limits.get(seeker_id).copied())
    }
}
