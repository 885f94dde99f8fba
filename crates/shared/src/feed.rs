//! Client for the upstream subscription feed.
//!
//! The feed is the authority on which subscriptions exist and what entry
//! fees they carry. The engine consumes a flat list of records and performs
//! no pagination itself; missing fields are surfaced as `None` and rejected
//! later by generation-time validation, which can then name the offending
//! subscription.

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::UpstreamConfig;

/// Subscription feed errors.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Could not construct the HTTP client.
    #[error("Failed to build feed client: {0}")]
    Build(String),
    /// Transport-level failure talking to the feed.
    #[error("Feed request failed: {0}")]
    Transport(String),
    /// The feed answered with a non-success status.
    #[error("Feed answered with status {0}")]
    Status(u16),
    /// The feed payload could not be decoded.
    #[error("Failed to decode feed payload: {0}")]
    Decode(String),
}

/// One flat record from the subscription feed.
///
/// Only the fields the engine needs; optional ones stay optional so a
/// partially-filled upstream row is still representable.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRecord {
    /// Upstream subscription identifier.
    pub subscription_id: Uuid,
    /// Originating team of the subscription, when known upstream.
    #[serde(default)]
    pub source_group_id: Option<Uuid>,
    /// Fee currency, when declared upstream.
    #[serde(default)]
    pub currency: Option<String>,
    /// Entry-fee amount, when declared upstream.
    #[serde(default)]
    pub entry_fees_amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct FeedPage {
    items: Vec<FeedRecord>,
}

/// Client for the subscription feed collaborator.
#[derive(Debug, Clone)]
pub struct SubscriptionFeedClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl SubscriptionFeedClient {
    /// Creates a new feed client from upstream configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &UpstreamConfig) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FeedError::Build(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.feed_base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    /// Fetches the full flat list of subscription records.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or an
    /// undecodable payload.
    pub async fn fetch_all(&self) -> Result<Vec<FeedRecord>, FeedError> {
        let url = format!("{}/subscriptions/all", self.base_url);

        let mut request = self.http.get(&url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let page: FeedPage = response
            .json()
            .await
            .map_err(|e| FeedError::Decode(e.to_string()))?;

        tracing::debug!(records = page.items.len(), "fetched subscription feed");
        Ok(page.items)
    }
}

impl From<FeedError> for crate::error::AppError {
    fn from(err: FeedError) -> Self {
        Self::ExternalService(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_decodes_full_row() {
        let raw = r#"{
            "subscriptionId": "018f4f2e-0000-7000-8000-000000000001",
            "sourceGroupId": "018f4f2e-0000-7000-8000-0000000000aa",
            "currency": "EUR",
            "entryFeesAmount": "120.50"
        }"#;
        let record: FeedRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(
            record.source_group_id.unwrap().to_string(),
            "018f4f2e-0000-7000-8000-0000000000aa"
        );
        assert_eq!(record.currency.as_deref(), Some("EUR"));
        assert_eq!(record.entry_fees_amount.unwrap().to_string(), "120.50");
    }

    #[test]
    fn test_record_tolerates_missing_fields() {
        let raw = r#"{ "subscriptionId": "018f4f2e-0000-7000-8000-000000000001" }"#;
        let record: FeedRecord = serde_json::from_str(raw).unwrap();
        assert!(record.source_group_id.is_none());
        assert!(record.currency.is_none());
        assert!(record.entry_fees_amount.is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = UpstreamConfig {
            feed_base_url: "http://feed.local/".to_string(),
            ..UpstreamConfig::default()
        };
        let client = SubscriptionFeedClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://feed.local");
    }
}
