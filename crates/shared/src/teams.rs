//! Client for the teams directory.
//!
//! Resolves group ids to display names for human-readable output. Never
//! consulted for grouping or totals correctness.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::UpstreamConfig;

/// Teams directory errors.
#[derive(Debug, Error)]
pub enum TeamsError {
    /// Could not construct the HTTP client.
    #[error("Failed to build teams client: {0}")]
    Build(String),
    /// Transport-level failure talking to the directory.
    #[error("Teams request failed: {0}")]
    Transport(String),
    /// The directory answered with a non-success status.
    #[error("Teams directory answered with status {0}")]
    Status(u16),
    /// The directory payload could not be decoded.
    #[error("Failed to decode teams payload: {0}")]
    Decode(String),
}

/// One team entry from the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecord {
    /// Team identifier; matches the group ids used in mappings.
    pub id: Uuid,
    /// Display name.
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TeamsPage {
    items: Vec<TeamRecord>,
}

/// Client for the teams directory collaborator.
#[derive(Debug, Clone)]
pub struct TeamsClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl TeamsClient {
    /// Creates a new teams client from upstream configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &UpstreamConfig) -> Result<Self, TeamsError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TeamsError::Build(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.teams_base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    /// Fetches all teams from the directory.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or an
    /// undecodable payload.
    pub async fn fetch_all(&self) -> Result<Vec<TeamRecord>, TeamsError> {
        let url = format!("{}/teams/all", self.base_url);

        let mut request = self.http.get(&url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TeamsError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TeamsError::Status(status.as_u16()));
        }

        let page: TeamsPage = response
            .json()
            .await
            .map_err(|e| TeamsError::Decode(e.to_string()))?;

        Ok(page.items)
    }
}

impl From<TeamsError> for crate::error::AppError {
    fn from(err: TeamsError) -> Self {
        Self::ExternalService(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_record_decodes() {
        let raw = r#"{ "id": "018f4f2e-0000-7000-8000-0000000000bb", "name": "Alpha Desk" }"#;
        let record: TeamRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.name, "Alpha Desk");
    }
}
