//! Client for the Nezha dashboard API

use async_trait::async_trait;
use nezha_common::{ExporterConfig, ExporterError, Result};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Path of the server listing, relative to the dashboard URL
pub const SERVER_DETAILS_PATH: &str = "/api/v1/server/details";

/// Anything that can hand the poller the current list of server records
#[async_trait]
pub trait ServerSource: Send + Sync {
    async fn fetch_servers(&self) -> Result<Vec<Value>>;
}

#[derive(Debug, Deserialize)]
struct ServerDetails {
    #[serde(default)]
    result: Option<Vec<Value>>,
}

/// HTTP client for `GET /api/v1/server/details`
pub struct NezhaClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl NezhaClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExporterError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), SERVER_DETAILS_PATH),
            token: token.to_string(),
        })
    }

    pub fn from_config(config: &ExporterConfig) -> Result<Self> {
        Self::new(&config.nezha_url, &config.nezha_token, config.request_timeout())
    }

    /// Full URL the client polls
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ServerSource for NezhaClient {
    async fn fetch_servers(&self) -> Result<Vec<Value>> {
        let response = self
            .http
            .get(&self.endpoint)
            .header(AUTHORIZATION, self.token.as_str())
            .send()
            .await
            .map_err(|e| ExporterError::Transport(format!("GET {} failed: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExporterError::Transport(format!(
                "GET {} returned HTTP {}",
                self.endpoint, status
            )));
        }

        let details: ServerDetails = response.json().await.map_err(|e| {
            ExporterError::Transport(format!("Malformed body from {}: {}", self.endpoint, e))
        })?;

        let servers = details.result.unwrap_or_default();
        debug!(endpoint = %self.endpoint, servers = servers.len(), "Fetched server details");
        Ok(servers)
    }
}
