// Telemetry source: current node readings and node history over HTTP (reqwest).
// Timeout, connection errors, non-2xx and undecodable bodies are all TelemetryError.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

use crate::models::{HistoryRecord, NodeReading};
use crate::version::USER_AGENT;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },
    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TelemetryError {
    fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TelemetryError::Timeout { url: url.into() }
        } else {
            TelemetryError::Transport {
                url: url.into(),
                source: e,
            }
        }
    }
}

/// Read side of the telemetry service.
pub trait TelemetrySource: Send + Sync + 'static {
    /// One reading per known node (GET /nodeData/).
    fn node_data(&self) -> impl Future<Output = Result<Vec<NodeReading>, TelemetryError>> + Send;

    /// Full history, newest first (GET /nodeHistory/).
    fn node_history(
        &self,
    ) -> impl Future<Output = Result<Vec<HistoryRecord>, TelemetryError>> + Send;
}

pub struct HttpTelemetrySource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTelemetrySource {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TelemetryError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| TelemetryError::from_reqwest(&url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Status { url, status });
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| TelemetryError::from_reqwest(&url, e))?;
        serde_json::from_slice(&body).map_err(|source| TelemetryError::Decode { url, source })
    }
}

impl TelemetrySource for HttpTelemetrySource {
    #[instrument(skip(self), fields(repo = "telemetry", operation = "node_data"))]
    async fn node_data(&self) -> Result<Vec<NodeReading>, TelemetryError> {
        self.get_json("nodeData/").await
    }

    #[instrument(skip(self), fields(repo = "telemetry", operation = "node_history"))]
    async fn node_history(&self) -> Result<Vec<HistoryRecord>, TelemetryError> {
        self.get_json("nodeHistory/").await
    }
}
