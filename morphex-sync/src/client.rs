//! Collector client
//!
//! The collector exposes two JSON endpoints: `POST /merge_faces` builds the
//! stimulus block from the two photos, `POST /save_data` stores a full
//! snapshot and may hand back a participant id.

use std::time::Duration;

use async_trait::async_trait;
use morphex_core::{ExportSnapshot, MorphRequest, MorphResponse, SaveResponse, Stimulus};
use reqwest::RequestBuilder;
use tracing::debug;

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};

const USER_AGENT: &str = concat!("morphex/", env!("CARGO_PKG_VERSION"));
const PROXY_WARNING_HEADER: &str = "ngrok-skip-browser-warning";

/// The remote side of the experiment: morph service plus data collector.
#[async_trait]
pub trait Collector: Send + Sync {
    async fn merge_faces(&self, request: &MorphRequest) -> Result<Vec<Stimulus>>;
    async fn save_data(&self, snapshot: &ExportSnapshot) -> Result<SaveResponse>;
}

/// reqwest-backed collector
pub struct HttpCollector {
    http_client: reqwest::Client,
    base_url: String,
    save_timeout: Duration,
    skip_proxy_warning: bool,
}

impl HttpCollector {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SyncError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.collector_url.trim_end_matches('/').to_string(),
            save_timeout: config.save_timeout(),
            skip_proxy_warning: config.skip_proxy_warning,
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let request = self
            .http_client
            .post(format!("{}/{}", self.base_url, path));
        if self.skip_proxy_warning {
            request.header(PROXY_WARNING_HEADER, "true")
        } else {
            request
        }
    }
}

#[async_trait]
impl Collector for HttpCollector {
    /// No client timeout here: the caller owns the hard deadline and drops
    /// the future to abort the request.
    async fn merge_faces(&self, request: &MorphRequest) -> Result<Vec<Stimulus>> {
        debug!(url = %self.base_url, "requesting stimulus generation");
        let response = self.post("merge_faces").json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status(status.as_u16()));
        }

        let body: MorphResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Malformed(e.to_string()))?;
        Ok(body.images)
    }

    async fn save_data(&self, snapshot: &ExportSnapshot) -> Result<SaveResponse> {
        let response = self
            .post("save_data")
            .timeout(self.save_timeout)
            .json(snapshot)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SyncError::Timeout(self.save_timeout)
                } else {
                    SyncError::from(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(SaveResponse::default());
        }
        serde_json::from_str(&text).map_err(|e| SyncError::Malformed(e.to_string()))
    }
}
