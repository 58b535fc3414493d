use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use reqwest::Certificate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ConfigError};
use crate::metrics::RequestTimings;

// ─── Endpoints ───────────────────────────────────────────────────

/// The four stats endpoints polled on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsEndpoint {
    Nodes,
    Cluster,
    Common,
    Indices,
}

impl StatsEndpoint {
    pub const fn path(self) -> &'static str {
        match self {
            Self::Nodes => "/_nodes/stats",
            Self::Cluster => "/_cluster/health",
            Self::Common => "/_stats",
            // bytes=b keeps sizes numeric instead of "1.2kb"
            Self::Indices => "/_cat/indices?format=json&bytes=b",
        }
    }
}

impl fmt::Display for StatsEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

// ─── Client contract ─────────────────────────────────────────────

/// Fetch an endpoint and decode its body into `T`.
#[allow(async_fn_in_trait)]
pub trait StatsClient {
    async fn request<T: DeserializeOwned>(&self, endpoint: StatsEndpoint) -> Result<T, ClientError>;
}

/// Decode a response body, tagging failures with the endpoint they came from.
pub fn decode<T: DeserializeOwned>(endpoint: StatsEndpoint, body: &[u8]) -> Result<T, ClientError> {
    serde_json::from_slice(body).map_err(|source| ClientError::Decode { endpoint, source })
}

// ─── reqwest implementation ──────────────────────────────────────

/// Talks to a live cluster over HTTP(S).
///
/// `reqwest::Client` pools connections internally, so one instance serves
/// every run in interval mode.
pub struct HttpStatsClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
    timings: Arc<RequestTimings>,
}

impl HttpStatsClient {
    pub fn new(config: &ClientConfig, timings: Arc<RequestTimings>) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout);

        if let Some(path) = &config.ca_bundle_file {
            let ca_error = |reason: String| ConfigError::CaBundle {
                path: path.display().to_string(),
                reason,
            };
            let pem = std::fs::read(path).map_err(|e| ca_error(e.to_string()))?;
            let cert = Certificate::from_pem(&pem).map_err(|e| ca_error(e.to_string()))?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url(),
            credentials: config.credentials.clone(),
            timings,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch(&self, endpoint: StatsEndpoint, url: &str) -> Result<Vec<u8>, ClientError> {
        let mut req = self.http.get(url);
        if let Some((user, pass)) = &self.credentials {
            req = req.basic_auth(user, Some(pass));
        }

        let resp = req.send().await.map_err(|e| ClientError::Transport {
            endpoint,
            reason: e.to_string(),
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|e| ClientError::Transport {
            endpoint,
            reason: e.to_string(),
        })?;
        Ok(body.to_vec())
    }
}

impl StatsClient for HttpStatsClient {
    async fn request<T: DeserializeOwned>(&self, endpoint: StatsEndpoint) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        debug!(%url, "requesting stats");

        let t0 = Instant::now();
        let fetched = self.fetch(endpoint, &url).await;
        let elapsed_us = t0.elapsed().as_micros() as u64;

        self.timings.record(endpoint, elapsed_us, fetched.is_ok());
        let body = fetched?;
        debug!(%endpoint, bytes = body.len(), elapsed_us, "stats received");

        decode(endpoint, &body)
    }
}

// ─── Deterministic fixture ───────────────────────────────────────
