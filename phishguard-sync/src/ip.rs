//! Best-effort public IP lookup for the submitting client.
//!
//! Endpoints are tried in order; the first usable answer wins. A failed
//! lookup never blocks a submission.

use crate::error::{SyncError, SyncResult};
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// IP lookup configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpLookupConfig {
    /// Lookup endpoints, tried in order. Each answers `{"ip": "..."}`.
    pub endpoints: Vec<String>,
    /// Per-request timeout (ms).
    pub timeout_ms: u64,
}

impl Default for IpLookupConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                "https://api.ipify.org?format=json".to_string(),
                "https://api64.ipify.org?format=json".to_string(),
            ],
            timeout_ms: 2_000,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpResponse {
    ip: Option<String>,
}

/// Resolves the client's public IP address.
#[derive(Debug, Clone)]
pub struct IpResolver {
    config: IpLookupConfig,
    client: Client,
}

impl IpResolver {
    pub fn new(config: IpLookupConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &IpLookupConfig {
        &self.config
    }

    /// Returns the first address any endpoint reports, or `None` when all
    /// of them fail.
    pub async fn resolve(&self) -> Option<String> {
        for endpoint in &self.config.endpoints {
            match self.lookup(endpoint).await {
                Ok(Some(ip)) => {
                    debug!("Resolved client IP via {}", endpoint);
                    return Some(ip);
                }
                Ok(None) => warn!("IP lookup via {} returned no address", endpoint),
                Err(e) => warn!("IP lookup via {} failed: {}", endpoint, e),
            }
        }
        warn!("Could not determine client IP; continuing without it");
        None
    }

    async fn lookup(&self, endpoint: &str) -> SyncResult<Option<String>> {
        let response = self
            .client
            .get(endpoint)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .send()
            .await
            .map_err(classify)?;

        if !response.status().is_success() {
            return Err(SyncError::Network(format!(
                "IP lookup returned {}",
                response.status()
            )));
        }

        let body: IpResponse = response.json().await.map_err(classify)?;
        Ok(body.ip.filter(|ip| !ip.trim().is_empty()))
    }
}

fn classify(e: reqwest::Error) -> SyncError {
    if e.is_timeout() {
        SyncError::Timeout
    } else {
        SyncError::Http(e)
    }
}
