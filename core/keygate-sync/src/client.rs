//! HTTP client for the remote mirror service.
//!
//! Each upload replaces one owner's full subset on the mirror; there are
//! no deltas. Every call runs under a bounded deadline and a deadline
//! overrun counts as failure of that one call.

use crate::error::{SyncError, SyncResult};
use crate::partition::OwnerSubsets;
use keygate_types::{LicenseMap, OwnerId};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the mirror client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Base URL of the mirror service.
    pub base_url: String,
    /// Shared secret expected by the mirror's privileged endpoints.
    pub upload_secret: String,
    /// Per-upload deadline in seconds.
    pub timeout_secs: u64,
    /// Deadline for the health probe in seconds.
    pub health_timeout_secs: u64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            upload_secret: String::new(),
            timeout_secs: 30,
            health_timeout_secs: 10,
        }
    }
}

/// Acknowledgement body returned by the mirror for a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadAck {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    pub count: usize,
}

/// Body of the mirror's health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub timestamp: String,
}

/// Outcome counts for a full mirror push.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushSummary {
    /// Owners whose subset was replaced on the mirror.
    pub pushed: usize,
    /// Owners whose push failed; their mirror copy is stale until the
    /// next mutation triggers another push.
    pub failed: usize,
}

impl PushSummary {
    /// Returns true if every owner's push succeeded.
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.failed == 0
    }
}

/// Client for pushing owner subsets to the remote mirror.
#[derive(Debug, Clone)]
pub struct MirrorClient {
    config: MirrorConfig,
    http: Client,
}

impl MirrorClient {
    /// Creates a client over the given configuration.
    pub fn new(config: MirrorConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to create HTTP client");
        Self { config, http }
    }

    /// Returns the configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Pushes one owner's full subset to the mirror, replacing the remote
    /// copy.
    pub async fn upload_subset(
        &self,
        owner: &OwnerId,
        subset: &LicenseMap,
    ) -> SyncResult<UploadAck> {
        let url = self.url(&format!("/upload/{owner}"));
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.upload_secret)
            .json(subset)
            .send()
            .await
            .map_err(|err| SyncError::RemoteUnavailable(err.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let ack: UploadAck = response
                    .json()
                    .await
                    .map_err(|err| SyncError::RemoteUnavailable(err.to_string()))?;
                debug!(owner = %owner, count = ack.count, "subset uploaded");
                Ok(ack)
            }
            StatusCode::UNAUTHORIZED => Err(SyncError::Unauthorized),
            status => Err(SyncError::Rejected {
                status: status.as_u16(),
            }),
        }
    }

    /// Probes the mirror's health endpoint.
    ///
    /// Diagnostic only: callers use this for startup signaling and must
    /// never gate local operations on the result.
    pub async fn health_check(&self) -> SyncResult<HealthReport> {
        let response = self
            .http
            .get(self.url("/health"))
            .timeout(Duration::from_secs(self.config.health_timeout_secs))
            .send()
            .await
            .map_err(|err| SyncError::RemoteUnavailable(err.to_string()))?;

        if response.status() == StatusCode::OK {
            response
                .json()
                .await
                .map_err(|err| SyncError::RemoteUnavailable(err.to_string()))
        } else {
            Err(SyncError::Rejected {
                status: response.status().as_u16(),
            })
        }
    }

    /// Pushes every owner subset, continuing past individual failures.
    pub async fn push_all(&self, subsets: &OwnerSubsets) -> PushSummary {
        let mut summary = PushSummary::default();
        for (owner, subset) in subsets {
            match self.upload_subset(owner, subset).await {
                Ok(_) => summary.pushed += 1,
                Err(err) => {
                    warn!(owner = %owner, "mirror push failed: {err}");
                    summary.failed += 1;
                }
            }
        }
        summary
    }
}
