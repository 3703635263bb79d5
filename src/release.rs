/*============================================================
  Synavera Project: Syn-Vigil
  Module: synvigil_core::release
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Query the GitHub releases API for the latest published
    release of the watched repository.

  Security / Safety Notes:
    Performs read-only HTTPS requests to a public API.
    No credentials are transmitted.

  Dependencies:
    reqwest for HTTP, serde for response parsing.

  Operational Scope:
    Supplies release metadata (tag, notes, assets, web link)
    to the update checker. Status handling distinguishes
    throttling and missing repositories; no retries are made —
    the next scheduled check is the retry.

  Revision History:
    2025-06-12 COD  Implemented asynchronous release client.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Structured response parsing with explicit error paths
    - Configurable timeouts
    - Capability trait seam for test doubles
============================================================*/

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use urlencoding::encode;

use crate::config::WatchConfig;
use crate::error::{Result, VigilError};

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = "Syn-Vigil-Core/0.4 (release watch)";

/// Metadata describing the latest published release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseMetadata {
    pub tag_name: String,
    pub html_url: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// A downloadable artefact attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Source of release metadata; the production implementation talks to
/// GitHub, tests substitute a stub.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn latest_release(&self) -> Result<ReleaseMetadata>;
}

/// Client for the GitHub `releases/latest` endpoint.
#[derive(Clone)]
pub struct GitHubReleaseClient {
    client: reqwest::Client,
    endpoint: String,
}

impl GitHubReleaseClient {
    /// Construct a new client for the given repository.
    pub fn new(config: &WatchConfig, owner: &str, repo: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| VigilError::Network(format!("Failed to build HTTP client: {err}")))?;

        let endpoint = format!(
            "{}/repos/{}/{}/releases/latest",
            config.api_base_url.trim_end_matches('/'),
            encode(owner),
            encode(repo)
        );

        Ok(Self { client, endpoint })
    }

    /// The fully composed endpoint URL (diagnostics only).
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReleaseSource for GitHubReleaseClient {
    async fn latest_release(&self) -> Result<ReleaseMetadata> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .send()
            .await
            .map_err(|err| {
                VigilError::Network(format!("Request to {} failed: {err}", self.endpoint))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status {
                StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => VigilError::RateLimited,
                StatusCode::NOT_FOUND => VigilError::ReleaseNotFound,
                other => VigilError::UnexpectedStatus {
                    status: other.as_u16(),
                },
            });
        }

        response.json::<ReleaseMetadata>().await.map_err(|err| {
            VigilError::Serialization(format!("Failed to decode release metadata: {err}"))
        })
    }
}
