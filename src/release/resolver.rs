//! Release discovery with a pinned-version fallback.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use super::{ArtifactSource, ManualTool, ResolvedArtifact};
use crate::error::Result;

const USER_AGENT: &str = concat!("devstrap/", env!("CARGO_PKG_VERSION"));

/// Why discovery did not produce a URL. Never surfaced to callers.
#[derive(Debug, Error)]
enum DiscoveryError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("rate limited by release API")]
    RateLimited,

    #[error("release API returned {0}")]
    Status(StatusCode),

    #[error("no asset matches this platform")]
    NoMatch,

    #[error("{} assets match this platform: {}", .0.len(), .0.join(", "))]
    Ambiguous(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    tag_name: String,
    #[serde(default)]
    assets: Vec<AssetData>,
}

#[derive(Debug, Deserialize)]
struct AssetData {
    name: String,
    browser_download_url: String,
}

pub struct ReleaseResolver {
    client: Client,
    api_base: String,
    token: Option<String>,
    timeout: Duration,
    arch: String,
}

impl ReleaseResolver {
    pub fn new(
        api_base: &str,
        token: Option<String>,
        timeout: Duration,
        arch: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
            timeout,
            arch: arch.into(),
        })
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Find the download URL for `tool` on this host.
    ///
    /// Only an architecture missing from the tool's map is an error, and it is
    /// reported before any request is made. Every discovery problem falls back
    /// to the pinned URL.
    pub async fn resolve(&self, tool: &ManualTool) -> Result<ResolvedArtifact> {
        let pinned = ResolvedArtifact {
            url: tool.pinned_url(&self.arch)?,
            source: ArtifactSource::Pinned,
            version: tool.pinned_version.clone(),
        };

        let Some(repo) = tool.repo.as_deref() else {
            return Ok(pinned);
        };

        let discovery = tokio::time::timeout(self.timeout, self.discover(tool, repo)).await;
        match discovery {
            Ok(Ok(artifact)) => {
                tracing::debug!(
                    "Discovered {} {} at {}",
                    tool.name,
                    artifact.version,
                    artifact.url
                );
                Ok(artifact)
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    "Release discovery for {} failed ({}), using pinned {}",
                    tool.name,
                    e,
                    tool.pinned_version
                );
                Ok(pinned)
            }
            Err(_) => {
                let e = DiscoveryError::Timeout(self.timeout);
                tracing::warn!(
                    "Release discovery for {} failed ({}), using pinned {}",
                    tool.name,
                    e,
                    tool.pinned_version
                );
                Ok(pinned)
            }
        }
    }

    async fn discover(
        &self,
        tool: &ManualTool,
        repo: &str,
    ) -> std::result::Result<ResolvedArtifact, DiscoveryError> {
        let url = format!("{}/repos/{}/releases/latest", self.api_base, repo);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS
            || (status == StatusCode::FORBIDDEN
                && response
                    .headers()
                    .get("x-ratelimit-remaining")
                    .is_some_and(|v| v.as_bytes() == b"0"))
        {
            return Err(DiscoveryError::RateLimited);
        }
        if !status.is_success() {
            return Err(DiscoveryError::Status(status));
        }

        let release: ReleaseResponse = response.json().await?;

        let mut matches = Vec::new();
        for asset in release.assets {
            // An invalid pattern counts as no match rather than aborting discovery.
            if tool.matches_asset(&asset.name, &self.arch).unwrap_or(false) {
                matches.push(asset);
            }
        }

        match matches.len() {
            0 => Err(DiscoveryError::NoMatch),
            1 => {
                let asset = matches.remove(0);
                Ok(ResolvedArtifact {
                    url: asset.browser_download_url,
                    source: ArtifactSource::Discovered,
                    version: release.tag_name.trim_start_matches('v').to_string(),
                })
            }
            _ => Err(DiscoveryError::Ambiguous(
                matches.into_iter().map(|a| a.name).collect(),
            )),
        }
    }
}
