//! Snapcraft metadata API registry for the snap channel
//!
//! The API only reports the current head of each channel/architecture pair,
//! so a fetch returns at most one record per combination.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::version::error::FetchError;
use crate::version::fetcher::Fetcher;
use crate::version::model::{SnapVersion, VersionRecord};
use crate::version::registries::{check_status, http_client};

/// Default base URL for the Snapcraft API
pub const DEFAULT_BASE_URL: &str = "https://api.snapcraft.io";

const SNAP_ID: &str = "QkvhpBkFKaDwHMR2LTS3S9Bm0Ek6io11";

pub const CHANNELS: [&str; 4] = ["stable", "candidate", "beta", "edge"];
pub const ARCHITECTURES: [&str; 2] = ["amd64", "arm64"];

#[derive(Debug, Serialize)]
struct MetadataRequest<'a> {
    snaps: [SnapQuery<'a>; 1],
    fields: [&'a str; 5],
}

#[derive(Debug, Serialize)]
struct SnapQuery<'a> {
    snap_id: &'a str,
    channel: &'a str,
    architecture: &'a str,
}

#[derive(Debug, Deserialize)]
struct MetadataResponse {
    #[serde(rename = "_embedded", default)]
    embedded: Option<Embedded>,
}

#[derive(Debug, Deserialize)]
struct Embedded {
    #[serde(rename = "clickindex:package", default)]
    packages: Vec<Package>,
}

#[derive(Debug, Deserialize)]
struct Package {
    version: String,
    #[serde(default)]
    revision: Option<u64>,
}

pub struct SnapcraftFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl SnapcraftFetcher {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_head(
        &self,
        channel: &str,
        arch: &str,
    ) -> Result<Option<SnapVersion>, FetchError> {
        let url = format!("{}/api/v1/snaps/metadata", self.base_url);
        let body = MetadataRequest {
            snaps: [SnapQuery {
                snap_id: SNAP_ID,
                channel,
                architecture: arch,
            }],
            fields: ["version", "revision", "channel", "architecture", "download_url"],
        };

        let response = self
            .client
            .post(&url)
            .header("X-Ubuntu-Series", "16")
            .json(&body)
            .send()
            .await?;
        let response = check_status(response, "metanorma snap")?;
        let metadata: MetadataResponse = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        Ok(metadata
            .embedded
            .and_then(|embedded| embedded.packages.into_iter().next())
            .map(|package| SnapVersion::new(package.version, package.revision, arch, channel)))
    }
}

impl Default for SnapcraftFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Fetcher for SnapcraftFetcher {
    type Record = SnapVersion;

    async fn fetch_all(&self) -> Result<Vec<SnapVersion>, FetchError> {
        let mut versions = Vec::new();
        let mut last_error = None;
        let mut attempts = 0;

        for channel in CHANNELS {
            for arch in ARCHITECTURES {
                attempts += 1;
                match self.fetch_head(channel, arch).await {
                    Ok(Some(head)) => versions.push(head),
                    Ok(None) => debug!("No snap published on {}/{}", channel, arch),
                    Err(e) => {
                        warn!("Failed to fetch snap {}/{}: {}", channel, arch, e);
                        last_error = Some(e);
                    }
                }
            }
        }

        // Only give up when no combination could be queried at all
        if versions.is_empty()
            && let Some(e) = last_error
        {
            warn!("All {} snap metadata requests failed", attempts);
            return Err(e);
        }

        versions.sort_by_key(|v| v.number());
        Ok(versions)
    }
}
