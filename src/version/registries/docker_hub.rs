//! Docker Hub tags registry for the gemfile channel

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::version::error::FetchError;
use crate::version::fetcher::Fetcher;
use crate::version::model::{GemfileVersion, VersionRecord};
use crate::version::registries::{check_status, http_client};

/// Default base URL for Docker Hub
pub const DEFAULT_BASE_URL: &str = "https://registry.hub.docker.com";

const REPOSITORY: &str = "metanorma/metanorma";

static RELEASE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("Valid regex"));

#[derive(Debug, Deserialize)]
struct TagPage {
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    results: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
    #[serde(default)]
    tag_last_pushed: Option<DateTime<Utc>>,
}

pub struct DockerHubFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl DockerHubFetcher {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for DockerHubFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Fetcher for DockerHubFetcher {
    type Record = GemfileVersion;

    async fn fetch_all(&self) -> Result<Vec<GemfileVersion>, FetchError> {
        let mut url = format!(
            "{}/v2/repositories/{}/tags?page_size=100",
            self.base_url, REPOSITORY
        );
        let mut versions = Vec::new();

        loop {
            debug!("Fetching Docker Hub tags: {}", url);
            let response = self.client.get(&url).send().await?;
            let response = check_status(response, REPOSITORY)?;
            let page: TagPage = response.json().await.map_err(|e| {
                warn!("Failed to parse Docker Hub tags response: {}", e);
                FetchError::InvalidResponse(e.to_string())
            })?;

            for tag in page.results {
                if !RELEASE_TAG.is_match(&tag.name) {
                    continue;
                }
                let record = GemfileVersion::new(tag.name);
                versions.push(match tag.tag_last_pushed {
                    Some(pushed) => record.with_published_at(pushed),
                    None => record,
                });
            }

            match page.next {
                Some(next) if !next.is_empty() => url = next,
                _ => break,
            }
        }

        versions.sort_by_key(|v| v.number());
        Ok(versions)
    }
}
