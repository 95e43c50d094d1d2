//! GitHub tags registry for the homebrew channel

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::version::error::FetchError;
use crate::version::fetcher::Fetcher;
use crate::version::model::{HomebrewVersion, VersionRecord};
use crate::version::registries::{check_status, http_client};

/// Default base URL for GitHub API
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

const TAP_REPOSITORY: &str = "metanorma/homebrew-metanorma";

static RELEASE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v(\d+\.\d+\.\d+)$").expect("Valid regex"));

/// Response item from the GitHub tags API
#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
    #[serde(default)]
    commit: Option<Commit>,
}

#[derive(Debug, Deserialize)]
struct Commit {
    sha: String,
}

pub struct GitHubTagsFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl GitHubTagsFetcher {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for GitHubTagsFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Fetcher for GitHubTagsFetcher {
    type Record = HomebrewVersion;

    async fn fetch_all(&self) -> Result<Vec<HomebrewVersion>, FetchError> {
        let mut versions = Vec::new();

        for page in 1.. {
            let url = format!(
                "{}/repos/{}/tags?per_page=100&page={}",
                self.base_url, TAP_REPOSITORY, page
            );
            debug!("Fetching GitHub tags: {}", url);

            let response = self
                .client
                .get(&url)
                .header("Accept", "application/vnd.github+json")
                .send()
                .await?;
            let response = check_status(response, TAP_REPOSITORY)?;
            let tags: Vec<Tag> = response.json().await.map_err(|e| {
                warn!("Failed to parse GitHub tags response: {}", e);
                FetchError::InvalidResponse(e.to_string())
            })?;

            if tags.is_empty() {
                break;
            }

            for tag in tags {
                let Some(captures) = RELEASE_TAG.captures(&tag.name) else {
                    continue;
                };
                let mut record =
                    HomebrewVersion::new(&captures[1], tag.commit.map(|commit| commit.sha));
                record.tag_name = Some(tag.name);
                versions.push(record);
            }
        }

        versions.sort_by_key(|v| v.number());
        Ok(versions)
    }
}
