//! GitHub Releases API registry for the binary channel

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::version::error::FetchError;
use crate::version::fetcher::Fetcher;
use crate::version::model::{BinaryVersion, ReleaseAsset, VersionRecord};
use crate::version::registries::{check_status, http_client};

/// Default base URL for GitHub API
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Repository publishing the packed single-binary builds
pub const RELEASE_REPOSITORY: &str = "metanorma/packed-mn";

static RELEASE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v(\d+\.\d+\.\d+)$").expect("Valid regex"));

/// Response from GitHub Releases API
#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    assets: Vec<ReleaseAsset>,
}

impl Release {
    fn into_record(self) -> Option<BinaryVersion> {
        let version = RELEASE_TAG.captures(&self.tag_name)?[1].to_string();

        let mut metadata = BTreeMap::new();
        metadata.insert("tag_name".to_string(), Value::String(self.tag_name));
        if let Some(url) = self.html_url {
            metadata.insert("html_url".to_string(), Value::String(url));
        }
        metadata.insert("assets".to_string(), json!(self.assets));

        let record = BinaryVersion::new(version, metadata);
        Some(match self.published_at {
            Some(published_at) => record.with_published_at(published_at),
            None => record,
        })
    }
}

pub struct GitHubReleasesFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl GitHubReleasesFetcher {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for GitHubReleasesFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Fetcher for GitHubReleasesFetcher {
    type Record = BinaryVersion;

    async fn fetch_all(&self) -> Result<Vec<BinaryVersion>, FetchError> {
        let mut versions = Vec::new();

        for page in 1.. {
            let url = format!(
                "{}/repos/{}/releases?per_page=100&page={}",
                self.base_url, RELEASE_REPOSITORY, page
            );
            debug!("Fetching GitHub releases: {}", url);

            let response = self
                .client
                .get(&url)
                .header("Accept", "application/vnd.github+json")
                .send()
                .await?;
            let response = check_status(response, RELEASE_REPOSITORY)?;
            let releases: Vec<Release> = response.json().await.map_err(|e| {
                warn!("Failed to parse GitHub releases response: {}", e);
                FetchError::InvalidResponse(e.to_string())
            })?;

            if releases.is_empty() {
                break;
            }
            versions.extend(releases.into_iter().filter_map(Release::into_record));
        }

        versions.sort_by_key(|v| v.number());
        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn fetch_all_records_release_metadata() {
        let mut server = Server::new_async().await;
        let page1 = server
            .mock("GET", "/repos/metanorma/packed-mn/releases")
            .match_query(Matcher::Exact("per_page=100&page=1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {
                        "tag_name": "v1.14.4",
                        "html_url": "https://github.com/metanorma/packed-mn/releases/tag/v1.14.4",
                        "published_at": "2025-01-10T09:00:00Z",
                        "assets": [
                            {"name": "metanorma-linux", "browser_download_url": "https://example.com/linux"},
                            {"name": "metanorma-macos", "browser_download_url": "https://example.com/macos"}
                        ]
                    },
                    {"tag_name": "nightly", "assets": []},
                    {"tag_name": "v1.13.0", "assets": []}
                ]"#,
            )
            .create_async()
            .await;
        let _page2 = server
            .mock("GET", "/repos/metanorma/packed-mn/releases")
            .match_query(Matcher::Exact("per_page=100&page=2".into()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let fetcher = GitHubReleasesFetcher::new(&server.url());
        let result = fetcher.fetch_all().await.unwrap();

        page1.assert_async().await;
        assert_eq!(result.len(), 2);
        let latest = &result[1];
        assert_eq!(latest.version(), "1.14.4");
        assert_eq!(latest.tag_name(), Some("v1.14.4"));
        assert!(latest.has_asset_for(Platform::Linux));
        assert!(!latest.has_asset_for(Platform::Windows));
        assert!(latest.published_at().is_some());
    }

    #[tokio::test]
    async fn fetch_all_skips_prerelease_and_suffixed_tags() {
        let mut server = Server::new_async().await;
        let _page1 = server
            .mock("GET", "/repos/metanorma/packed-mn/releases")
            .match_query(Matcher::Exact("per_page=100&page=1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"tag_name": "v1.2.3-rc1", "assets": []},
                    {"tag_name": "v1.2.3.4", "assets": []},
                    {"tag_name": "v1.2.3", "assets": []}
                ]"#,
            )
            .create_async()
            .await;
        let _page2 = server
            .mock("GET", "/repos/metanorma/packed-mn/releases")
            .match_query(Matcher::Exact("per_page=100&page=2".into()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let fetcher = GitHubReleasesFetcher::new(&server.url());
        let result = fetcher.fetch_all().await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].version(), "1.2.3");
        assert_eq!(result[0].tag_name(), Some("v1.2.3"));
    }

    #[tokio::test]
    async fn fetch_all_returns_not_found_for_nonexistent_repo() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/metanorma/packed-mn/releases")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;

        let fetcher = GitHubReleasesFetcher::new(&server.url());
        let result = fetcher.fetch_all().await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::NotFound(_))));
    }
}
